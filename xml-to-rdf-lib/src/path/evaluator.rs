use std::collections::HashMap;

use sxd_xpath::nodeset::Node;
use sxd_xpath::{Context, Factory, Value, XPath};

use crate::ProcessorError;

/// Result of evaluating a path expression.
#[derive(Debug, Clone)]
pub enum PathValue<'d> {
    /// Matching nodes in document order.
    Nodes(Vec<Node<'d>>),
    Text(String),
    Number(f64),
    Boolean(bool),
}

impl PathValue<'_> {
    /// Truthiness used by `<if>`: a non-empty node-set, `true`, a non-blank
    /// string, or a number other than zero and NaN.
    pub fn is_truthy(&self) -> bool {
        match self {
            PathValue::Nodes(nodes) => !nodes.is_empty(),
            PathValue::Text(text) => !text.trim().is_empty(),
            PathValue::Number(number) => *number != 0.0 && !number.is_nan(),
            PathValue::Boolean(value) => *value,
        }
    }
}

/// XPath 1.0 evaluation with the namespace bindings of one document run.
/// Compiled expressions are cached by source text.
pub struct PathEvaluator<'d> {
    factory: Factory,
    context: Context<'d>,
    cache: HashMap<String, XPath>,
}

impl<'d> PathEvaluator<'d> {
    pub fn new<'n, I>(namespaces: I) -> Self
    where
        I: IntoIterator<Item = (&'n str, &'n str)>,
    {
        let mut context = Context::new();
        for (prefix, uri) in namespaces {
            context.set_namespace(prefix, uri);
        }
        Self {
            factory: Factory::new(),
            context,
            cache: HashMap::new(),
        }
    }

    pub fn evaluate(&mut self, expr: &str, node: Node<'d>) -> Result<PathValue<'d>, ProcessorError> {
        if !self.cache.contains_key(expr) {
            let compiled = self
                .factory
                .build(expr)
                .map_err(|e| {
                    ProcessorError::PathEvaluation(format!("cannot compile '{}': {:?}", expr, e))
                })?
                .ok_or_else(|| {
                    ProcessorError::PathEvaluation(format!("'{}' is not a path expression", expr))
                })?;
            self.cache.insert(expr.to_string(), compiled);
        }
        let compiled = self
            .cache
            .get(expr)
            .ok_or_else(|| ProcessorError::PathEvaluation(format!("'{}' was not compiled", expr)))?;

        let value = compiled.evaluate(&self.context, node).map_err(|e| {
            ProcessorError::PathEvaluation(format!("cannot evaluate '{}': {:?}", expr, e))
        })?;

        Ok(match value {
            Value::Nodeset(nodes) => PathValue::Nodes(nodes.document_order()),
            Value::String(text) => PathValue::Text(text),
            Value::Number(number) => PathValue::Number(number),
            Value::Boolean(value) => PathValue::Boolean(value),
        })
    }

    /// Evaluate an expression that must select nodes.
    pub fn select(&mut self, expr: &str, node: Node<'d>) -> Result<Vec<Node<'d>>, ProcessorError> {
        match self.evaluate(expr, node)? {
            PathValue::Nodes(nodes) => Ok(nodes),
            other => Err(ProcessorError::PathEvaluation(format!(
                "'{}' does not select nodes (got {:?})",
                expr, other
            ))),
        }
    }
}
