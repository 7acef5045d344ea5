//! Tree-walking evaluator for mapping configurations.
//!
//! Each element of the `<config>` tree is dispatched on its [`Tag`] to a
//! handler. Handlers receive the current data node and resource context;
//! failures inside one handler are reported and traversal moves on to the
//! next sibling, unless the error is fatal.

mod handlers;
mod values;

use sxd_xpath::nodeset::Node;

use crate::config::{MappingConfig, MappingNode, Tag};
use crate::error::{ProcessingState, ProcessorError};
use crate::output::GraphSink;
use crate::path::{InternalCall, InternalResolver, PathEvaluator};
use crate::transform::{Transform, TransformRegistry};
use crate::types::{CounterRegistry, ResourceContext, UniqueIdentifierRegistry};

const MAX_NESTING: usize = 64;

/// Counters and unique identifiers of one document run.
#[derive(Debug, Default)]
pub(crate) struct Registries {
    pub counters: CounterRegistry,
    pub identifiers: UniqueIdentifierRegistry,
}

impl InternalResolver for Registries {
    fn resolve(&self, call: &InternalCall) -> Result<String, ProcessorError> {
        match call {
            InternalCall::Counter(name) => self.counters.value(name).map(|v| v.to_string()),
            InternalCall::UniqueIdentifier(name) => {
                self.identifiers.value(name).map(str::to_string)
            }
        }
    }
}

/// How the `<if>` immediately before the current sibling turned out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IfBranch {
    Taken,
    NotTaken,
    Failed,
}

pub struct Interpreter<'a, 'd, S: GraphSink> {
    config: &'a MappingConfig,
    transforms: &'a TransformRegistry,
    sink: &'a mut S,
    paths: PathEvaluator<'d>,
    registries: Registries,
    state: ProcessingState,
    depth: usize,
}

impl<'a, 'd, S: GraphSink> Interpreter<'a, 'd, S> {
    pub fn new(
        config: &'a MappingConfig,
        transforms: &'a TransformRegistry,
        sink: &'a mut S,
        paths: PathEvaluator<'d>,
    ) -> Self {
        Self {
            config,
            transforms,
            sink,
            paths,
            registries: Registries::default(),
            state: ProcessingState::new(),
            depth: 0,
        }
    }

    /// Execute the whole configuration against `data` (normally the document
    /// root). Returns the recovered diagnostics, or the fatal error that
    /// stopped the run.
    pub fn run(mut self, data: Node<'d>) -> Result<ProcessingState, ProcessorError> {
        let config = self.config;
        let mut context = ResourceContext::root();
        self.exec_children(config.root(), &mut context, data)?;
        tracing::debug!(
            "Mapping finished with {} error(s), {} warning(s)",
            self.state.get_errors().len(),
            self.state.get_warnings().len()
        );
        Ok(self.state)
    }

    fn exec_children(
        &mut self,
        parent: &'a MappingNode,
        context: &mut ResourceContext,
        data: Node<'d>,
    ) -> Result<(), ProcessorError> {
        if self.depth >= MAX_NESTING {
            return Err(ProcessorError::Processing(format!(
                "mapping nesting exceeds {} levels at <{}>; check for a named mapping that uses itself",
                MAX_NESTING,
                parent.name()
            )));
        }
        self.depth += 1;
        let result = self.exec_each(parent, context, data);
        self.depth -= 1;
        result
    }

    fn exec_each(
        &mut self,
        parent: &'a MappingNode,
        context: &mut ResourceContext,
        data: Node<'d>,
    ) -> Result<(), ProcessorError> {
        let mut preceding_if = None;
        for child in parent.children() {
            let previous = preceding_if.take();
            let result = match child.tag() {
                Tag::If => {
                    let outcome = self.do_if(child, context, data);
                    preceding_if = Some(match outcome {
                        Ok(true) => IfBranch::Taken,
                        Ok(false) => IfBranch::NotTaken,
                        Err(_) => IfBranch::Failed,
                    });
                    outcome.map(|_| ())
                }
                Tag::Else => self.do_else(child, context, data, previous),
                Tag::Identifier if context.has_identifier => {
                    tracing::debug!("Resource already identified; skipping <{}>", child.name());
                    Ok(())
                }
                Tag::Identifier => self.do_identifier(child, context, data),
                Tag::Resource => self.do_resource(child, data),
                Tag::Mapping => self.do_mapping(child, context, data),
                Tag::Triple => self.do_triple(child, context, data),
                Tag::Type => self.do_type(child, context, data),
                Tag::Bnode => self.do_bnode(child, context, data),
                Tag::Switch => self.do_switch(child, context, data),
                Tag::Counter => self.do_counter(child),
                Tag::UniqueIdentifier => self.do_unique_identifier(child),
                Tag::Error => self.do_error(child),
                Tag::UseNamedMapping => self.do_use_named_mapping(child, context, data),
                Tag::Case | Tag::Default => Err(ProcessorError::UnrecognizedTag {
                    tag: child.name().to_string(),
                    fragment: self.config.fragment(child).to_string(),
                }),
                // consumed at load time
                Tag::Partition | Tag::Namespaces | Tag::Split | Tag::NamedMapping => Ok(()),
            };
            if let Err(error) = result {
                self.recover(child, error)?;
            }
        }
        Ok(())
    }

    /// Report a handler failure and carry on, unless it must abort the run.
    fn recover(&mut self, node: &MappingNode, error: ProcessorError) -> Result<(), ProcessorError> {
        if error.is_fatal() {
            return Err(error);
        }
        let fragment = self.config.fragment(node);
        tracing::error!("Error in <{}> tag: {} in: {}", node.name(), error, fragment);
        self.state.add_error(
            format!("Error in <{}> tag: {}", node.tag().as_str(), error),
            Some(fragment.to_string()),
        );
        Ok(())
    }

    /// The transform named by the node's `modifier` attribute, if any.
    fn modifier(&self, node: &MappingNode) -> Result<Option<Transform>, ProcessorError> {
        node.attribute("modifier")
            .map(|name| self.transforms.resolve(name))
            .transpose()
    }
}
