use sxd_xpath::nodeset::Node;

use super::Interpreter;
use crate::config::MappingNode;
use crate::error::ProcessorError;
use crate::output::GraphSink;
use crate::path::{resolve_internal_calls, InternalResolver, PathValue, Segment, Template};
use crate::transform::Transform;
use crate::utils::render_number;

impl<'a, 'd, S: GraphSink> Interpreter<'a, 'd, S> {
    /// Resolve the template held by `attribute` on `node` into its values.
    ///
    /// A value with no placeholders is returned as is. A single `{path}`
    /// spanning the whole value yields one value per matching node. Anything
    /// else is assembled into one string, where each placeholder must match
    /// at most one node (and at least one, when there are several).
    ///
    /// `prefix` is prepended to every value; blank values are dropped. `min`
    /// and `max` bound the number of values, `max == 0` meaning unbounded.
    pub(super) fn values(
        &mut self,
        attribute: &str,
        node: &'a MappingNode,
        data: Node<'d>,
        transform: Option<&Transform>,
        min: usize,
        max: usize,
    ) -> Result<Vec<String>, ProcessorError> {
        let raw = match node.attribute(attribute) {
            Some(raw) => raw,
            None if min > 0 => {
                return Err(ProcessorError::MissingAttribute {
                    attribute: attribute.to_string(),
                    fragment: self.config.fragment(node).to_string(),
                })
            }
            None => return Ok(Vec::new()),
        };
        let prefix = node.attribute("prefix").unwrap_or("");
        let template = Template::parse(raw);

        let mut results = Vec::new();
        if template.placeholder_count() == 0 {
            push_value(&mut results, prefix, apply(transform, raw));
        } else if let Some(segment) = template.sole_placeholder() {
            self.fan_out(segment, data, transform, prefix, &mut results)?;
        } else {
            let (combined, matched) = self.assemble(&template, attribute, raw, data)?;
            let value = apply(transform, &combined);
            if matched {
                push_value(&mut results, prefix, value);
            }
        }

        if results.len() < min {
            return Err(ProcessorError::TooFewValues {
                attribute: attribute.to_string(),
                template: raw.to_string(),
                min,
                found: results.len(),
            });
        }
        if max > 0 && results.len() > max {
            return Err(ProcessorError::TooManyValues {
                attribute: attribute.to_string(),
                template: raw.to_string(),
                max,
                found: results.len(),
            });
        }
        Ok(results)
    }

    fn fan_out(
        &mut self,
        segment: &Segment,
        data: Node<'d>,
        transform: Option<&Transform>,
        prefix: &str,
        results: &mut Vec<String>,
    ) -> Result<(), ProcessorError> {
        let expr = match segment {
            Segment::Path(expr) => expr,
            Segment::Internal(call) => {
                let value = self.registries.resolve(call)?;
                push_value(results, prefix, apply(transform, &value));
                return Ok(());
            }
            Segment::Literal(text) => {
                push_value(results, prefix, apply(transform, text));
                return Ok(());
            }
        };
        let expr = resolve_internal_calls(expr, &self.registries)?;
        match self.paths.evaluate(&expr, data)? {
            PathValue::Nodes(nodes) => {
                for matched in nodes {
                    let text = matched.string_value();
                    if text.is_empty() {
                        continue;
                    }
                    push_value(results, prefix, apply(transform, &text));
                }
            }
            PathValue::Text(text) => push_value(results, prefix, apply(transform, &text)),
            PathValue::Number(number) => {
                push_value(results, prefix, apply(transform, &render_number(number)))
            }
            PathValue::Boolean(value) => {
                push_value(results, prefix, apply(transform, &value.to_string()))
            }
        }
        Ok(())
    }

    /// Substitute every placeholder of `template` in place. The flag tells
    /// whether any placeholder produced non-blank text.
    fn assemble(
        &mut self,
        template: &Template,
        attribute: &str,
        raw: &str,
        data: Node<'d>,
    ) -> Result<(String, bool), ProcessorError> {
        let placeholders = template.placeholder_count();
        let mut combined = String::new();
        let mut matched = false;

        // Internal calls first so a failing lookup is reported before any
        // path is evaluated.
        let mut internal = Vec::new();
        for segment in template.segments() {
            if let Segment::Internal(call) = segment {
                internal.push(self.registries.resolve(call)?);
            }
        }
        let mut internal = internal.into_iter();

        for segment in template.segments() {
            match segment {
                Segment::Literal(text) => combined.push_str(text),
                Segment::Internal(_) => {
                    let value = internal.next().unwrap_or_default();
                    matched = true;
                    combined.push_str(&value);
                }
                Segment::Path(expr) => {
                    let expr = resolve_internal_calls(expr, &self.registries)?;
                    let text = match self.paths.evaluate(&expr, data)? {
                        PathValue::Nodes(nodes) => match nodes.as_slice() {
                            [] if placeholders == 1 => String::new(),
                            [] => {
                                return Err(ProcessorError::NoMatch {
                                    placeholder: format!("{{{}}}", expr),
                                    attribute: attribute.to_string(),
                                    template: raw.to_string(),
                                })
                            }
                            [only] => only.string_value(),
                            [first, ..] if placeholders == 1 => first.string_value(),
                            _ => {
                                return Err(ProcessorError::MultipleMatches {
                                    placeholder: format!("{{{}}}", expr),
                                    attribute: attribute.to_string(),
                                    template: raw.to_string(),
                                })
                            }
                        },
                        PathValue::Text(text) => text,
                        PathValue::Number(number) => render_number(number),
                        PathValue::Boolean(value) => value.to_string(),
                    };
                    if !text.trim().is_empty() {
                        matched = true;
                    }
                    combined.push_str(&text);
                }
            }
        }
        Ok((combined, matched))
    }
}

fn apply(transform: Option<&Transform>, value: &str) -> String {
    match transform {
        Some(transform) => transform(value),
        None => value.to_string(),
    }
}

fn push_value(results: &mut Vec<String>, prefix: &str, value: String) {
    if !value.trim().is_empty() {
        results.push(format!("{}{}", prefix, value));
    }
}
