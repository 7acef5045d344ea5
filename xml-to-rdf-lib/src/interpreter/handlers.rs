use sxd_xpath::nodeset::Node;

use super::{IfBranch, Interpreter};
use crate::config::{MappingNode, Tag};
use crate::error::ProcessorError;
use crate::output::{GraphSink, LiteralKind};
use crate::path::prepare_match;
use crate::types::{CounterIteration, QualifiedName, ResourceContext, ShortUri};
use crate::utils::{parse_bool, parse_integer, sanitize_literal, sanitize_uri};

impl<'a, 'd, S: GraphSink> Interpreter<'a, 'd, S> {
    pub(super) fn do_resource(
        &mut self,
        node: &'a MappingNode,
        data: Node<'d>,
    ) -> Result<(), ProcessorError> {
        let identifiers: Vec<&MappingNode> = node.children_with_tag(Tag::Identifier).collect();
        let mut context = match identifiers.as_slice() {
            [identifier] => {
                let id = self.identifier_value(identifier, data)?;
                tracing::debug!("New resource {}", id);
                let subject = self.sink.add_resource_with_identifier(&id)?;
                ResourceContext::for_subject(subject, true)
            }
            _ => ResourceContext::for_subject(self.sink.add_resource(), false),
        };
        self.exec_children(node, &mut context, data)
    }

    pub(super) fn do_mapping(
        &mut self,
        node: &'a MappingNode,
        context: &mut ResourceContext,
        data: Node<'d>,
    ) -> Result<(), ProcessorError> {
        let raw = node.require_attribute("match", self.config)?;
        let expr = prepare_match(raw, &self.registries)?;
        let matches = self.paths.select(&expr, data)?;
        tracing::debug!("<{}> '{}' matched {} node(s)", node.name(), expr, matches.len());

        for matched in matches {
            self.exec_children(node, context, matched)?;
            if node.has_attribute("namedgraph") {
                if let Err(error) = self.assign_named_graph(node, matched) {
                    self.recover(node, error)?;
                }
            }
        }
        Ok(())
    }

    fn assign_named_graph(&mut self, node: &'a MappingNode, data: Node<'d>) -> Result<(), ProcessorError> {
        let graphs = self.values("namedgraph", node, data, None, 1, 1)?;
        if let Some(graph) = graphs.first() {
            self.sink.assign_current_nodes_to_named_graph(&sanitize_uri(graph))?;
        }
        Ok(())
    }

    pub(super) fn do_triple(
        &mut self,
        node: &'a MappingNode,
        context: &ResourceContext,
        data: Node<'d>,
    ) -> Result<(), ProcessorError> {
        let predicate = QualifiedName::parse(node.require_attribute("predicate", self.config)?)?;
        let subject = context.require_subject(node.name())?;
        let transform = self.modifier(node)?;

        if node.has_attribute("object") {
            for object in self.values("object", node, data, transform.as_ref(), 0, 0)? {
                let object = sanitize_uri(&object);
                if object.trim().is_empty() {
                    continue;
                }
                let object = self.config.namespaces().shorten(&object);
                self.sink.add_predicate_and_object(subject, &predicate, &object)?;
            }
            return Ok(());
        }

        node.require_attribute("value", self.config)?;
        let kind = match (node.attribute("type"), node.attribute("language")) {
            (Some(datatype), _) => LiteralKind::Typed(datatype),
            (None, Some(language)) => LiteralKind::Language(language),
            (None, None) => LiteralKind::Plain,
        };
        for literal in self.values("value", node, data, transform.as_ref(), 0, 0)? {
            let text = sanitize_literal(literal.trim());
            if text.is_empty() {
                continue;
            }
            self.sink.add_predicate_and_literal(subject, &predicate, &text, kind)?;
        }
        Ok(())
    }

    pub(super) fn do_type(
        &mut self,
        node: &'a MappingNode,
        context: &ResourceContext,
        data: Node<'d>,
    ) -> Result<(), ProcessorError> {
        let subject = context.require_subject(node.name())?;
        let rdf_type = QualifiedName {
            prefix: "rdf".to_string(),
            local: "type".to_string(),
        };
        for value in self.values("value", node, data, None, 1, 0)? {
            let class = self.config.namespaces().shorten(value.trim());
            self.sink.add_predicate_and_object(subject, &rdf_type, &class)?;
        }
        Ok(())
    }

    /// `<bnode predicate=".." type="..">` hangs a typed blank node off the
    /// current subject and makes it the subject of the children.
    pub(super) fn do_bnode(
        &mut self,
        node: &'a MappingNode,
        context: &ResourceContext,
        data: Node<'d>,
    ) -> Result<(), ProcessorError> {
        let predicate = QualifiedName::parse(node.require_attribute("predicate", self.config)?)?;
        let type_name = QualifiedName::parse(node.require_attribute("type", self.config)?)?;
        let subject = context.require_subject(node.name())?;

        let blank = self.sink.add_blank_node(&type_name)?;
        self.sink.add_predicate_and_node(subject, &predicate, blank)?;
        let mut inner = ResourceContext::for_subject(blank, false);
        self.exec_children(node, &mut inner, data)
    }

    pub(super) fn do_identifier(
        &mut self,
        node: &'a MappingNode,
        context: &mut ResourceContext,
        data: Node<'d>,
    ) -> Result<(), ProcessorError> {
        let subject = context.require_subject(node.name())?;
        let id = self.identifier_value(node, data)?;
        self.sink.add_identifier_for_resource(subject, &id)?;
        context.has_identifier = true;
        Ok(())
    }

    fn identifier_value(&mut self, node: &'a MappingNode, data: Node<'d>) -> Result<ShortUri, ProcessorError> {
        let transform = self.modifier(node)?;
        let values = self.values("value", node, data, transform.as_ref(), 1, 1)?;
        let raw = values.into_iter().next().unwrap_or_default();
        let id = sanitize_uri(&raw);
        if id.is_empty() {
            return Err(ProcessorError::InvalidIri(raw));
        }
        Ok(self.config.namespaces().shorten(&id))
    }

    /// Returns whether the condition held.
    pub(super) fn do_if(
        &mut self,
        node: &'a MappingNode,
        context: &mut ResourceContext,
        data: Node<'d>,
    ) -> Result<bool, ProcessorError> {
        let raw = node.require_attribute("match", self.config)?;
        let expr = prepare_match(raw, &self.registries)?;
        let matched = self.paths.evaluate(&expr, data)?.is_truthy();
        tracing::debug!("<{}> '{}' is {}", node.name(), expr, matched);
        if matched {
            self.exec_children(node, context, data)?;
        }
        Ok(matched)
    }

    pub(super) fn do_else(
        &mut self,
        node: &'a MappingNode,
        context: &mut ResourceContext,
        data: Node<'d>,
        preceding: Option<IfBranch>,
    ) -> Result<(), ProcessorError> {
        match preceding {
            Some(IfBranch::NotTaken) => self.exec_children(node, context, data),
            Some(IfBranch::Taken) | Some(IfBranch::Failed) => Ok(()),
            None => Err(ProcessorError::InvalidConfig(format!(
                "<{}> must directly follow an <if>",
                node.name()
            ))),
        }
    }

    /// Cases run in document order. A case stops the switch once it has
    /// matched unless it carries a `break` attribute, whatever its value.
    pub(super) fn do_switch(
        &mut self,
        node: &'a MappingNode,
        context: &mut ResourceContext,
        data: Node<'d>,
    ) -> Result<(), ProcessorError> {
        let candidates: Vec<String> = match node.attribute("match") {
            Some(raw) => {
                let expr = prepare_match(raw, &self.registries)?;
                self.paths
                    .select(&expr, data)?
                    .iter()
                    .map(|candidate| candidate.string_value())
                    .collect()
            }
            None => Vec::new(),
        };

        let mut matched_any = false;
        for case in node.children_with_tag(Tag::Case) {
            let keep_going = case.has_attribute("break");
            if let Some(raw) = case.attribute("match") {
                let expr = prepare_match(raw, &self.registries)?;
                if self.paths.select(&expr, data)?.is_empty() {
                    continue;
                }
                matched_any = true;
                self.exec_children(case, context, data)?;
            } else if let Some(value) = case.attribute("value") {
                let hits = candidates.iter().filter(|c| c.as_str() == value).count();
                if hits == 0 {
                    continue;
                }
                matched_any = true;
                for _ in 0..hits {
                    self.exec_children(case, context, data)?;
                }
            } else {
                return Err(ProcessorError::InvalidConfig(format!(
                    "<{}> must have a match=\"{{xpath}}\" or value=\"...\" attribute in: {}",
                    case.name(),
                    self.config.fragment(case)
                )));
            }
            if !keep_going {
                break;
            }
        }

        if !matched_any {
            let defaults: Vec<&MappingNode> = node.children_with_tag(Tag::Default).collect();
            match defaults.as_slice() {
                [] => {}
                [default] => self.exec_children(default, context, data)?,
                _ => {
                    return Err(ProcessorError::InvalidConfig(format!(
                        "<{}> must not contain more than one <default>",
                        node.name()
                    )))
                }
            }
        }
        Ok(())
    }

    pub(super) fn do_counter(&mut self, node: &'a MappingNode) -> Result<(), ProcessorError> {
        let name = node.require_attribute("name", self.config)?;
        let iterate = node
            .attribute("iterate")
            .map(|value| parse_bool(node.name(), "iterate", value))
            .transpose()?
            .unwrap_or(false);

        if iterate {
            let value = self.registries.counters.iterate(name)?;
            tracing::debug!("Counter '{}' is now {}", name, value);
            return Ok(());
        }

        let initial_value = node
            .attribute("initialValue")
            .map(|value| parse_integer(node.name(), "initialValue", value))
            .transpose()?
            .unwrap_or(0);
        let iteration = node
            .attribute("iteration")
            .map(str::parse::<CounterIteration>)
            .transpose()?
            .unwrap_or_default();
        self.registries.counters.define(name, initial_value, iteration);
        tracing::debug!("Counter '{}' set to {} ({:?})", name, initial_value, iteration);
        Ok(())
    }

    pub(super) fn do_unique_identifier(&mut self, node: &'a MappingNode) -> Result<(), ProcessorError> {
        let name = node.require_attribute("name", self.config)?;
        let generate = node
            .attribute("generate")
            .map(|value| parse_bool(node.name(), "generate", value))
            .transpose()?
            .unwrap_or(true);
        if generate {
            let value = self.registries.identifiers.generate(name);
            tracing::debug!("Unique identifier '{}' is now {}", name, value);
        }
        Ok(())
    }

    pub(super) fn do_error(&mut self, node: &'a MappingNode) -> Result<(), ProcessorError> {
        let message = node.require_attribute("message", self.config)?;
        let exit = node
            .attribute("exit")
            .map(|value| parse_bool(node.name(), "exit", value))
            .transpose()?
            .unwrap_or(false);
        if exit {
            return Err(ProcessorError::UserDefined {
                message: message.to_string(),
                exit,
            });
        }
        tracing::warn!("User specified error: {}", message);
        self.state.add_warning(
            format!("User specified error: {}", message),
            Some(self.config.fragment(node).to_string()),
        );
        Ok(())
    }

    pub(super) fn do_use_named_mapping(
        &mut self,
        node: &'a MappingNode,
        context: &mut ResourceContext,
        data: Node<'d>,
    ) -> Result<(), ProcessorError> {
        let config = self.config;
        let name = node.require_attribute("name", config)?;
        let target = config
            .named_mapping(name)
            .ok_or_else(|| ProcessorError::MissingNamedMapping(name.to_string()))?;
        tracing::debug!("Using named mapping '{}'", name);
        self.exec_children(target, context, data)
    }
}
