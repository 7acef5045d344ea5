use oxiri::Iri;
use oxrdf::vocab::rdf;
use oxrdf::{BlankNode, GraphName, Literal, NamedNode, NamedOrBlankNode, Quad, Term, Triple};

use super::{GraphSink, LiteralKind, OutputFormat, SubjectHandle};
use crate::types::{NamespaceTable, QualifiedName, ShortUri};
use crate::ProcessorError;

/// A subject slot: blank until an identifier is attached.
#[derive(Debug, Clone)]
struct Slot {
    blank: BlankNode,
    iri: Option<NamedNode>,
}

#[derive(Debug, Clone)]
enum Object {
    Named(NamedNode),
    Node(usize),
    Literal(Literal),
}

#[derive(Debug, Clone)]
struct Statement {
    subject: usize,
    predicate: NamedNode,
    object: Object,
}

#[derive(Debug)]
struct SealedGraph {
    name: NamedNode,
    statements: Vec<Statement>,
}

/// In-memory [`GraphSink`].
///
/// Statements go into a current buffer; asserting a named graph seals that
/// buffer under the graph name and starts an empty one. Whatever is left in
/// the buffer at the end belongs to the default graph.
#[derive(Debug)]
pub struct RdfGraph {
    namespaces: NamespaceTable,
    base_iri: Option<Iri<String>>,
    format: OutputFormat,
    slots: Vec<Slot>,
    current: Vec<Statement>,
    sealed: Vec<SealedGraph>,
}

impl RdfGraph {
    pub fn new(namespaces: NamespaceTable, format: OutputFormat) -> Self {
        Self {
            namespaces,
            base_iri: None,
            format,
            slots: Vec::new(),
            current: Vec::new(),
            sealed: Vec::new(),
        }
    }

    /// Relative identifiers are resolved against `base`.
    pub fn with_base_iri(mut self, base: &str) -> Result<Self, ProcessorError> {
        let iri = Iri::parse(base.to_string())
            .map_err(|e| ProcessorError::InvalidIri(format!("{} ({})", base, e)))?;
        self.base_iri = Some(iri);
        Ok(self)
    }

    pub fn namespaces(&self) -> &NamespaceTable {
        &self.namespaces
    }

    /// The format to write with; switches to TriG once a named graph is
    /// asserted on a format that cannot carry one.
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn named_graph_count(&self) -> usize {
        self.sealed.len()
    }

    pub fn len(&self) -> usize {
        self.current.len() + self.sealed.iter().map(|g| g.statements.len()).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every statement, in emission order, with its graph.
    pub fn quads(&self) -> Vec<Quad> {
        let sealed = self.sealed.iter().flat_map(|graph| {
            graph
                .statements
                .iter()
                .map(move |s| self.quad(s, GraphName::NamedNode(graph.name.clone())))
        });
        let default = self
            .current
            .iter()
            .map(|s| self.quad(s, GraphName::DefaultGraph));
        sealed.chain(default).collect()
    }

    /// Every statement with graph names dropped.
    pub fn triples(&self) -> Vec<Triple> {
        self.sealed
            .iter()
            .flat_map(|graph| graph.statements.iter())
            .chain(self.current.iter())
            .map(|s| self.triple(s))
            .collect()
    }

    fn subject(&self, slot: usize) -> NamedOrBlankNode {
        match &self.slots[slot].iri {
            Some(iri) => iri.clone().into(),
            None => self.slots[slot].blank.clone().into(),
        }
    }

    fn object(&self, object: &Object) -> Term {
        match object {
            Object::Named(node) => node.clone().into(),
            Object::Node(slot) => match self.subject(*slot) {
                NamedOrBlankNode::NamedNode(node) => node.into(),
                NamedOrBlankNode::BlankNode(node) => node.into(),
            },
            Object::Literal(literal) => literal.clone().into(),
        }
    }

    fn triple(&self, statement: &Statement) -> Triple {
        Triple::new(
            self.subject(statement.subject),
            statement.predicate.clone(),
            self.object(&statement.object),
        )
    }

    fn quad(&self, statement: &Statement, graph: GraphName) -> Quad {
        Quad::new(
            self.subject(statement.subject),
            statement.predicate.clone(),
            self.object(&statement.object),
            graph,
        )
    }

    fn resolve_iri(&self, value: &str) -> Result<NamedNode, ProcessorError> {
        if let Ok(iri) = Iri::parse(value.to_string()) {
            return Ok(NamedNode::new_unchecked(iri.into_inner()));
        }
        let base = self
            .base_iri
            .as_ref()
            .ok_or_else(|| ProcessorError::InvalidIri(value.to_string()))?;
        let resolved = base
            .resolve(value)
            .map_err(|e| ProcessorError::InvalidIri(format!("{} ({})", value, e)))?;
        Ok(NamedNode::new_unchecked(resolved.into_inner()))
    }

    fn short_uri(&self, id: &ShortUri) -> Result<NamedNode, ProcessorError> {
        self.resolve_iri(&self.namespaces.expand(id)?)
    }

    fn predicate(&self, name: &QualifiedName) -> Result<NamedNode, ProcessorError> {
        self.resolve_iri(&self.namespaces.expand_qualified(name)?)
    }

    fn datatype(&self, datatype: &str) -> Result<NamedNode, ProcessorError> {
        if let Ok(name) = QualifiedName::parse(datatype) {
            if self.namespaces.get(&name.prefix).is_some() {
                return self.predicate(&name);
            }
        }
        self.resolve_iri(datatype.trim())
    }

    fn slot(&self, handle: SubjectHandle) -> Result<usize, ProcessorError> {
        if handle.0 < self.slots.len() {
            Ok(handle.0)
        } else {
            Err(ProcessorError::Processing(format!(
                "unknown subject handle {}",
                handle.0
            )))
        }
    }

    fn new_slot(&mut self, iri: Option<NamedNode>) -> SubjectHandle {
        self.slots.push(Slot {
            blank: BlankNode::default(),
            iri,
        });
        SubjectHandle(self.slots.len() - 1)
    }

    fn push(&mut self, subject: usize, predicate: NamedNode, object: Object) {
        self.current.push(Statement {
            subject,
            predicate,
            object,
        });
    }
}

impl GraphSink for RdfGraph {
    fn add_resource(&mut self) -> SubjectHandle {
        self.new_slot(None)
    }

    fn add_resource_with_identifier(&mut self, id: &ShortUri) -> Result<SubjectHandle, ProcessorError> {
        let iri = self.short_uri(id)?;
        Ok(self.new_slot(Some(iri)))
    }

    fn add_identifier_for_resource(
        &mut self,
        subject: SubjectHandle,
        id: &ShortUri,
    ) -> Result<(), ProcessorError> {
        let slot = self.slot(subject)?;
        let iri = self.short_uri(id)?;
        self.slots[slot].iri = Some(iri);
        Ok(())
    }

    fn add_predicate_and_object(
        &mut self,
        subject: SubjectHandle,
        predicate: &QualifiedName,
        object: &ShortUri,
    ) -> Result<(), ProcessorError> {
        let slot = self.slot(subject)?;
        let predicate = self.predicate(predicate)?;
        let object = self.short_uri(object)?;
        self.push(slot, predicate, Object::Named(object));
        Ok(())
    }

    fn add_predicate_and_literal(
        &mut self,
        subject: SubjectHandle,
        predicate: &QualifiedName,
        text: &str,
        kind: LiteralKind<'_>,
    ) -> Result<(), ProcessorError> {
        let slot = self.slot(subject)?;
        let predicate = self.predicate(predicate)?;
        let literal = match kind {
            LiteralKind::Plain => Literal::new_simple_literal(text),
            LiteralKind::Typed(datatype) => Literal::new_typed_literal(text, self.datatype(datatype)?),
            LiteralKind::Language(language) => {
                Literal::new_language_tagged_literal(text, language.trim()).map_err(|e| {
                    ProcessorError::Processing(format!("invalid language tag '{}': {}", language, e))
                })?
            }
        };
        self.push(slot, predicate, Object::Literal(literal));
        Ok(())
    }

    fn add_blank_node(&mut self, type_name: &QualifiedName) -> Result<SubjectHandle, ProcessorError> {
        let class = self.predicate(type_name)?;
        let handle = self.new_slot(None);
        self.push(handle.0, rdf::TYPE.into_owned(), Object::Named(class));
        Ok(handle)
    }

    fn add_predicate_and_node(
        &mut self,
        subject: SubjectHandle,
        predicate: &QualifiedName,
        node: SubjectHandle,
    ) -> Result<(), ProcessorError> {
        let slot = self.slot(subject)?;
        let target = self.slot(node)?;
        let predicate = self.predicate(predicate)?;
        self.push(slot, predicate, Object::Node(target));
        Ok(())
    }

    fn assign_current_nodes_to_named_graph(&mut self, graph: &str) -> Result<(), ProcessorError> {
        let name = self.resolve_iri(graph)?;
        if !self.format.supports_named_graphs() {
            self.format = OutputFormat::TriG;
            tracing::info!("Format set to TriG as namedgraph has been asserted.");
        }
        let statements = std::mem::take(&mut self.current);
        tracing::debug!("Sealed {} statement(s) into graph <{}>", statements.len(), name.as_str());
        self.sealed.push(SealedGraph { name, statements });
        Ok(())
    }
}
