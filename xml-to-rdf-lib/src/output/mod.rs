use std::fmt;
use std::str::FromStr;

use crate::types::{QualifiedName, ShortUri};
use crate::ProcessorError;

mod graph;
mod serializer;

pub use graph::RdfGraph;
pub use serializer::serialize;

/// Opaque reference to a subject created through a [`GraphSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubjectHandle(pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind<'a> {
    Plain,
    /// Datatype IRI, either absolute or `prefix:local`.
    Typed(&'a str),
    Language(&'a str),
}

/// Graph construction calls made while interpreting a mapping.
pub trait GraphSink {
    /// A subject with no identifier yet.
    fn add_resource(&mut self) -> SubjectHandle;

    fn add_resource_with_identifier(&mut self, id: &ShortUri) -> Result<SubjectHandle, ProcessorError>;

    /// Name an existing subject. Statements already made about it follow.
    fn add_identifier_for_resource(
        &mut self,
        subject: SubjectHandle,
        id: &ShortUri,
    ) -> Result<(), ProcessorError>;

    fn add_predicate_and_object(
        &mut self,
        subject: SubjectHandle,
        predicate: &QualifiedName,
        object: &ShortUri,
    ) -> Result<(), ProcessorError>;

    fn add_predicate_and_literal(
        &mut self,
        subject: SubjectHandle,
        predicate: &QualifiedName,
        text: &str,
        kind: LiteralKind<'_>,
    ) -> Result<(), ProcessorError>;

    /// A new blank node typed with `type_name`.
    fn add_blank_node(&mut self, type_name: &QualifiedName) -> Result<SubjectHandle, ProcessorError>;

    fn add_predicate_and_node(
        &mut self,
        subject: SubjectHandle,
        predicate: &QualifiedName,
        node: SubjectHandle,
    ) -> Result<(), ProcessorError>;

    /// Move everything emitted so far into the named graph `graph`.
    fn assign_current_nodes_to_named_graph(&mut self, graph: &str) -> Result<(), ProcessorError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    RdfXml,
    Turtle,
    N3,
    TriG,
    NTriples,
    NQuads,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::RdfXml => "rdf",
            OutputFormat::Turtle => "ttl",
            OutputFormat::N3 => "n3",
            OutputFormat::TriG => "trig",
            OutputFormat::NTriples => "nt",
            OutputFormat::NQuads => "nq",
        }
    }

    pub fn supports_named_graphs(self) -> bool {
        matches!(self, OutputFormat::TriG | OutputFormat::NQuads)
    }
}

impl FromStr for OutputFormat {
    type Err = ProcessorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rdf" | "rdfxml" | "xml" => Ok(OutputFormat::RdfXml),
            "ttl" | "turtle" => Ok(OutputFormat::Turtle),
            "n3" | "notation3" => Ok(OutputFormat::N3),
            "trig" => Ok(OutputFormat::TriG),
            "nt" | "ntriples" => Ok(OutputFormat::NTriples),
            "nq" | "nquads" => Ok(OutputFormat::NQuads),
            other => Err(ProcessorError::InvalidConfig(format!(
                "unknown output format '{}' [expected: rdf, ttl, n3, trig, nt, nq]",
                other
            ))),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputFormat::RdfXml => "RDF/XML",
            OutputFormat::Turtle => "Turtle",
            OutputFormat::N3 => "N3",
            OutputFormat::TriG => "TriG",
            OutputFormat::NTriples => "N-Triples",
            OutputFormat::NQuads => "N-Quads",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_names_and_extensions() {
        let cases = [
            ("rdf", OutputFormat::RdfXml, "rdf"),
            ("Turtle", OutputFormat::Turtle, "ttl"),
            ("notation3", OutputFormat::N3, "n3"),
            (" trig ", OutputFormat::TriG, "trig"),
            ("nt", OutputFormat::NTriples, "nt"),
            ("nquads", OutputFormat::NQuads, "nq"),
        ];
        for (name, format, extension) in cases {
            let parsed: OutputFormat = name.parse().unwrap();
            assert_eq!(parsed, format);
            assert_eq!(parsed.extension(), extension);
        }
        assert!("jsonld".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_graph_capable_formats() {
        assert!(OutputFormat::TriG.supports_named_graphs());
        assert!(OutputFormat::NQuads.supports_named_graphs());
        assert!(!OutputFormat::default().supports_named_graphs());
    }
}
