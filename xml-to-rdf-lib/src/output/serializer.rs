use std::io::Write;

use oxrdfxml::RdfXmlSerializer;
use oxttl::{NQuadsSerializer, NTriplesSerializer, TriGSerializer, TurtleSerializer};

use super::{OutputFormat, RdfGraph};
use crate::ProcessorError;

/// Write `graph` in its current [`RdfGraph::format`] and hand the writer back.
pub fn serialize<W: Write>(graph: &RdfGraph, writer: W) -> Result<W, ProcessorError> {
    let format = graph.format();
    tracing::debug!("Serializing {} statement(s) as {}", graph.len(), format);
    match format {
        OutputFormat::RdfXml => write_rdf_xml(graph, writer),
        OutputFormat::Turtle | OutputFormat::N3 => write_turtle(graph, writer),
        OutputFormat::TriG => write_trig(graph, writer),
        OutputFormat::NTriples => write_ntriples(graph, writer),
        OutputFormat::NQuads => write_nquads(graph, writer),
    }
}

fn prefix_error(prefix: &str, error: impl std::fmt::Display) -> ProcessorError {
    ProcessorError::Serialization(format!("cannot declare prefix '{}': {}", prefix, error))
}

fn write_rdf_xml<W: Write>(graph: &RdfGraph, writer: W) -> Result<W, ProcessorError> {
    let mut serializer = RdfXmlSerializer::new();
    for (prefix, uri) in graph.namespaces().iter() {
        serializer = serializer
            .with_prefix(prefix, uri)
            .map_err(|e| prefix_error(prefix, e))?;
    }
    let mut serializer = serializer.for_writer(writer);
    for triple in graph.triples() {
        serializer.serialize_triple(&triple)?;
    }
    Ok(serializer.finish()?)
}

fn write_turtle<W: Write>(graph: &RdfGraph, writer: W) -> Result<W, ProcessorError> {
    let mut serializer = TurtleSerializer::new();
    for (prefix, uri) in graph.namespaces().iter() {
        serializer = serializer
            .with_prefix(prefix, uri)
            .map_err(|e| prefix_error(prefix, e))?;
    }
    let mut serializer = serializer.for_writer(writer);
    for triple in graph.triples() {
        serializer.serialize_triple(&triple)?;
    }
    Ok(serializer.finish()?)
}

fn write_trig<W: Write>(graph: &RdfGraph, writer: W) -> Result<W, ProcessorError> {
    let mut serializer = TriGSerializer::new();
    for (prefix, uri) in graph.namespaces().iter() {
        serializer = serializer
            .with_prefix(prefix, uri)
            .map_err(|e| prefix_error(prefix, e))?;
    }
    let mut serializer = serializer.for_writer(writer);
    for quad in graph.quads() {
        serializer.serialize_quad(&quad)?;
    }
    Ok(serializer.finish()?)
}

fn write_ntriples<W: Write>(graph: &RdfGraph, writer: W) -> Result<W, ProcessorError> {
    let mut serializer = NTriplesSerializer::new().for_writer(writer);
    for triple in graph.triples() {
        serializer.serialize_triple(&triple)?;
    }
    let mut writer = serializer.finish();
    writer.flush()?;
    Ok(writer)
}

fn write_nquads<W: Write>(graph: &RdfGraph, writer: W) -> Result<W, ProcessorError> {
    let mut serializer = NQuadsSerializer::new().for_writer(writer);
    for quad in graph.quads() {
        serializer.serialize_quad(&quad)?;
    }
    let mut writer = serializer.finish();
    writer.flush()?;
    Ok(writer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{GraphSink, LiteralKind};
    use crate::types::{NamespaceTable, QualifiedName, ShortUri};

    fn sample(format: OutputFormat) -> RdfGraph {
        let mut namespaces = NamespaceTable::new();
        namespaces.register("ex", "http://example.com/");
        let mut graph = RdfGraph::new(namespaces, format);
        let subject = graph
            .add_resource_with_identifier(&ShortUri {
                prefix: "ex".into(),
                local: "coin".into(),
            })
            .unwrap();
        graph
            .add_predicate_and_literal(
                subject,
                &QualifiedName::parse("rdfs:label").unwrap(),
                "Coin",
                LiteralKind::Plain,
            )
            .unwrap();
        graph
    }

    fn render(graph: &RdfGraph) -> String {
        String::from_utf8(serialize(graph, Vec::new()).unwrap()).unwrap()
    }

    #[test]
    fn test_ntriples() {
        assert_eq!(
            render(&sample(OutputFormat::NTriples)),
            "<http://example.com/coin> <http://www.w3.org/2000/01/rdf-schema#label> \"Coin\" .\n"
        );
    }

    #[test]
    fn test_turtle_uses_prefixes() {
        let text = render(&sample(OutputFormat::Turtle));
        assert!(text.contains("@prefix ex: <http://example.com/>"));
        assert!(text.contains("ex:coin"));
        assert!(text.contains("\"Coin\""));
    }

    #[test]
    fn test_rdf_xml() {
        let text = render(&sample(OutputFormat::RdfXml));
        assert!(text.contains("rdf:RDF"));
        assert!(text.contains("http://example.com/coin"));
        assert!(text.contains(">Coin<"));
    }

    #[test]
    fn test_trig_and_nquads_carry_graph_names() {
        let mut graph = sample(OutputFormat::NQuads);
        graph
            .assign_current_nodes_to_named_graph("http://example.com/g1")
            .unwrap();
        let nquads = render(&graph);
        assert!(nquads.trim_end().ends_with("<http://example.com/g1> ."));

        let mut graph = sample(OutputFormat::RdfXml);
        graph
            .assign_current_nodes_to_named_graph("http://example.com/g1")
            .unwrap();
        let trig = render(&graph);
        assert!(trig.contains("<http://example.com/g1>") || trig.contains("ex:g1"));
        assert!(trig.contains('{'));
    }
}
