//! XML to RDF Mapping Library
//!
//! This library converts XML documents to RDF by interpreting a declarative
//! XML mapping configuration against each input document.

mod config;
mod error;
mod interpreter;
mod output;
mod path;
mod processor;
mod split;
mod transform;
mod types;
mod utils;

pub use config::{MappingConfig, MappingNode, SplitKind, SplitSettings, Tag};
pub use error::{ProcessingMessage, ProcessingOutcome, ProcessingState, ProcessorError};
pub use interpreter::Interpreter;
pub use output::{serialize, GraphSink, LiteralKind, OutputFormat, RdfGraph, SubjectHandle};
pub use path::{DataDocument, PathEvaluator, PathValue};
pub use processor::{DocumentReport, Processor, ProcessorBuilder};
pub use split::XmlSplitter;
pub use transform::{
    BundleProvider, CollectionsProvider, Transform, TransformProvider, TransformRegistry,
};
pub use types::{NamespaceTable, QualifiedName, ShortUri};

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::Once;
    use tracing::{error, info};

    static INIT: Once = Once::new();

    /// Initialize logging exactly once for all tests
    fn init_logging() {
        INIT.call_once(|| {
            tracing_subscriber::fmt()
                .with_test_writer()
                .with_max_level(tracing::Level::DEBUG)
                .init();
        });
    }

    fn transforms() -> TransformRegistry {
        let mut transforms = TransformRegistry::new().with_provider(CollectionsProvider);
        transforms
            .load_bundles(Path::new("../test-data/modifiers"))
            .unwrap();
        transforms
    }

    #[test]
    fn test_config_loading() {
        init_logging();

        info!("Testing mapping configuration loading");
        let config = MappingConfig::from_file("../test-data/config.xml").unwrap();
        assert_eq!(config.namespaces().get("ex"), Some("http://example.com/museum/"));
        assert!(config.named_mapping("valuation").is_some());

        info!("Validating mapping configuration");
        match config.validate() {
            Ok(_) => info!("Configuration validation successful"),
            Err(e) => error!("Configuration validation failed: {}", e),
        }
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_museum_records_to_ntriples() {
        init_logging();

        let config = MappingConfig::from_file("../test-data/config.xml").unwrap();
        let processor = Processor::builder(config)
            .format(OutputFormat::NTriples)
            .transforms(transforms())
            .build()
            .unwrap();
        let xml = std::fs::read_to_string("../test-data/input.xml").unwrap();
        let (graph, state) = processor.map_document(&xml, None).unwrap();
        for message in state.get_errors() {
            error!("{} in: {:?}", message.message, message.source);
        }
        assert!(!state.has_errors());

        let text = String::from_utf8(serialize(&graph, Vec::new()).unwrap()).unwrap();
        info!("Mapped {} statement(s)", graph.len());
        let penny = "<http://example.com/museum/object/1001>";
        let token = "<http://example.com/museum/object/1003>";

        assert!(text.contains(&format!(
            "{} <http://www.w3.org/2000/01/rdf-schema#label> \"Silver penny\"@en .",
            penny
        )));
        assert!(text.contains(&format!(
            "{} <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://example.com/museum/Coin> .",
            penny
        )));
        assert!(text.contains(&format!(
            "{} <http://example.com/museum/position> \"3\"^^<http://www.w3.org/2001/XMLSchema#integer> .",
            token
        )));
        assert!(text.contains(&format!(
            "{} <http://example.com/museum/category> \"trade-token\" .",
            token
        )));
        assert!(text.contains(&format!(
            "{} <http://example.com/museum/maker> <http://example.com/museum/maker/Royal_Mint> .",
            penny
        )));
        assert!(text.contains(
            "\"2012-05-23\"^^<http://www.w3.org/2001/XMLSchema#date> ."
        ));
        assert!(text.contains(
            "<http://example.com/museum/amount> \"12.50\"^^<http://www.w3.org/2001/XMLSchema#decimal> ."
        ));
        assert!(text.contains("<http://example.com/museum/currency> \"EUR\" ."));
        assert!(text.contains(&format!(
            "{} <http://www.w3.org/2000/01/rdf-schema#comment> \"No valuation recorded\" .",
            token
        )));
        assert!(text.contains(&format!(
            "{} <http://www.w3.org/2000/01/rdf-schema#comment> \"Uncategorised object\" .",
            token
        )));
        assert_eq!(text.matches("No valuation recorded").count(), 1);
    }

    #[test]
    fn test_missing_bundle_transform_is_recovered() {
        init_logging();

        // Without the museum bundle the `slug` modifier is unknown: the
        // category triples are reported and everything else still maps.
        let config = MappingConfig::from_file("../test-data/config.xml").unwrap();
        let processor = Processor::builder(config)
            .format(OutputFormat::NTriples)
            .transforms(TransformRegistry::new().with_provider(CollectionsProvider))
            .build()
            .unwrap();
        let xml = std::fs::read_to_string("../test-data/input.xml").unwrap();
        let (graph, state) = processor.map_document(&xml, None).unwrap();

        assert_eq!(state.get_errors().len(), 3);
        assert!(state.get_errors()[0].message.contains("slug"));
        let text = String::from_utf8(serialize(&graph, Vec::new()).unwrap()).unwrap();
        assert!(!text.contains("museum/category>"));
        assert!(text.contains("\"Bronze medal\"@en"));
    }

    #[tokio::test]
    async fn test_split_processing_from_fixtures() {
        init_logging();

        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.xml");
        std::fs::copy("../test-data/input.xml", &input).unwrap();
        let output = dir.path().join("rdf");

        let config = MappingConfig::from_file("../test-data/config.xml").unwrap();
        let processor = Processor::builder(config)
            .format(OutputFormat::NTriples)
            .output_dir(&output)
            .transforms(transforms())
            .build()
            .unwrap();
        let reports = processor.process_split(&input).await.unwrap();

        assert_eq!(reports.len(), 2);
        assert!(reports.iter().all(|r| r.outcome.is_success()));
        let second = std::fs::read_to_string(output.join("outputchunks").join("input_1.nt")).unwrap();
        assert!(second.contains("Trade token"));
        assert!(!second.contains("Silver penny"));
        // counters restart with every chunk
        assert!(second.contains(
            "<http://example.com/museum/position> \"1\"^^<http://www.w3.org/2001/XMLSchema#integer> ."
        ));
    }
}
