use std::str::FromStr;

use sxd_document::dom::{Document, Element};
use sxd_document::Package;
use sxd_xpath::nodeset::Node;

use crate::types::NamespaceTable;
use crate::ProcessorError;

/// Prefix bound to the input root element's own namespace.
pub const ROOT_NAMESPACE_PREFIX: &str = "vp";

/// A loaded input document together with the namespace prefixes its path
/// expressions may use.
pub struct DataDocument {
    package: Package,
    namespaces: Vec<(String, String)>,
}

impl FromStr for DataDocument {
    type Err = ProcessorError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let package = sxd_document::parser::parse(text)
            .map_err(|e| ProcessorError::XmlParse(format!("input document: {:?}", e)))?;
        let namespaces = discover_namespaces(&package.as_document());
        tracing::debug!("Input document declares {} namespace prefix(es)", namespaces.len());
        Ok(Self {
            package,
            namespaces,
        })
    }
}

impl DataDocument {
    pub fn document(&self) -> Document<'_> {
        self.package.as_document()
    }

    pub fn root_node<'d>(document: &Document<'d>) -> Node<'d> {
        Node::Root(document.root())
    }

    pub fn namespaces(&self) -> impl Iterator<Item = (&str, &str)> {
        self.namespaces
            .iter()
            .map(|(prefix, uri)| (prefix.as_str(), uri.as_str()))
    }

    /// Bind the mapping configuration's prefixes that the input does not
    /// already declare.
    pub fn bind_missing(&mut self, table: &NamespaceTable) {
        for (prefix, uri) in table.iter() {
            if !self.namespaces.iter().any(|(bound, _)| bound == prefix) {
                self.namespaces.push((prefix.to_string(), uri.to_string()));
            }
        }
    }
}

fn discover_namespaces(document: &Document<'_>) -> Vec<(String, String)> {
    let mut namespaces: Vec<(String, String)> = Vec::new();
    let mut pending: Vec<Element<'_>> = document
        .root()
        .children()
        .into_iter()
        .filter_map(|child| child.element())
        .collect();
    if let Some(uri) = pending.first().and_then(|root| root.name().namespace_uri()) {
        namespaces.push((ROOT_NAMESPACE_PREFIX.to_string(), uri.to_string()));
    }

    // depth-first, document order
    pending.reverse();
    while let Some(element) = pending.pop() {
        let mut declared: Vec<(&str, &str)> = element
            .namespaces_in_scope()
            .into_iter()
            .map(|namespace| (namespace.prefix(), namespace.uri()))
            .filter(|(prefix, _)| {
                *prefix != "xml" && !namespaces.iter().any(|(bound, _)| bound == prefix)
            })
            .collect();
        declared.sort();
        namespaces.extend(
            declared
                .into_iter()
                .map(|(prefix, uri)| (prefix.to_string(), uri.to_string())),
        );

        let children: Vec<Element<'_>> = element
            .children()
            .into_iter()
            .filter_map(|child| child.element())
            .collect();
        pending.extend(children.into_iter().rev());
    }
    namespaces
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_namespace_bound_to_vp() {
        let data: DataDocument = r#"<records xmlns="http://example.com/records"
            xmlns:dc="http://purl.org/dc/elements/1.1/">
            <record><inner xmlns:ex="http://example.com/ex"/></record>
        </records>"#
            .parse()
            .unwrap();
        let bound: Vec<(&str, &str)> = data.namespaces().collect();
        assert_eq!(
            bound,
            vec![
                ("vp", "http://example.com/records"),
                ("dc", "http://purl.org/dc/elements/1.1/"),
                ("ex", "http://example.com/ex"),
            ]
        );
    }

    #[test]
    fn test_prefixed_root_is_also_bound_to_vp() {
        let data: DataDocument = r#"<!-- export -->
            <m:records xmlns:m="http://example.com/m" xmlns:dc="http://purl.org/dc/elements/1.1/">
                <m:record xml:lang="en"/>
            </m:records>"#
            .parse()
            .unwrap();
        let bound: Vec<(&str, &str)> = data.namespaces().collect();
        assert_eq!(
            bound,
            vec![
                ("vp", "http://example.com/m"),
                ("dc", "http://purl.org/dc/elements/1.1/"),
                ("m", "http://example.com/m"),
            ]
        );
    }

    #[test]
    fn test_bind_missing_keeps_document_bindings() {
        let mut data: DataDocument = r#"<r xmlns:rdfs="http://example.com/not-rdfs"/>"#
            .parse()
            .unwrap();
        let mut table = NamespaceTable::new();
        table.register("ex", "http://example.com/");
        data.bind_missing(&table);

        let rdfs = data.namespaces().find(|(p, _)| *p == "rdfs").unwrap();
        assert_eq!(rdfs.1, "http://example.com/not-rdfs");
        assert!(data.namespaces().any(|(p, _)| p == "ex"));
        assert!(!data.namespaces().any(|(p, _)| p == "vp"));
    }

    #[test]
    fn test_malformed_input() {
        assert!(matches!(
            "<r><unclosed></r>".parse::<DataDocument>(),
            Err(ProcessorError::XmlParse(_))
        ));
    }
}
