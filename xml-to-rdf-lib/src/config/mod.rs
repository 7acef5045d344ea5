use std::collections::HashMap;
use std::ops::Range;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::ProcessorError;
use crate::types::NamespaceTable;

mod split;

pub use split::{SplitKind, SplitSettings};

/// Operation selected by a mapping element's tag name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Resource,
    Mapping,
    Triple,
    Type,
    Bnode,
    Identifier,
    If,
    Else,
    Switch,
    Case,
    Default,
    Counter,
    UniqueIdentifier,
    Error,
    UseNamedMapping,
    Partition,
    Namespaces,
    Split,
    NamedMapping,
}

impl Tag {
    /// Resolve a tag name, ignoring case. `foreach` is an alias of `mapping`.
    pub fn from_name(name: &str) -> Option<Tag> {
        let tag = match name.to_ascii_lowercase().as_str() {
            "resource" => Tag::Resource,
            "mapping" | "foreach" => Tag::Mapping,
            "triple" => Tag::Triple,
            "type" => Tag::Type,
            "bnode" => Tag::Bnode,
            "identifier" => Tag::Identifier,
            "if" => Tag::If,
            "else" => Tag::Else,
            "switch" => Tag::Switch,
            "case" => Tag::Case,
            "default" => Tag::Default,
            "counter" => Tag::Counter,
            "uniqueidentifier" => Tag::UniqueIdentifier,
            "error" => Tag::Error,
            "usenamedmapping" => Tag::UseNamedMapping,
            "partition" => Tag::Partition,
            "namespaces" => Tag::Namespaces,
            "split" => Tag::Split,
            "namedmapping" => Tag::NamedMapping,
            _ => return None,
        };
        Some(tag)
    }

    fn has_opaque_children(self) -> bool {
        matches!(self, Tag::Namespaces | Tag::Split | Tag::Partition)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tag::Resource => "resource",
            Tag::Mapping => "mapping",
            Tag::Triple => "triple",
            Tag::Type => "type",
            Tag::Bnode => "bnode",
            Tag::Identifier => "identifier",
            Tag::If => "if",
            Tag::Else => "else",
            Tag::Switch => "switch",
            Tag::Case => "case",
            Tag::Default => "default",
            Tag::Counter => "counter",
            Tag::UniqueIdentifier => "uniqueidentifier",
            Tag::Error => "error",
            Tag::UseNamedMapping => "usenamedmapping",
            Tag::Partition => "partition",
            Tag::Namespaces => "namespaces",
            Tag::Split => "split",
            Tag::NamedMapping => "namedmapping",
        }
    }
}

/// One element of the mapping configuration, immutable once loaded.
#[derive(Debug, Clone)]
pub struct MappingNode {
    tag: Tag,
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<MappingNode>,
    span: Range<usize>,
}

impl MappingNode {
    pub fn tag(&self) -> Tag {
        self.tag
    }

    /// The tag name as written in the configuration.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    pub fn require_attribute(&self, name: &str, config: &MappingConfig) -> Result<&str, ProcessorError> {
        self.attribute(name)
            .ok_or_else(|| ProcessorError::MissingAttribute {
                attribute: name.to_string(),
                fragment: config.fragment(self).to_string(),
            })
    }

    pub fn children(&self) -> &[MappingNode] {
        &self.children
    }

    pub fn children_with_tag(&self, tag: Tag) -> impl Iterator<Item = &MappingNode> {
        self.children.iter().filter(move |child| child.tag == tag)
    }
}

/// A parsed mapping configuration: the `<config>` tree plus everything
/// consumed up front (namespaces, named mappings, split settings).
#[derive(Debug)]
pub struct MappingConfig {
    source: String,
    root: MappingNode,
    named_mappings: HashMap<String, usize>,
    namespaces: NamespaceTable,
    warnings: Vec<String>,
}

impl FromStr for MappingConfig {
    type Err = ProcessorError;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        let document = roxmltree::Document::parse(source)
            .map_err(|e| ProcessorError::XmlParse(format!("mapping configuration: {}", e)))?;
        let root_element = document.root_element();
        if !root_element.tag_name().name().eq_ignore_ascii_case("config") {
            return Err(ProcessorError::InvalidConfig(format!(
                "root element must be <config>, found <{}>",
                root_element.tag_name().name()
            )));
        }

        let children = load_children(root_element, source, None)?;
        let root = MappingNode {
            tag: Tag::Mapping,
            name: root_element.tag_name().name().to_string(),
            attributes: collect_attributes(root_element),
            children,
            span: root_element.range(),
        };

        let mut named_mappings = HashMap::new();
        for (index, child) in root.children.iter().enumerate() {
            if child.tag != Tag::NamedMapping {
                continue;
            }
            match child.attribute("name") {
                Some(name) => {
                    if named_mappings.contains_key(name) {
                        tracing::warn!("Duplicate <namedmapping name=\"{}\">, keeping the first", name);
                    } else {
                        named_mappings.insert(name.to_string(), index);
                    }
                }
                None => tracing::warn!("<namedmapping> without a name attribute is never used"),
            }
        }

        let mut warnings = Vec::new();
        let namespaces = build_namespace_table(root_element, &mut warnings);

        Ok(Self {
            source: source.to_string(),
            root,
            named_mappings,
            namespaces,
            warnings,
        })
    }
}

impl MappingConfig {
    pub fn from_file<P: Into<PathBuf>>(path: P) -> Result<Self, ProcessorError> {
        let path = path.into();
        tracing::info!("Loading mapping configuration from {:?}", path);
        let source = std::fs::read_to_string(&path)?;
        let config = source.parse::<MappingConfig>()?;
        tracing::info!(
            "Successfully loaded mapping configuration: {} ({} top-level nodes, {} named mappings)",
            path.display(),
            config.root.children.len(),
            config.named_mappings.len()
        );
        Ok(config)
    }

    /// Check the parts of the configuration that are only read on demand.
    pub fn validate(&self) -> Result<(), ProcessorError> {
        tracing::info!("Validating mapping configuration...");
        for warning in &self.warnings {
            tracing::warn!("{}", warning);
        }
        if self.root.children_with_tag(Tag::Split).next().is_some() {
            self.split_settings()?;
        }
        validate_named_mapping_references(self, &self.root)?;
        tracing::info!("Mapping configuration validation successful");
        Ok(())
    }

    pub fn root(&self) -> &MappingNode {
        &self.root
    }

    pub fn namespaces(&self) -> &NamespaceTable {
        &self.namespaces
    }

    /// Problems found while loading that do not prevent processing.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn named_mapping(&self, name: &str) -> Option<&MappingNode> {
        self.named_mappings
            .get(name)
            .map(|&index| &self.root.children[index])
    }

    /// The raw configuration text of a node, used in diagnostics.
    pub fn fragment<'s>(&'s self, node: &'s MappingNode) -> &'s str {
        self.source.get(node.span.clone()).unwrap_or(node.name())
    }

    pub fn split_settings(&self) -> Result<SplitSettings, ProcessorError> {
        let split = self
            .root
            .children_with_tag(Tag::Split)
            .next()
            .ok_or_else(|| ProcessorError::Split("no <split> element defined in config".into()))?;
        SplitSettings::from_node(split)
    }
}

fn collect_attributes(node: roxmltree::Node) -> Vec<(String, String)> {
    node.attributes()
        .map(|attribute| (attribute.name().to_string(), attribute.value().to_string()))
        .collect()
}

fn load_children(
    parent: roxmltree::Node,
    source: &str,
    parent_tag: Option<Tag>,
) -> Result<Vec<MappingNode>, ProcessorError> {
    let mut children = Vec::new();
    for child in parent.children().filter(|node| node.is_element()) {
        let name = child.tag_name().name();
        let tag = match Tag::from_name(name) {
            Some(Tag::Case | Tag::Default) if parent_tag != Some(Tag::Switch) => None,
            other => other,
        };
        let tag = tag.ok_or_else(|| ProcessorError::UnrecognizedTag {
            tag: name.to_string(),
            fragment: source[child.range()].to_string(),
        })?;

        let grandchildren = if tag.has_opaque_children() {
            Vec::new()
        } else {
            load_children(child, source, Some(tag))?
        };

        children.push(MappingNode {
            tag,
            name: name.to_string(),
            attributes: collect_attributes(child),
            children: grandchildren,
            span: child.range(),
        });
    }
    Ok(children)
}

fn build_namespace_table(root: roxmltree::Node, warnings: &mut Vec<String>) -> NamespaceTable {
    let mut table = NamespaceTable::new();
    let blocks: Vec<roxmltree::Node> = root
        .children()
        .filter(|node| node.is_element() && Tag::from_name(node.tag_name().name()) == Some(Tag::Namespaces))
        .collect();
    if blocks.is_empty() {
        warnings.push("<namespaces> has not been defined in config".to_string());
        return table;
    }
    for entry in blocks.iter().flat_map(|block| block.children()).filter(|n| n.is_element()) {
        match (entry.attribute("prefix"), entry.attribute("uri")) {
            (Some(prefix), Some(uri)) => {
                if !table.register(prefix, uri) {
                    tracing::debug!("Namespace prefix '{}' already bound, ignoring {}", prefix, uri);
                }
            }
            _ => warnings.push("missing prefix or uri attribute in <namespace> element".to_string()),
        }
    }
    table
}

fn validate_named_mapping_references(
    config: &MappingConfig,
    node: &MappingNode,
) -> Result<(), ProcessorError> {
    for child in node.children() {
        if child.tag == Tag::UseNamedMapping {
            let name = child.require_attribute("name", config)?;
            if config.named_mapping(name).is_none() {
                return Err(ProcessorError::MissingNamedMapping(name.to_string()));
            }
        }
        validate_named_mapping_references(config, child)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"<config>
  <namespaces>
    <namespace prefix="ex" uri="http://example.com/"/>
    <namespace prefix="ex" uri="http://ignored.example.com/"/>
  </namespaces>
  <namedmapping name="labels">
    <triple predicate="rdfs:label" value="{@name}"/>
  </namedmapping>
  <ForEach match="/items/item">
    <Resource>
      <identifier value="{@id}"/>
      <usenamedmapping name="labels"/>
    </Resource>
  </ForEach>
</config>"#;

    #[test]
    fn test_load_resolves_tags_case_insensitively() {
        let config: MappingConfig = CONFIG.parse().unwrap();
        let tags: Vec<Tag> = config.root().children().iter().map(|c| c.tag()).collect();
        assert_eq!(tags, vec![Tag::Namespaces, Tag::NamedMapping, Tag::Mapping]);

        let mapping = &config.root().children()[2];
        assert_eq!(mapping.name(), "ForEach");
        assert_eq!(mapping.attribute("match"), Some("/items/item"));
        assert_eq!(mapping.children()[0].tag(), Tag::Resource);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_namespaces_first_registration_wins() {
        let config: MappingConfig = CONFIG.parse().unwrap();
        assert_eq!(config.namespaces().get("ex"), Some("http://example.com/"));
        assert_eq!(config.namespaces().len(), 4);
        assert!(config.warnings().is_empty());
    }

    #[test]
    fn test_named_mapping_lookup_and_fragment() {
        let config: MappingConfig = CONFIG.parse().unwrap();
        let labels = config.named_mapping("labels").unwrap();
        assert_eq!(labels.children().len(), 1);
        let triple = &labels.children()[0];
        assert_eq!(
            config.fragment(triple),
            r#"<triple predicate="rdfs:label" value="{@name}"/>"#
        );
        assert!(config.named_mapping("missing").is_none());
    }

    #[test]
    fn test_unknown_tag_fails_load() {
        let result = "<config><resource><tripel/></resource></config>".parse::<MappingConfig>();
        assert!(matches!(
            result,
            Err(ProcessorError::UnrecognizedTag { tag, .. }) if tag == "tripel"
        ));
    }

    #[test]
    fn test_case_outside_switch_fails_load() {
        let result = r#"<config><case value="a"/></config>"#.parse::<MappingConfig>();
        assert!(matches!(result, Err(ProcessorError::UnrecognizedTag { .. })));

        let ok = r#"<config><switch match="x"><case value="a"/><default/></switch></config>"#
            .parse::<MappingConfig>();
        assert!(ok.is_ok());
    }

    #[test]
    fn test_root_must_be_config() {
        assert!(matches!(
            "<mapping/>".parse::<MappingConfig>(),
            Err(ProcessorError::InvalidConfig(_))
        ));
        assert!(matches!(
            "<config>".parse::<MappingConfig>(),
            Err(ProcessorError::XmlParse(_))
        ));
    }

    #[test]
    fn test_missing_namespaces_is_a_warning() {
        let config: MappingConfig = "<config/>".parse().unwrap();
        assert_eq!(config.warnings().len(), 1);
        assert_eq!(config.namespaces().len(), 3);
    }

    #[test]
    fn test_validate_reports_missing_named_mapping() {
        let config: MappingConfig =
            r#"<config><namespaces/><usenamedmapping name="nope"/></config>"#
                .parse()
                .unwrap();
        assert!(matches!(
            config.validate(),
            Err(ProcessorError::MissingNamedMapping(name)) if name == "nope"
        ));
    }
}
