use std::path::{Path, PathBuf};

use crate::error::ProcessorError;

use super::MappingNode;

const DEFAULT_INPUT_DIRECTORY: &str = "inputchunks";
const DEFAULT_OUTPUT_DIRECTORY: &str = "outputchunks";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitKind {
    /// Close a chunk after `size` top-level nodes.
    ElementCount,
    /// Close a chunk once its body reaches `size` kilobytes.
    FileSize,
}

/// The `<split>` element of a mapping configuration. A `filesuffix`
/// attribute is accepted and ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitSettings {
    pub kind: SplitKind,
    pub size: usize,
    pub input_directory: String,
    pub output_directory: String,
}

impl SplitSettings {
    pub(super) fn from_node(node: &MappingNode) -> Result<Self, ProcessorError> {
        let (kind, size) = match (node.attribute("type"), node.attribute("size")) {
            (Some(kind), Some(size)) => (kind, size),
            _ => {
                return Err(ProcessorError::Split(
                    "type and size attributes must be defined for <split>".into(),
                ))
            }
        };

        let kind = match kind.trim().to_lowercase().as_str() {
            "elementcount" => SplitKind::ElementCount,
            "filesize" => SplitKind::FileSize,
            other => {
                return Err(ProcessorError::Split(format!(
                    "unrecognized split type '{}': must be elementcount or filesize",
                    other
                )))
            }
        };

        let size = size
            .trim()
            .parse::<usize>()
            .ok()
            .filter(|size| *size > 0)
            .ok_or_else(|| {
                ProcessorError::Split(format!("size '{}' is not a positive integer", size))
            })?;

        Ok(Self {
            kind,
            size,
            input_directory: node
                .attribute("inputdirectoryname")
                .unwrap_or(DEFAULT_INPUT_DIRECTORY)
                .to_string(),
            output_directory: node
                .attribute("outputdirectoryname")
                .unwrap_or(DEFAULT_OUTPUT_DIRECTORY)
                .to_string(),
        })
    }

    /// Chunks are written next to the input file.
    pub fn input_chunk_dir(&self, input_file: &Path) -> PathBuf {
        input_file
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(&self.input_directory)
    }

    pub fn output_chunk_dir(&self, output_dir: &Path) -> PathBuf {
        output_dir.join(&self.output_directory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MappingConfig;

    #[test]
    fn test_split_defaults() {
        let config: MappingConfig = r#"<config><split type="ElementCount" size="50"/></config>"#
            .parse()
            .unwrap();
        let split = config.split_settings().unwrap();
        assert_eq!(split.kind, SplitKind::ElementCount);
        assert_eq!(split.size, 50);
        assert_eq!(split.input_directory, "inputchunks");
        assert_eq!(
            split.input_chunk_dir(Path::new("/data/big.xml")),
            PathBuf::from("/data/inputchunks")
        );
        assert_eq!(
            split.output_chunk_dir(Path::new("/out")),
            PathBuf::from("/out/outputchunks")
        );
    }

    #[test]
    fn test_split_errors() {
        let missing: MappingConfig = "<config/>".parse().unwrap();
        assert!(matches!(missing.split_settings(), Err(ProcessorError::Split(_))));

        let bad_type: MappingConfig = r#"<config><split type="lines" size="5"/></config>"#
            .parse()
            .unwrap();
        assert!(bad_type.split_settings().is_err());

        let bad_size: MappingConfig = r#"<config><split type="filesize" size="big"/></config>"#
            .parse()
            .unwrap();
        assert!(bad_size.split_settings().is_err());
        assert!(bad_size.validate().is_err());
    }

    #[test]
    fn test_split_custom_directories() {
        let config: MappingConfig = r#"<config><split type="filesize" size="2" inputdirectoryname="in" outputdirectoryname="out" filesuffix="{@id}"/></config>"#
            .parse()
            .unwrap();
        let split = config.split_settings().unwrap();
        assert_eq!(split.kind, SplitKind::FileSize);
        assert_eq!(split.input_directory, "in");
        assert_eq!(split.output_directory, "out");
    }
}
