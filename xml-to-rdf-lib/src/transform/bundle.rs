use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use regex::Regex;
use serde::Deserialize;

use super::{builtin, Transform, TransformProvider};
use crate::ProcessorError;

/// One step of a bundle transform pipeline.
#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "op", rename_all = "lowercase")]
enum Step {
    Replace {
        pattern: String,
        #[serde(default)]
        with: String,
    },
    Trim,
    Lowercase,
    Uppercase,
    Prefix { value: String },
    Suffix { value: String },
    Builtin { name: String },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct BundleFile {
    name: Option<String>,
    transforms: HashMap<String, Vec<Step>>,
}

enum CompiledStep {
    Replace(Regex, String),
    Trim,
    Lowercase,
    Uppercase,
    Prefix(String),
    Suffix(String),
    Builtin(Transform),
}

impl CompiledStep {
    fn compile(step: Step) -> Result<Self, ProcessorError> {
        Ok(match step {
            Step::Replace { pattern, with } => {
                let regex = Regex::new(&pattern).map_err(|e| {
                    ProcessorError::InvalidConfig(format!(
                        "invalid replace pattern '{}' in transform bundle: {}",
                        pattern, e
                    ))
                })?;
                CompiledStep::Replace(regex, with)
            }
            Step::Trim => CompiledStep::Trim,
            Step::Lowercase => CompiledStep::Lowercase,
            Step::Uppercase => CompiledStep::Uppercase,
            Step::Prefix { value } => CompiledStep::Prefix(value),
            Step::Suffix { value } => CompiledStep::Suffix(value),
            Step::Builtin { name } => {
                let transform = builtin(&name.trim().to_lowercase())
                    .ok_or_else(|| ProcessorError::UnknownTransform(name.clone()))?;
                CompiledStep::Builtin(transform)
            }
        })
    }

    fn apply(&self, input: String) -> String {
        match self {
            CompiledStep::Replace(regex, with) => regex.replace_all(&input, with.as_str()).into_owned(),
            CompiledStep::Trim => input.trim().to_string(),
            CompiledStep::Lowercase => input.to_lowercase(),
            CompiledStep::Uppercase => input.to_uppercase(),
            CompiledStep::Prefix(value) => format!("{}{}", value, input),
            CompiledStep::Suffix(value) => format!("{}{}", input, value),
            CompiledStep::Builtin(transform) => transform(&input),
        }
    }
}

/// Transforms declared in a JSON bundle file:
///
/// ```json
/// {
///   "name": "museum",
///   "transforms": {
///     "slug": [{ "op": "trim" }, { "op": "lowercase" },
///              { "op": "replace", "pattern": "\\s+", "with": "-" }]
///   }
/// }
/// ```
pub struct BundleProvider {
    name: String,
    transforms: HashMap<String, Transform>,
}

impl BundleProvider {
    pub fn from_file<P: Into<PathBuf>>(path: P) -> Result<Self, ProcessorError> {
        let path = path.into();
        tracing::debug!("Loading transform bundle from {:?}", path);
        let file = std::fs::File::open(&path)?;
        let bundle: BundleFile = serde_json::from_reader(file)?;
        let fallback_name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "bundle".to_string());
        Self::compile(bundle.name.unwrap_or(fallback_name), bundle.transforms)
    }

    pub fn from_json(json: &str) -> Result<Self, ProcessorError> {
        let bundle: BundleFile = serde_json::from_str(json)?;
        Self::compile(
            bundle.name.unwrap_or_else(|| "bundle".to_string()),
            bundle.transforms,
        )
    }

    /// Every `*.json` file directly inside `dir`, sorted by file name.
    pub fn load_dir(dir: &Path) -> Result<Vec<Self>, ProcessorError> {
        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|path| {
                path.is_file()
                    && path
                        .extension()
                        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
            })
            .collect();
        paths.sort();
        paths.into_iter().map(Self::from_file).collect()
    }

    fn compile(
        name: String,
        declared: HashMap<String, Vec<Step>>,
    ) -> Result<Self, ProcessorError> {
        let mut transforms = HashMap::new();
        for (transform_name, steps) in declared {
            let steps = steps
                .into_iter()
                .map(CompiledStep::compile)
                .collect::<Result<Vec<_>, _>>()?;
            let pipeline: Transform = Arc::new(move |input: &str| {
                steps
                    .iter()
                    .fold(input.to_string(), |value, step| step.apply(value))
            });
            transforms.insert(transform_name.trim().to_lowercase(), pipeline);
        }
        tracing::debug!("Transform bundle '{}' declares {} transform(s)", name, transforms.len());
        Ok(Self { name, transforms })
    }
}

impl TransformProvider for BundleProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookup(&self, name: &str) -> Option<Transform> {
        self.transforms.get(name).cloned()
    }
}
