//! Named value transforms applied through the `modifier` attribute.
//!
//! A handful of transforms are built in; everything else comes from
//! [`TransformProvider`]s registered on a [`TransformRegistry`], consulted in
//! registration order.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use md5::{Digest, Md5};

use crate::ProcessorError;

mod bundle;
mod collection;

pub use bundle::BundleProvider;
pub use collection::CollectionsProvider;

pub type Transform = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// A source of named transforms.
pub trait TransformProvider: Send + Sync {
    /// Shown in logs when the provider is registered.
    fn name(&self) -> &str;

    /// `name` is already trimmed and lowercased.
    fn lookup(&self, name: &str) -> Option<Transform>;
}

#[derive(Default)]
pub struct TransformRegistry {
    providers: Vec<Box<dyn TransformProvider>>,
}

impl fmt::Debug for TransformRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformRegistry")
            .field(
                "providers",
                &self.providers.iter().map(|p| p.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl TransformRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_provider<P: TransformProvider + 'static>(mut self, provider: P) -> Self {
        self.register(Box::new(provider));
        self
    }

    pub fn register(&mut self, provider: Box<dyn TransformProvider>) {
        tracing::debug!("Registered transform provider '{}'", provider.name());
        self.providers.push(provider);
    }

    /// Register one [`BundleProvider`] per `*.json` file in `dir`, in file
    /// name order. Returns the number of bundles loaded.
    pub fn load_bundles(&mut self, dir: &Path) -> Result<usize, ProcessorError> {
        let bundles = BundleProvider::load_dir(dir)?;
        let count = bundles.len();
        for bundle in bundles {
            self.register(Box::new(bundle));
        }
        tracing::info!("Loaded {} transform bundle(s) from {}", count, dir.display());
        Ok(count)
    }

    pub fn resolve(&self, name: &str) -> Result<Transform, ProcessorError> {
        let key = name.trim().to_lowercase();
        if let Some(transform) = builtin(&key) {
            return Ok(transform);
        }
        self.providers
            .iter()
            .find_map(|provider| provider.lookup(&key))
            .ok_or_else(|| ProcessorError::UnknownTransform(name.to_string()))
    }
}

/// Look up one of the built-in transforms.
pub fn builtin(name: &str) -> Option<Transform> {
    let transform: Transform = match name {
        "md5" => Arc::new(md5_hex),
        "strtolower" => Arc::new(|input: &str| input.to_lowercase()),
        "extractcurrency" => Arc::new(extract_currency),
        "extractdenomination" => Arc::new(extract_denomination),
        _ => return None,
    };
    Some(transform)
}

fn md5_hex(input: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// `"GBP,12.50"` → `"GBP"`
fn extract_currency(input: &str) -> String {
    let value = input.trim();
    match value.find(',') {
        Some(pos) if pos > 0 => value[..pos].to_string(),
        _ => value.to_string(),
    }
}

/// `"GBP,12.50"` → `"12.50"`; empty unless the second field is numeric.
fn extract_denomination(input: &str) -> String {
    let value = input.trim();
    match value.find(',') {
        Some(pos) if pos > 0 => {
            let denomination = &value[pos + 1..];
            if denomination.trim().parse::<f64>().is_ok() {
                denomination.to_string()
            } else {
                String::new()
            }
        }
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Shouty;

    impl TransformProvider for Shouty {
        fn name(&self) -> &str {
            "shouty"
        }

        fn lookup(&self, name: &str) -> Option<Transform> {
            match name {
                "shout" => Some(Arc::new(|input: &str| input.to_uppercase())),
                // shadowed by the built-in
                "md5" => Some(Arc::new(|_: &str| "not a hash".to_string())),
                _ => None,
            }
        }
    }

    #[test]
    fn test_builtins_are_case_insensitive() {
        let registry = TransformRegistry::new();
        let lower = registry.resolve("  StrToLower ").unwrap();
        assert_eq!(lower("MiXeD"), "mixed");

        let md5 = registry.resolve("MD5").unwrap();
        assert_eq!(md5("hello"), "5d41402abc4b2a76b9719d911017c592");
    }

    #[test]
    fn test_currency_and_denomination() {
        assert_eq!(extract_currency(" GBP,12.50 "), "GBP");
        assert_eq!(extract_currency("GBP"), "GBP");
        assert_eq!(extract_currency(",12"), ",12");
        assert_eq!(extract_denomination("GBP,12.50"), "12.50");
        assert_eq!(extract_denomination("GBP,twelve"), "");
        assert_eq!(extract_denomination("GBP"), "");
        assert_eq!(extract_denomination(""), "");
    }

    #[test]
    fn test_providers_consulted_after_builtins() {
        let registry = TransformRegistry::new().with_provider(Shouty);
        assert_eq!(registry.resolve("Shout").unwrap()("abc"), "ABC");
        assert_eq!(registry.resolve("md5").unwrap()("").len(), 32);
    }

    #[test]
    fn test_unknown_transform() {
        let registry = TransformRegistry::new().with_provider(Shouty);
        assert!(matches!(
            registry.resolve("whisper"),
            Err(ProcessorError::UnknownTransform(name)) if name == "whisper"
        ));
    }
}
