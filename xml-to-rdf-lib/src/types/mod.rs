use std::fmt;

use crate::output::SubjectHandle;
use crate::ProcessorError;

mod counter;
mod identifier;

pub use counter::{CounterIteration, CounterRegistry};
pub use identifier::UniqueIdentifierRegistry;

pub const OWL_NS: &str = "http://www.w3.org/2002/07/owl#";
pub const RDF_NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const RDFS_NS: &str = "http://www.w3.org/2000/01/rdf-schema#";

/// Ordered prefix → namespace URI table.
///
/// Registration order matters: [`NamespaceTable::shorten`] returns the first
/// registered namespace the value starts with, and redeclaring a prefix keeps
/// the original binding.
#[derive(Debug, Clone)]
pub struct NamespaceTable {
    entries: Vec<(String, String)>,
}

impl Default for NamespaceTable {
    fn default() -> Self {
        let mut table = Self {
            entries: Vec::new(),
        };
        table.register("owl", OWL_NS);
        table.register("rdf", RDF_NS);
        table.register("rdfs", RDFS_NS);
        table
    }
}

impl NamespaceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when the prefix was already bound (the call is a no-op).
    pub fn register(&mut self, prefix: &str, uri: &str) -> bool {
        if self.get(prefix).is_some() {
            return false;
        }
        self.entries.push((prefix.to_string(), uri.to_string()));
        true
    }

    pub fn get(&self, prefix: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(p, _)| p == prefix)
            .map(|(_, uri)| uri.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(prefix, uri)| (prefix.as_str(), uri.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn shorten(&self, value: &str) -> ShortUri {
        for (prefix, uri) in &self.entries {
            if let Some(local) = value.strip_prefix(uri.as_str()) {
                return ShortUri {
                    prefix: prefix.clone(),
                    local: local.to_string(),
                };
            }
        }
        ShortUri {
            prefix: String::new(),
            local: value.to_string(),
        }
    }

    /// Expand a shortened value back into its full text. An empty prefix
    /// leaves the local part untouched.
    pub fn expand(&self, short: &ShortUri) -> Result<String, ProcessorError> {
        if short.prefix.is_empty() {
            return Ok(short.local.clone());
        }
        let uri = self
            .get(&short.prefix)
            .ok_or_else(|| ProcessorError::UnknownPrefix(short.prefix.clone()))?;
        Ok(format!("{}{}", uri, short.local))
    }

    pub fn expand_qualified(&self, name: &QualifiedName) -> Result<String, ProcessorError> {
        let uri = self
            .get(&name.prefix)
            .ok_or_else(|| ProcessorError::UnknownPrefix(name.prefix.clone()))?;
        Ok(format!("{}{}", uri, name.local))
    }
}

/// A URI split against the namespace table. `prefix` is empty when no
/// registered namespace matched, in which case `local` is the whole value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortUri {
    pub prefix: String,
    pub local: String,
}

impl fmt::Display for ShortUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.prefix.is_empty() {
            write!(f, "{}", self.local)
        } else {
            write!(f, "{}:{}", self.prefix, self.local)
        }
    }
}

/// `prefix:localname`, as used by `predicate` and `type` attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedName {
    pub prefix: String,
    pub local: String,
}

impl QualifiedName {
    pub fn parse(value: &str) -> Result<Self, ProcessorError> {
        let parts: Vec<&str> = value.trim().split(':').collect();
        match parts.as_slice() {
            [prefix, local] if !prefix.is_empty() && !local.is_empty() => Ok(Self {
                prefix: prefix.to_string(),
                local: local.to_string(),
            }),
            _ => Err(ProcessorError::InvalidQualifiedName(value.to_string())),
        }
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.prefix, self.local)
    }
}

/// The subject currently being populated while walking the mapping tree.
///
/// Top-level mapping content runs with no subject; `resource` and `bnode`
/// are the only tags that create a new context.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResourceContext {
    pub subject: Option<SubjectHandle>,
    pub has_identifier: bool,
}

impl ResourceContext {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn for_subject(subject: SubjectHandle, has_identifier: bool) -> Self {
        Self {
            subject: Some(subject),
            has_identifier,
        }
    }

    pub fn require_subject(&self, tag: &str) -> Result<SubjectHandle, ProcessorError> {
        self.subject
            .ok_or_else(|| ProcessorError::NoSubject(tag.to_string()))
    }
}
