use std::collections::HashMap;

use uuid::Uuid;

use crate::ProcessorError;

/// Named opaque identifiers, stable until explicitly regenerated.
#[derive(Debug, Default)]
pub struct UniqueIdentifierRegistry {
    identifiers: HashMap<String, String>,
}

impl UniqueIdentifierRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the identifier if needed and assign it a fresh value.
    pub fn generate(&mut self, name: &str) -> &str {
        let value = Uuid::new_v4().simple().to_string();
        let slot = self.identifiers.entry(name.to_string()).or_default();
        *slot = value;
        slot.as_str()
    }

    pub fn value(&self, name: &str) -> Result<&str, ProcessorError> {
        self.identifiers
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| ProcessorError::UnknownUniqueIdentifier(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_is_stable_until_regenerated() {
        let mut ids = UniqueIdentifierRegistry::new();
        let first = ids.generate("row").to_string();
        assert_eq!(ids.value("row").unwrap(), first);

        let second = ids.generate("row").to_string();
        assert_ne!(first, second);
        assert_eq!(ids.value("row").unwrap(), second);
    }

    #[test]
    fn test_values_are_distinct_per_name() {
        let mut ids = UniqueIdentifierRegistry::new();
        let a = ids.generate("a").to_string();
        let b = ids.generate("b").to_string();
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_unknown_identifier() {
        let ids = UniqueIdentifierRegistry::new();
        assert!(matches!(
            ids.value("nope"),
            Err(ProcessorError::UnknownUniqueIdentifier(_))
        ));
    }
}
