//! [Validator] implementations.

mod signed;

pub use signed::*;

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::collaborators::Validator;
use crate::error::ValidationError;

#[derive(Debug, Default, Clone)]
/// Routes `/namespace/rest` keys to the validator registered for `namespace`.
///
/// Keys without a namespace, or with one nobody registered, fail validation.
pub struct NamespacedValidator {
    validators: BTreeMap<String, Arc<dyn Validator>>,
}

impl NamespacedValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, namespace: impl Into<String>, validator: Arc<dyn Validator>) -> Self {
        self.insert(namespace, validator);
        self
    }

    /// Returns the validator previously registered for `namespace`, if any.
    pub fn insert(
        &mut self,
        namespace: impl Into<String>,
        validator: Arc<dyn Validator>,
    ) -> Option<Arc<dyn Validator>> {
        self.validators.insert(namespace.into(), validator)
    }

    fn validator_for(&self, key: &[u8]) -> Result<&Arc<dyn Validator>, ValidationError> {
        let namespace = split_namespace(key).ok_or(ValidationError::InvalidKey)?;
        let namespace = std::str::from_utf8(namespace).map_err(|_| ValidationError::InvalidKey)?;

        self.validators
            .get(namespace)
            .ok_or_else(|| ValidationError::UnknownNamespace(namespace.to_string()))
    }
}

/// The `namespace` part of `/namespace/rest`.
pub fn split_namespace(key: &[u8]) -> Option<&[u8]> {
    let rest = key.strip_prefix(b"/")?;
    let end = rest.iter().position(|b| *b == b'/')?;

    if end == 0 {
        return None;
    }

    Some(&rest[..end])
}

impl Validator for NamespacedValidator {
    fn validate(&self, key: &[u8], value: &[u8]) -> Result<(), ValidationError> {
        self.validator_for(key)?.validate(key, value)
    }

    fn select(&self, key: &[u8], values: &[&[u8]]) -> Result<usize, ValidationError> {
        self.validator_for(key)?.select(key, values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct FirstWins;

    impl Validator for FirstWins {
        fn validate(&self, _key: &[u8], _value: &[u8]) -> Result<(), ValidationError> {
            Ok(())
        }

        fn select(&self, _key: &[u8], _values: &[&[u8]]) -> Result<usize, ValidationError> {
            Ok(0)
        }
    }

    #[test]
    fn namespaces() {
        assert_eq!(split_namespace(b"/v/key"), Some(&b"v"[..]));
        assert_eq!(split_namespace(b"/v/"), Some(&b"v"[..]));
        assert_eq!(split_namespace(b"v/key"), None);
        assert_eq!(split_namespace(b"//key"), None);
        assert_eq!(split_namespace(b"/nokey"), None);
    }

    #[test]
    fn routes_by_namespace() {
        let validator = NamespacedValidator::new().with("v", Arc::new(FirstWins));

        assert!(validator.validate(b"/v/key", b"anything").is_ok());
        assert_eq!(validator.select(b"/v/key", &[&b"a"[..], &b"b"[..]]).unwrap(), 0);

        assert!(matches!(
            validator.validate(b"/pk/key", b"anything"),
            Err(ValidationError::UnknownNamespace(ns)) if ns == "pk"
        ));
        assert!(matches!(
            validator.validate(b"key", b"anything"),
            Err(ValidationError::InvalidKey)
        ));
    }
}
