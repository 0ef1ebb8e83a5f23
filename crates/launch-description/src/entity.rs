//! A named action with text attributes

use crate::{DescriptionError, Result};
use serde_yaml::Value;
use std::collections::BTreeMap;

/// One declarative action: a kind plus named text attributes
///
/// Attributes are consumed as they are read. Whatever is left when
/// [`Entity::finish`] is called was not recognized by the action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    kind: String,
    attrs: BTreeMap<String, String>,
}

impl Entity {
    /// An entity with no attributes
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            attrs: BTreeMap::new(),
        }
    }

    /// Add an attribute
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    /// Build from a YAML mapping; every value must be a scalar
    pub fn from_yaml(kind: impl Into<String>, attrs: BTreeMap<String, Value>) -> Result<Self> {
        let kind = kind.into();
        let mut entity = Self::new(kind.clone());
        for (name, value) in attrs {
            let text = scalar_text(&value).ok_or_else(|| DescriptionError::InvalidAttribute {
                action: kind.clone(),
                attribute: name.clone(),
                reason: "expected a string, number or boolean".to_string(),
            })?;
            entity.attrs.insert(name, text);
        }
        Ok(entity)
    }

    /// Action kind
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Remove and return an optional attribute
    pub fn take_attr(&mut self, name: &str) -> Option<String> {
        self.attrs.remove(name)
    }

    /// Remove and return a required attribute
    pub fn require_attr(&mut self, name: &str) -> Result<String> {
        self.take_attr(name)
            .ok_or_else(|| DescriptionError::MissingAttribute {
                action: self.kind.clone(),
                attribute: name.to_string(),
            })
    }

    /// Fail if any attribute was left unread
    pub fn finish(self) -> Result<()> {
        match self.attrs.into_keys().next() {
            Some(attribute) => Err(DescriptionError::UnknownAttribute {
                action: self.kind,
                attribute,
            }),
            None => Ok(()),
        }
    }
}

/// Text of a YAML scalar
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_and_optional_attributes() {
        let mut entity = Entity::new("docker_run_remote_ssh").with_attr("user", "alice");
        assert_eq!(entity.require_attr("user").unwrap(), "alice");
        assert_eq!(entity.take_attr("port"), None);

        let err = entity.require_attr("machine").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Action 'docker_run_remote_ssh' is missing required attribute 'machine'"
        );
    }

    #[test]
    fn test_finish_reports_leftovers() {
        let entity = Entity::new("docker_run_remote_ssh").with_attr("colour", "blue");
        assert!(matches!(
            entity.finish(),
            Err(DescriptionError::UnknownAttribute { ref attribute, .. }) if attribute == "colour"
        ));
    }

    #[test]
    fn test_from_yaml_converts_scalars() {
        let attrs: BTreeMap<String, Value> =
            serde_yaml::from_str("port: 2222\nuser: alice\nflag: true").unwrap();
        let mut entity = Entity::from_yaml("a", attrs).unwrap();
        assert_eq!(entity.take_attr("port").as_deref(), Some("2222"));
        assert_eq!(entity.take_attr("flag").as_deref(), Some("true"));
    }

    #[test]
    fn test_from_yaml_rejects_nested_values() {
        let attrs: BTreeMap<String, Value> = serde_yaml::from_str("cmd: [echo, hi]").unwrap();
        assert!(matches!(
            Entity::from_yaml("a", attrs),
            Err(DescriptionError::InvalidAttribute { .. })
        ));
    }
}
