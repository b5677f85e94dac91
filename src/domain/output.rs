//! Output values as written by clients and as returned to readers

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One output as supplied on stack creation or replacement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSpec {
    /// Logical value; any JSON document
    pub value: serde_json::Value,
    #[serde(default)]
    pub deprecated: Option<String>,
    #[serde(default)]
    pub warning: Option<String>,
    #[serde(default)]
    pub sensitive: bool,
}

impl OutputSpec {
    pub fn plain(value: impl Into<serde_json::Value>) -> Self {
        Self { value: value.into(), deprecated: None, warning: None, sensitive: false }
    }

    pub fn sensitive(value: impl Into<serde_json::Value>) -> Self {
        Self { sensitive: true, ..Self::plain(value) }
    }

    pub fn deprecated(mut self, note: impl Into<String>) -> Self {
        self.deprecated = Some(note.into());
        self
    }

    pub fn warning(mut self, note: impl Into<String>) -> Self {
        self.warning = Some(note.into());
        self
    }
}

/// Output batch keyed by output key; keys are unique by construction
pub type OutputSpecs = BTreeMap<String, OutputSpec>;

/// One output as returned to a reader, with the value decoded.
///
/// Annotations that were never set (or set to an empty string) render as
/// `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputView {
    pub value: serde_json::Value,
    pub deprecated: Option<String>,
    pub warning: Option<String>,
    pub sensitive: bool,
}

/// Decoded outputs of a stack keyed by output key
pub type OutputMap = BTreeMap<String, OutputView>;

/// Collapse an empty annotation to "absent"
pub(crate) fn non_empty(note: Option<String>) -> Option<String> {
    note.filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_spec_defaults() {
        let spec: OutputSpec = serde_json::from_value(json!({"value": "https://hello.example"})).unwrap();
        assert_eq!(spec, OutputSpec::plain("https://hello.example"));
    }

    #[test]
    fn test_spec_requires_value() {
        assert!(serde_json::from_value::<OutputSpec>(json!({"sensitive": true})).is_err());
    }

    #[test]
    fn test_view_renders_absent_annotations_as_null() {
        let view = OutputView {
            value: json!(42),
            deprecated: None,
            warning: Some("rotating soon".to_string()),
            sensitive: false,
        };
        assert_eq!(
            serde_json::to_value(&view).unwrap(),
            json!({"value": 42, "deprecated": null, "warning": "rotating soon", "sensitive": false})
        );
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(Some(String::new())), None);
        assert_eq!(non_empty(Some("x".to_string())), Some("x".to_string()));
        assert_eq!(non_empty(None), None);
    }
}
