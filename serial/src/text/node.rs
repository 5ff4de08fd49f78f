//! Element tree behind the text format.

use serde::{Deserialize, Serialize};

use crate::error::{ArchiveError, ArchiveResult};

/// One element of a text document: a name, attributes, optional text
/// content and child elements. Attribute order is preserved.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TextNode {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<(String, String)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TextNode>,
}

impl TextNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Set an attribute, replacing an existing one of the same name.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(key, _)| *key == name) {
            Some((_, existing)) => *existing = value,
            None => self.attributes.push((name, value)),
        }
    }

    /// First child with the given name.
    pub fn child(&self, name: &str) -> Option<&TextNode> {
        self.children.iter().find(|child| child.name == name)
    }

    /// Render the tree as pretty RON.
    pub fn encode(&self) -> ArchiveResult<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ArchiveError::Document(e.to_string()))
    }

    pub fn decode(text: &str) -> ArchiveResult<Self> {
        ron::from_str(text).map_err(|e| ArchiveError::Document(e.to_string()))
    }
}
