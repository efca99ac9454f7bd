//! Prompt templates — named, operator-editable instruction texts.

use serde::{Deserialize, Serialize};

/// A stored prompt template. Identity is the name; the content is
/// whatever the operator last saved (no versioning, last write wins).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptTemplate {
    pub name: String,
    pub content: String,
    pub description: Option<String>,
}

/// Templates resolved for one request, preserving store order.
///
/// The composer takes this by reference; it is loaded fresh per request
/// and never cached, so concurrent edits by other operators simply take
/// effect on the next load (last write wins).
#[derive(Debug, Clone, Default)]
pub struct TemplateSet {
    templates: Vec<PromptTemplate>,
}

impl TemplateSet {
    pub fn new(templates: Vec<PromptTemplate>) -> Self {
        Self { templates }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.templates
            .iter()
            .find(|t| t.name == name)
            .map(|t| t.content.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PromptTemplate> {
        self.templates.iter()
    }
}
