//! Prompt composition — builds the instruction string sent as the
//! system half of the completion request.
//!
//! Composition order is fixed: base text, then the focus directive, then
//! the style directive, each separated by a blank line. The style
//! directive is always present; the focus block only when areas were
//! selected.

use serde::{Deserialize, Serialize};

use crate::models::TemplateSet;

/// Fallback instruction used when the selected template cannot be
/// resolved and no override was supplied.
pub const DEFAULT_INSTRUCTION: &str = "You are an experienced emergency-department clinician. \
Write a clear, factual progress summary of the patient data provided, in the language the \
records are written in. State only what the records support.";

const FOCUS_HEADER: &str = "[Priority focus areas]";

const BULLETED_SUFFIX: &str = "Format the summary as concise bullet points grouped by \
clinical category (course, vital-sign trends, notable labs).";

const NARRATIVE_SUFFIX: &str = "Write the summary as flowing narrative prose in complete \
sentences, ordered chronologically.";

/// Requested output style. Maps to a short fixed directive appended
/// after the focus block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryStyle {
    #[default]
    Bulleted,
    Narrative,
}

impl SummaryStyle {
    pub fn directive(self) -> &'static str {
        match self {
            SummaryStyle::Bulleted => BULLETED_SUFFIX,
            SummaryStyle::Narrative => NARRATIVE_SUFFIX,
        }
    }
}

/// The composed instruction plus the warning flag for the caller.
#[derive(Debug, Clone)]
pub struct ComposedInstruction {
    pub text: String,
    /// True when the named template was missing and the built-in default
    /// was used instead. A warning for the UI, not an error.
    pub used_fallback: bool,
}

/// Build the final instruction string.
///
/// Base text resolution: a caller-supplied override wins; otherwise the
/// named template is looked up; if neither resolves, the built-in default
/// is used and `used_fallback` is set. Template content is accepted
/// verbatim — operators are trusted.
pub fn compose_instruction(
    templates: &TemplateSet,
    template_name: &str,
    custom_instruction: Option<&str>,
    focus_areas: &[String],
    style: SummaryStyle,
) -> ComposedInstruction {
    let mut used_fallback = false;
    let base = match custom_instruction {
        Some(text) => text,
        None => match templates.get(template_name) {
            Some(content) => content,
            None => {
                tracing::warn!(
                    template = %template_name,
                    "template not found, using default instruction"
                );
                used_fallback = true;
                DEFAULT_INSTRUCTION
            }
        },
    };

    let mut text = base.to_string();

    if !focus_areas.is_empty() {
        text.push_str("\n\n");
        text.push_str(&focus_block(focus_areas));
    }

    text.push_str("\n\n");
    text.push_str(style.directive());

    ComposedInstruction { text, used_fallback }
}

/// The delimited focus directive, listing the labels comma-separated in
/// input order.
fn focus_block(focus_areas: &[String]) -> String {
    format!(
        "{FOCUS_HEADER}\nAnalyze the following areas in particular detail and present them \
first in the summary: {}",
        focus_areas.join(", ")
    )
}
