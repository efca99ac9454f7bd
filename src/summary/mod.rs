//! The summary pipeline: truncate → render → compose → request.
//!
//! Each invocation is stateless and independent: the caller resolves the
//! template set and record set up front and passes them in, the pipeline
//! builds one prompt and makes one blocking call. Endpoint failures come
//! back as data (`CompletionResult::Failure`), never as panics or errors
//! that could take down the host.

pub mod client;
pub mod compose;
pub mod render;
pub mod truncate;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{PatientRecordSet, TemplateSet};

pub use client::{ChatCompletionClient, CompletionBackend, CompletionError};
pub use compose::{compose_instruction, ComposedInstruction, SummaryStyle, DEFAULT_INSTRUCTION};
pub use render::render_data_block;
pub use truncate::{bound_records, truncate_to_cap, LABS_CAP, NURSING_CAP, VITALS_CAP};

#[derive(Error, Debug)]
pub enum SummaryError {
    /// No records in any category for this patient/time range. Surfaced
    /// to the caller as an empty-result condition, not a crash.
    #[error("No records found for patient '{patient_id}' in the selected range")]
    NoRecords { patient_id: String },
}

/// Outcome of the external completion call, carried as data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CompletionResult {
    Success { summary: String },
    Failure { diagnostic: String },
}

impl CompletionResult {
    pub fn is_success(&self) -> bool {
        matches!(self, CompletionResult::Success { .. })
    }
}

/// One summary request, fully resolved by the caller.
#[derive(Debug)]
pub struct SummaryJob<'a> {
    pub patient_id: &'a str,
    pub records: &'a PatientRecordSet,
    pub template_name: &'a str,
    /// Operator-edited instruction; wins over the named template.
    pub custom_instruction: Option<&'a str>,
    /// Focus-area labels in the order the operator picked them.
    pub focus_areas: &'a [String],
    pub style: SummaryStyle,
}

/// Per-category counts after truncation, as rendered into the prompt.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RenderedCounts {
    pub nursing: usize,
    pub vitals: usize,
    pub labs: usize,
}

/// What the caller gets back: the completion result plus the metadata
/// the UI displays alongside it.
#[derive(Debug)]
pub struct SummaryOutcome {
    pub result: CompletionResult,
    /// The named template was missing and the default instruction was
    /// used — a warning, not a failure.
    pub used_fallback_template: bool,
    pub counts: RenderedCounts,
}

/// Run the whole pipeline for one request.
pub fn generate_summary(
    job: &SummaryJob<'_>,
    templates: &TemplateSet,
    backend: &dyn CompletionBackend,
) -> Result<SummaryOutcome, SummaryError> {
    if job.records.is_empty() {
        return Err(SummaryError::NoRecords {
            patient_id: job.patient_id.to_string(),
        });
    }

    let bounded = bound_records(job.records);
    let counts = RenderedCounts {
        nursing: bounded.nursing.len(),
        vitals: bounded.vitals.len(),
        labs: bounded.labs.len(),
    };

    let data_block = render_data_block(job.patient_id, &bounded);
    let instruction = compose_instruction(
        templates,
        job.template_name,
        job.custom_instruction,
        job.focus_areas,
        job.style,
    );

    tracing::debug!(
        patient = %job.patient_id,
        nursing = counts.nursing,
        vitals = counts.vitals,
        labs = counts.labs,
        fallback = instruction.used_fallback,
        "dispatching summary request"
    );

    let result = match backend.complete(&instruction.text, &data_block) {
        Ok(summary) => CompletionResult::Success { summary },
        Err(e) => {
            tracing::warn!(error = %e, "completion request failed");
            CompletionResult::Failure {
                diagnostic: e.to_string(),
            }
        }
    };

    Ok(SummaryOutcome {
        result,
        used_fallback_template: instruction.used_fallback,
        counts,
    })
}

#[cfg(test)]
mod tests {
    use super::client::MockCompletionClient;
    use super::*;
    use crate::models::{NursingNote, PromptTemplate};

    fn records_with_notes(n: usize) -> PatientRecordSet {
        PatientRecordSet {
            nursing: (0..n)
                .map(|i| NursingNote {
                    recorded_at: format!("202511151{i:02}000"),
                    subject: Some(format!("note {i}")),
                    diagnosis: None,
                })
                .collect(),
            ..Default::default()
        }
    }

    fn templates() -> TemplateSet {
        TemplateSet::new(vec![PromptTemplate {
            name: "progress_summary".into(),
            content: "Summarize the ER course.".into(),
            description: None,
        }])
    }

    fn job<'a>(records: &'a PatientRecordSet) -> SummaryJob<'a> {
        SummaryJob {
            patient_id: "P001",
            records,
            template_name: "progress_summary",
            custom_instruction: None,
            focus_areas: &[],
            style: SummaryStyle::Bulleted,
        }
    }

    #[test]
    fn empty_record_set_is_a_missing_data_error() {
        let records = PatientRecordSet::default();
        let backend = MockCompletionClient::replying("unused");
        let result = generate_summary(&job(&records), &templates(), &backend);
        assert!(matches!(result, Err(SummaryError::NoRecords { .. })));
        // No call was made
        assert!(backend.last_user_prompt().is_none());
    }

    #[test]
    fn success_path_returns_trimmed_summary() {
        let records = records_with_notes(3);
        let backend = MockCompletionClient::replying("  Patient stable.  ");
        let outcome = generate_summary(&job(&records), &templates(), &backend).unwrap();

        match outcome.result {
            CompletionResult::Success { summary } => assert_eq!(summary, "Patient stable."),
            CompletionResult::Failure { diagnostic } => panic!("unexpected failure: {diagnostic}"),
        }
        assert!(!outcome.used_fallback_template);
        assert_eq!(outcome.counts.nursing, 3);
    }

    #[test]
    fn transport_failure_becomes_failure_result_with_diagnostic() {
        let records = records_with_notes(1);
        let backend = MockCompletionClient::failing("connection refused by proxy");
        let outcome = generate_summary(&job(&records), &templates(), &backend).unwrap();

        match outcome.result {
            CompletionResult::Failure { diagnostic } => {
                assert!(diagnostic.contains("connection refused by proxy"));
            }
            CompletionResult::Success { .. } => panic!("expected failure"),
        }
    }

    #[test]
    fn thirty_notes_truncate_to_twenty_five_in_the_prompt() {
        let records = records_with_notes(30);
        let backend = MockCompletionClient::replying("ok");
        let outcome = generate_summary(&job(&records), &templates(), &backend).unwrap();

        assert_eq!(outcome.counts.nursing, 25);
        let prompt = backend.last_user_prompt().unwrap();
        assert!(prompt.contains("[Nursing notes] (latest 25)"));
        assert!(!prompt.contains("note 4"));
        assert!(prompt.contains("note 29"));
    }

    #[test]
    fn unknown_template_sets_fallback_warning() {
        let records = records_with_notes(1);
        let backend = MockCompletionClient::replying("ok");
        let mut j = job(&records);
        j.template_name = "missing_template";
        let outcome = generate_summary(&j, &templates(), &backend).unwrap();

        assert!(outcome.used_fallback_template);
        let system = backend.last_system_prompt().unwrap();
        assert!(system.starts_with(DEFAULT_INSTRUCTION));
    }

    #[test]
    fn instruction_and_data_take_separate_roles() {
        let records = records_with_notes(2);
        let backend = MockCompletionClient::replying("ok");
        let focus = vec!["vital-sign trend".to_string()];
        let j = SummaryJob {
            focus_areas: &focus,
            ..job(&records)
        };
        generate_summary(&j, &templates(), &backend).unwrap();

        let system = backend.last_system_prompt().unwrap();
        let user = backend.last_user_prompt().unwrap();
        assert!(system.contains("vital-sign trend"));
        assert!(!system.contains("=== Patient"));
        assert!(user.starts_with("=== Patient P001"));
        assert!(!user.contains("vital-sign trend"));
    }
}
