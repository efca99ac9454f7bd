//! Operator feedback on a generated summary.

use serde::{Deserialize, Serialize};

/// One feedback entry filed from the web form after reading a summary.
/// The summary text is stored alongside so the rating stays interpretable
/// after the template is edited.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryFeedback {
    pub patient_id: String,
    pub template_name: String,
    /// 1 (worst) to 5 (best).
    pub rating: i64,
    pub comment: Option<String>,
    pub generated_summary: String,
}
