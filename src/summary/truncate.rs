//! Record truncation.
//!
//! Each category is bounded to its most recent N entries before rendering
//! so the eventual request stays inside the model's context budget. The
//! input lists arrive oldest-first, so "most recent" is the suffix; order
//! within the kept suffix is preserved.

use crate::models::PatientRecordSet;

/// Per-category caps, sized for the downstream model's context window.
pub const NURSING_CAP: usize = 25;
pub const VITALS_CAP: usize = 25;
pub const LABS_CAP: usize = 40;

/// A record set bounded by the per-category caps. Borrows from the
/// original set; truncation never copies records.
#[derive(Debug)]
pub struct BoundedRecords<'a> {
    pub nursing: &'a [crate::models::NursingNote],
    pub vitals: &'a [crate::models::VitalSigns],
    pub labs: &'a [crate::models::LabResult],
}

/// Keep the suffix of length `min(len, cap)`, preserving order.
pub fn truncate_to_cap<T>(records: &[T], cap: usize) -> &[T] {
    let skip = records.len().saturating_sub(cap);
    &records[skip..]
}

/// Apply all three category caps to a record set.
pub fn bound_records(set: &PatientRecordSet) -> BoundedRecords<'_> {
    BoundedRecords {
        nursing: truncate_to_cap(&set.nursing, NURSING_CAP),
        vitals: truncate_to_cap(&set.vitals, VITALS_CAP),
        labs: truncate_to_cap(&set.labs, LABS_CAP),
    }
}
