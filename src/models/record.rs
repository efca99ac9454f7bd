//! Per-category clinical record structures.
//!
//! The upstream emergency-department tables are loosely typed; fields may
//! be NULL or absent. Each category gets a fixed struct with optional
//! fields, decoded defensively at the database boundary so the renderer
//! never has to guess at shapes.

use serde::{Deserialize, Serialize};

/// A nursing progress note.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NursingNote {
    /// Raw 14-digit `YYYYMMDDHHMMSS` timestamp as stored upstream.
    pub recorded_at: String,
    pub subject: Option<String>,
    pub diagnosis: Option<String>,
}

/// One vital-sign measurement row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VitalSigns {
    pub recorded_at: String,
    pub temperature: Option<f64>,
    pub pulse: Option<f64>,
    pub respiration: Option<f64>,
    pub systolic: Option<f64>,
    pub diastolic: Option<f64>,
    pub spo2: Option<f64>,
    pub gcs_eye: Option<i64>,
    pub gcs_verbal: Option<i64>,
    pub gcs_motor: Option<i64>,
}

impl VitalSigns {
    /// Combined Glasgow Coma Scale notation, e.g. `E4V5M6`.
    /// Empty when no component was recorded.
    pub fn gcs_notation(&self) -> String {
        match (self.gcs_eye, self.gcs_verbal, self.gcs_motor) {
            (None, None, None) => String::new(),
            (e, v, m) => format!(
                "E{}V{}M{}",
                e.map(|n| n.to_string()).unwrap_or_default(),
                v.map(|n| n.to_string()).unwrap_or_default(),
                m.map(|n| n.to_string()).unwrap_or_default(),
            ),
        }
    }
}

/// One lab report row. The reference range is kept as the upstream
/// low/high text pair and rendered as `low~high`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabResult {
    pub recorded_at: String,
    pub item_name: Option<String>,
    pub value: Option<String>,
    pub unit: Option<String>,
    pub ref_low: Option<String>,
    pub ref_high: Option<String>,
}

/// All records for one patient, grouped by category. Each list is
/// ordered by `recorded_at` ascending as produced by the queries.
/// A category with no rows is an empty vec, never an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatientRecordSet {
    pub nursing: Vec<NursingNote>,
    pub vitals: Vec<VitalSigns>,
    pub labs: Vec<LabResult>,
}

impl PatientRecordSet {
    pub fn is_empty(&self) -> bool {
        self.nursing.is_empty() && self.vitals.is_empty() && self.labs.is_empty()
    }

    pub fn total_records(&self) -> usize {
        self.nursing.len() + self.vitals.len() + self.labs.len()
    }
}

/// One row of the patient picker: who is in the database and when
/// their nursing documentation starts and ends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientOverview {
    pub patient_id: String,
    pub first_recorded: String,
    pub last_recorded: String,
    pub record_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_record_set_reports_empty() {
        let set = PatientRecordSet::default();
        assert!(set.is_empty());
        assert_eq!(set.total_records(), 0);
    }

    #[test]
    fn single_category_makes_set_non_empty() {
        let set = PatientRecordSet {
            labs: vec![LabResult {
                recorded_at: "20251115150000".into(),
                item_name: Some("WBC".into()),
                value: Some("15.2".into()),
                unit: Some("10^3/uL".into()),
                ref_low: Some("3.5".into()),
                ref_high: Some("11.0".into()),
            }],
            ..Default::default()
        };
        assert!(!set.is_empty());
        assert_eq!(set.total_records(), 1);
    }

    #[test]
    fn gcs_notation_full_and_empty() {
        let full = VitalSigns {
            recorded_at: "20251115150000".into(),
            temperature: None,
            pulse: None,
            respiration: None,
            systolic: None,
            diastolic: None,
            spo2: None,
            gcs_eye: Some(4),
            gcs_verbal: Some(5),
            gcs_motor: Some(6),
        };
        assert_eq!(full.gcs_notation(), "E4V5M6");

        let none = VitalSigns {
            gcs_eye: None,
            gcs_verbal: None,
            gcs_motor: None,
            ..full.clone()
        };
        assert_eq!(none.gcs_notation(), "");
    }

    #[test]
    fn gcs_notation_partial_components() {
        let partial = VitalSigns {
            recorded_at: "20251115150000".into(),
            temperature: None,
            pulse: None,
            respiration: None,
            systolic: None,
            diastolic: None,
            spo2: None,
            gcs_eye: Some(3),
            gcs_verbal: None,
            gcs_motor: Some(5),
        };
        assert_eq!(partial.gcs_notation(), "E3VM5");
    }
}
