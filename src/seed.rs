//! Demo dataset.
//!
//! Fills an empty database with one emergency encounter and the two
//! stock templates so the form has something to show. Record counts
//! deliberately exceed the truncation caps so the bounded prompt is
//! visible end to end. Seeding is idempotent: existing data is left
//! alone.

use rusqlite::Connection;

use crate::db::{self, DatabaseError};
use crate::models::{LabResult, NursingNote, PromptTemplate, VitalSigns};

const DEMO_PATIENT: &str = "0002452972";

const PROGRESS_TEMPLATE: &str = "You are an experienced emergency-department physician. Based \
on the nursing notes, vital signs and lab results provided, write a factual progress summary \
of this patient's emergency course. State only what the records support, flag abnormal values \
explicitly, and note trends over time.";

const HANDOFF_TEMPLATE: &str = "You are a senior emergency nurse preparing a shift handoff. \
Based on the records provided, write a concise handoff note: current status, interventions \
given, pending results, and what the next shift must watch.";

/// Seed the database with the demo encounter and stock templates.
/// Returns the number of records inserted (0 when already seeded).
pub fn seed_demo_data(conn: &Connection) -> Result<usize, DatabaseError> {
    ensure_template(conn, "progress_summary", PROGRESS_TEMPLATE, "full course summary")?;
    ensure_template(conn, "handoff_note", HANDOFF_TEMPLATE, "shift handoff")?;

    let existing = db::fetch_patient_records(conn, DEMO_PATIENT, None, None)?;
    if !existing.is_empty() {
        tracing::info!(patient = DEMO_PATIENT, "demo data already present, skipping");
        return Ok(0);
    }

    let mut inserted = 0;

    for note in demo_nursing_notes() {
        db::insert_nursing_note(conn, DEMO_PATIENT, &note)?;
        inserted += 1;
    }
    for vs in demo_vital_signs() {
        db::insert_vital_signs(conn, DEMO_PATIENT, &vs)?;
        inserted += 1;
    }
    for lab in demo_lab_results() {
        db::insert_lab_result(conn, DEMO_PATIENT, &lab)?;
        inserted += 1;
    }

    tracing::info!(patient = DEMO_PATIENT, inserted, "demo data seeded");
    Ok(inserted)
}

fn ensure_template(
    conn: &Connection,
    name: &str,
    content: &str,
    description: &str,
) -> Result<(), DatabaseError> {
    let template = PromptTemplate {
        name: name.into(),
        content: content.into(),
        description: Some(description.into()),
    };
    match db::create_template(conn, &template) {
        Ok(()) | Err(DatabaseError::AlreadyExists { .. }) => Ok(()),
        Err(e) => Err(e),
    }
}

/// Timestamp within the demo encounter: 2025-11-15, minutes after 15:00.
fn ts(minutes: usize) -> String {
    format!("20251115{:02}{:02}00", 15 + minutes / 60, minutes % 60)
}

fn demo_nursing_notes() -> Vec<NursingNote> {
    let entries = [
        ("Triage", "Fever and productive cough for 3 days, tachypneic on arrival"),
        ("Assessment", "Alert, oriented, skin warm and flushed"),
        ("Intervention", "IV line established, blood cultures drawn"),
        ("Medication", "Acetaminophen 500mg PO given"),
        ("Observation", "Patient resting, oxygen via nasal cannula 2L"),
        ("Medication", "Ceftriaxone 2g IV started"),
        ("Observation", "Diaphoretic, temperature rechecked"),
        ("Assessment", "Breath sounds coarse at right base"),
        ("Intervention", "Sputum sample collected"),
        ("Observation", "Tolerating oral fluids"),
    ];
    // Cycle through the entry set to exceed the 25-record cap.
    (0..30)
        .map(|i| {
            let (subject, diagnosis) = entries[i % entries.len()];
            NursingNote {
                recorded_at: ts(i * 9),
                subject: Some(subject.into()),
                diagnosis: Some(diagnosis.into()),
            }
        })
        .collect()
}

fn demo_vital_signs() -> Vec<VitalSigns> {
    (0..28)
        .map(|i| {
            let f = i as f64;
            VitalSigns {
                recorded_at: ts(i * 10),
                // Fever trending down over the encounter
                temperature: Some(39.1 - f * 0.05),
                pulse: Some(108.0 - f),
                respiration: Some(24.0 - f * 0.2),
                systolic: Some(118.0 + (f % 5.0)),
                diastolic: Some(74.0 + (f % 4.0)),
                spo2: Some(93.0 + (f * 0.15).min(5.0)),
                gcs_eye: Some(4),
                gcs_verbal: Some(5),
                gcs_motor: Some(6),
            }
        })
        .collect()
}

fn demo_lab_results() -> Vec<LabResult> {
    let panel = [
        ("WBC", "15.2", "10^3/uL", "3.5", "11.0"),
        ("RBC", "4.2", "10^6/uL", "4.0", "5.5"),
        ("Hb", "12.0", "g/dL", "12.0", "16.0"),
        ("CRP", "8.6", "mg/dL", "0.0", "0.5"),
        ("Glucose", "132", "mg/dL", "70", "100"),
        ("Na", "136", "mmol/L", "135", "145"),
        ("K", "3.9", "mmol/L", "3.5", "5.1"),
        ("Creatinine", "0.9", "mg/dL", "0.6", "1.2"),
        ("Lactate", "2.4", "mmol/L", "0.5", "2.2"),
    ];
    (0..45)
        .map(|i| {
            let (item, value, unit, low, high) = panel[i % panel.len()];
            LabResult {
                recorded_at: ts(i * 6),
                item_name: Some(item.into()),
                value: Some(value.into()),
                unit: Some(unit.into()),
                ref_low: Some(low.into()),
                ref_high: Some(high.into()),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;

    #[test]
    fn seed_populates_all_categories_beyond_caps() {
        let conn = open_memory_database().unwrap();
        let inserted = seed_demo_data(&conn).unwrap();
        assert_eq!(inserted, 30 + 28 + 45);

        let set = db::fetch_patient_records(&conn, DEMO_PATIENT, None, None).unwrap();
        assert!(set.nursing.len() > crate::summary::NURSING_CAP);
        assert!(set.vitals.len() > crate::summary::VITALS_CAP);
        assert!(set.labs.len() > crate::summary::LABS_CAP);
    }

    #[test]
    fn seed_is_idempotent() {
        let conn = open_memory_database().unwrap();
        seed_demo_data(&conn).unwrap();
        let second = seed_demo_data(&conn).unwrap();
        assert_eq!(second, 0);

        let set = db::fetch_patient_records(&conn, DEMO_PATIENT, None, None).unwrap();
        assert_eq!(set.nursing.len(), 30);
    }

    #[test]
    fn seed_creates_both_templates() {
        let conn = open_memory_database().unwrap();
        seed_demo_data(&conn).unwrap();
        let templates = db::load_templates(&conn).unwrap();
        assert!(templates.get("progress_summary").is_some());
        assert!(templates.get("handoff_note").is_some());
    }

    #[test]
    fn demo_timestamps_are_valid_and_ascending() {
        let notes = demo_nursing_notes();
        for pair in notes.windows(2) {
            assert!(pair[0].recorded_at < pair[1].recorded_at);
            assert_eq!(pair[0].recorded_at.len(), 14);
        }
    }
}
