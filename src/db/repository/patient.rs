//! Patient record queries.
//!
//! Pulls the three clinical categories for one patient, optionally bounded
//! by an inclusive time range given as raw 14-digit `YYYYMMDDHHMMSS`
//! strings (the upstream format; string comparison equals time comparison).
//! Rows come back ordered by `recorded_at` ascending — the order the
//! renderer and truncator rely on.

use rusqlite::{params, params_from_iter, Connection};

use crate::db::DatabaseError;
use crate::models::{LabResult, NursingNote, PatientOverview, PatientRecordSet, VitalSigns};

/// Maximum patients listed on the picker dashboard.
const OVERVIEW_LIMIT: usize = 50;

/// Fetch all records for a patient, grouped by category. Bounds are
/// inclusive; `None` means unfiltered on that side. A patient with no
/// rows yields an empty set, not an error.
pub fn fetch_patient_records(
    conn: &Connection,
    patient_id: &str,
    start: Option<&str>,
    end: Option<&str>,
) -> Result<PatientRecordSet, DatabaseError> {
    Ok(PatientRecordSet {
        nursing: fetch_nursing_notes(conn, patient_id, start, end)?,
        vitals: fetch_vital_signs(conn, patient_id, start, end)?,
        labs: fetch_lab_results(conn, patient_id, start, end)?,
    })
}

/// Append optional inclusive time bounds to a query.
fn time_filter(sql: &mut String, params: &mut Vec<String>, start: Option<&str>, end: Option<&str>) {
    if let Some(start) = start {
        sql.push_str(&format!(" AND recorded_at >= ?{}", params.len() + 1));
        params.push(start.to_string());
    }
    if let Some(end) = end {
        sql.push_str(&format!(" AND recorded_at <= ?{}", params.len() + 1));
        params.push(end.to_string());
    }
    sql.push_str(" ORDER BY recorded_at ASC");
}

fn fetch_nursing_notes(
    conn: &Connection,
    patient_id: &str,
    start: Option<&str>,
    end: Option<&str>,
) -> Result<Vec<NursingNote>, DatabaseError> {
    let mut sql =
        "SELECT recorded_at, subject, diagnosis FROM nursing_notes WHERE patient_id = ?1"
            .to_string();
    let mut bind = vec![patient_id.to_string()];
    time_filter(&mut sql, &mut bind, start, end);

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(bind), |row| {
        Ok(NursingNote {
            recorded_at: row.get(0)?,
            subject: row.get(1)?,
            diagnosis: row.get(2)?,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

fn fetch_vital_signs(
    conn: &Connection,
    patient_id: &str,
    start: Option<&str>,
    end: Option<&str>,
) -> Result<Vec<VitalSigns>, DatabaseError> {
    let mut sql = "SELECT recorded_at, temperature, pulse, respiration, systolic, diastolic, \
                   spo2, gcs_eye, gcs_verbal, gcs_motor \
                   FROM vital_signs WHERE patient_id = ?1"
        .to_string();
    let mut bind = vec![patient_id.to_string()];
    time_filter(&mut sql, &mut bind, start, end);

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(bind), |row| {
        Ok(VitalSigns {
            recorded_at: row.get(0)?,
            temperature: row.get(1)?,
            pulse: row.get(2)?,
            respiration: row.get(3)?,
            systolic: row.get(4)?,
            diastolic: row.get(5)?,
            spo2: row.get(6)?,
            gcs_eye: row.get(7)?,
            gcs_verbal: row.get(8)?,
            gcs_motor: row.get(9)?,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

fn fetch_lab_results(
    conn: &Connection,
    patient_id: &str,
    start: Option<&str>,
    end: Option<&str>,
) -> Result<Vec<LabResult>, DatabaseError> {
    let mut sql = "SELECT recorded_at, item_name, value, unit, ref_low, ref_high \
                   FROM lab_results WHERE patient_id = ?1"
        .to_string();
    let mut bind = vec![patient_id.to_string()];
    time_filter(&mut sql, &mut bind, start, end);

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(bind), |row| {
        Ok(LabResult {
            recorded_at: row.get(0)?,
            item_name: row.get(1)?,
            value: row.get(2)?,
            unit: row.get(3)?,
            ref_low: row.get(4)?,
            ref_high: row.get(5)?,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

/// List patients with their documentation span, newest activity first.
/// Nursing notes drive the overview since one note per encounter is the
/// norm upstream.
pub fn list_patient_overviews(conn: &Connection) -> Result<Vec<PatientOverview>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT patient_id, MIN(recorded_at), MAX(recorded_at), COUNT(*)
         FROM nursing_notes
         GROUP BY patient_id
         ORDER BY MIN(recorded_at) DESC
         LIMIT ?1",
    )?;
    let rows = stmt.query_map(params![OVERVIEW_LIMIT], |row| {
        Ok(PatientOverview {
            patient_id: row.get(0)?,
            first_recorded: row.get(1)?,
            last_recorded: row.get(2)?,
            record_count: row.get(3)?,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

/// Insert a nursing note (seed/ingestion path).
pub fn insert_nursing_note(
    conn: &Connection,
    patient_id: &str,
    note: &NursingNote,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO nursing_notes (patient_id, recorded_at, subject, diagnosis)
         VALUES (?1, ?2, ?3, ?4)",
        params![patient_id, note.recorded_at, note.subject, note.diagnosis],
    )?;
    Ok(())
}

/// Insert a vital-sign row (seed/ingestion path).
pub fn insert_vital_signs(
    conn: &Connection,
    patient_id: &str,
    vs: &VitalSigns,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO vital_signs (patient_id, recorded_at, temperature, pulse, respiration, \
         systolic, diastolic, spo2, gcs_eye, gcs_verbal, gcs_motor)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            patient_id,
            vs.recorded_at,
            vs.temperature,
            vs.pulse,
            vs.respiration,
            vs.systolic,
            vs.diastolic,
            vs.spo2,
            vs.gcs_eye,
            vs.gcs_verbal,
            vs.gcs_motor,
        ],
    )?;
    Ok(())
}

/// Insert a lab result (seed/ingestion path).
pub fn insert_lab_result(
    conn: &Connection,
    patient_id: &str,
    lab: &LabResult,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO lab_results (patient_id, recorded_at, item_name, value, unit, ref_low, ref_high)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            patient_id,
            lab.recorded_at,
            lab.item_name,
            lab.value,
            lab.unit,
            lab.ref_low,
            lab.ref_high,
        ],
    )?;
    Ok(())
}
