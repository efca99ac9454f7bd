//! Section rendering — turns bounded record lists into the data block
//! sent as the user half of the completion request.
//!
//! The layout is fixed: a one-line patient header, then the three
//! category sections in a fixed order (nursing, vitals, labs) separated
//! by blank lines. Each section header carries the post-truncation count,
//! and each record renders as a single line with a fixed field order.
//! Missing fields render as empty strings; rendering is pure and never
//! fails.

use crate::models::{LabResult, NursingNote, VitalSigns};

use super::truncate::BoundedRecords;

/// Render the full data block for one patient.
pub fn render_data_block(patient_id: &str, bounded: &BoundedRecords<'_>) -> String {
    let mut block = format!(
        "=== Patient {patient_id} — emergency course data (partial extract) ===\n\n"
    );

    block.push_str(&format!("[Nursing notes] (latest {})\n", bounded.nursing.len()));
    for note in bounded.nursing {
        block.push_str(&render_nursing_line(note));
    }

    block.push_str(&format!("\n[Vital signs] (latest {})\n", bounded.vitals.len()));
    for vs in bounded.vitals {
        block.push_str(&render_vitals_line(vs));
    }

    block.push_str(&format!("\n[Lab results] (latest {})\n", bounded.labs.len()));
    for lab in bounded.labs {
        block.push_str(&render_lab_line(lab));
    }

    block
}

fn render_nursing_line(note: &NursingNote) -> String {
    format!(
        "- {} | {} | {}\n",
        format_timestamp(&note.recorded_at),
        note.subject.as_deref().unwrap_or(""),
        note.diagnosis.as_deref().unwrap_or(""),
    )
}

fn render_vitals_line(vs: &VitalSigns) -> String {
    format!(
        "- {} | T:{} | P:{} | R:{} | BP:{}/{} | SpO2:{} | GCS:{}\n",
        format_timestamp(&vs.recorded_at),
        fmt_num(vs.temperature),
        fmt_num(vs.pulse),
        fmt_num(vs.respiration),
        fmt_num(vs.systolic),
        fmt_num(vs.diastolic),
        fmt_num(vs.spo2),
        vs.gcs_notation(),
    )
}

fn render_lab_line(lab: &LabResult) -> String {
    format!(
        "- {} | {} : {} {} (Ref: {}~{})\n",
        format_timestamp(&lab.recorded_at),
        lab.item_name.as_deref().unwrap_or(""),
        lab.value.as_deref().unwrap_or(""),
        lab.unit.as_deref().unwrap_or(""),
        lab.ref_low.as_deref().unwrap_or(""),
        lab.ref_high.as_deref().unwrap_or(""),
    )
}

fn fmt_num(value: Option<f64>) -> String {
    value.map(|v| trim_trailing_zero(v)).unwrap_or_default()
}

/// Whole numbers render without the `.0` suffix so vitals read like
/// chart entries (`P:88`, not `P:88.0`).
fn trim_trailing_zero(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

/// Display a raw 14-digit `YYYYMMDDHHMMSS` timestamp as
/// `YYYY-MM-DD HH:MM`. Malformed values pass through unchanged rather
/// than erroring.
pub fn format_timestamp(raw: &str) -> String {
    match chrono::NaiveDateTime::parse_from_str(raw, "%Y%m%d%H%M%S") {
        Ok(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        Err(_) => raw.to_string(),
    }
}
