//! Feedback log storage.

use rusqlite::{params, Connection};

use crate::db::DatabaseError;
use crate::models::SummaryFeedback;

/// Store one feedback entry. Returns the row id.
pub fn insert_feedback(conn: &Connection, fb: &SummaryFeedback) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO feedback_log (patient_id, template_name, rating, comment, generated_summary)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            fb.patient_id,
            fb.template_name,
            fb.rating,
            fb.comment,
            fb.generated_summary,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Number of feedback entries stored.
pub fn count_feedback(conn: &Connection) -> Result<i64, DatabaseError> {
    let count = conn.query_row("SELECT COUNT(*) FROM feedback_log", [], |row| row.get(0))?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;

    #[test]
    fn insert_and_count() {
        let conn = open_memory_database().unwrap();
        let fb = SummaryFeedback {
            patient_id: "P001".into(),
            template_name: "progress_summary".into(),
            rating: 4,
            comment: Some("BP values were off".into()),
            generated_summary: "Patient improving.".into(),
        };
        let id = insert_feedback(&conn, &fb).unwrap();
        assert!(id > 0);
        assert_eq!(count_feedback(&conn).unwrap(), 1);
    }

    #[test]
    fn comment_is_optional() {
        let conn = open_memory_database().unwrap();
        let fb = SummaryFeedback {
            patient_id: "P001".into(),
            template_name: "handoff_note".into(),
            rating: 5,
            comment: None,
            generated_summary: "Stable overnight.".into(),
        };
        insert_feedback(&conn, &fb).unwrap();
        assert_eq!(count_feedback(&conn).unwrap(), 1);
    }
}
