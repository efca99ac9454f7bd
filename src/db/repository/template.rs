//! Prompt template storage.
//!
//! Templates are globally shared and operator-editable; there is no
//! versioning and no locking — whoever saves last wins. Callers load the
//! full set per request rather than caching, so edits made between
//! requests always take effect.

use rusqlite::{params, Connection, OptionalExtension};

use crate::db::DatabaseError;
use crate::models::{PromptTemplate, TemplateSet};

/// Load every template in store order.
pub fn load_templates(conn: &Connection) -> Result<TemplateSet, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT template_name, template_content, description
         FROM prompt_templates ORDER BY id ASC",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(PromptTemplate {
            name: row.get(0)?,
            content: row.get(1)?,
            description: row.get(2)?,
        })
    })?;
    let templates = rows.collect::<Result<Vec<_>, _>>()?;
    Ok(TemplateSet::new(templates))
}

/// Fetch one template by name.
pub fn get_template(conn: &Connection, name: &str) -> Result<Option<PromptTemplate>, DatabaseError> {
    conn.query_row(
        "SELECT template_name, template_content, description
         FROM prompt_templates WHERE template_name = ?1",
        params![name],
        |row| {
            Ok(PromptTemplate {
                name: row.get(0)?,
                content: row.get(1)?,
                description: row.get(2)?,
            })
        },
    )
    .optional()
    .map_err(DatabaseError::from)
}

/// Create a new template. Fails if the name is already taken.
pub fn create_template(
    conn: &Connection,
    template: &PromptTemplate,
) -> Result<(), DatabaseError> {
    if get_template(conn, &template.name)?.is_some() {
        return Err(DatabaseError::AlreadyExists {
            entity_type: "prompt_template".into(),
            id: template.name.clone(),
        });
    }
    conn.execute(
        "INSERT INTO prompt_templates (template_name, template_content, description)
         VALUES (?1, ?2, ?3)",
        params![template.name, template.content, template.description],
    )?;
    Ok(())
}

/// Overwrite an existing template's content. Fails if the name is absent.
pub fn update_template(
    conn: &Connection,
    name: &str,
    new_content: &str,
) -> Result<(), DatabaseError> {
    let affected = conn.execute(
        "UPDATE prompt_templates
         SET template_content = ?1, updated_at = CURRENT_TIMESTAMP
         WHERE template_name = ?2",
        params![new_content, name],
    )?;
    if affected == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "prompt_template".into(),
            id: name.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;

    fn template(name: &str, content: &str) -> PromptTemplate {
        PromptTemplate {
            name: name.into(),
            content: content.into(),
            description: None,
        }
    }

    #[test]
    fn create_and_load_preserves_order() {
        let conn = open_memory_database().unwrap();
        create_template(&conn, &template("first", "A")).unwrap();
        create_template(&conn, &template("second", "B")).unwrap();

        let set = load_templates(&conn).unwrap();
        let names: Vec<_> = set.iter().map(|t| t.name.clone()).collect();
        assert_eq!(names, vec!["first", "second"]);
        assert_eq!(set.get("second"), Some("B"));
    }

    #[test]
    fn duplicate_name_fails() {
        let conn = open_memory_database().unwrap();
        create_template(&conn, &template("dup", "A")).unwrap();
        let result = create_template(&conn, &template("dup", "B"));
        assert!(matches!(result, Err(DatabaseError::AlreadyExists { .. })));
    }

    #[test]
    fn update_overwrites_content() {
        let conn = open_memory_database().unwrap();
        create_template(&conn, &template("edit_me", "old")).unwrap();
        update_template(&conn, "edit_me", "new").unwrap();

        let got = get_template(&conn, "edit_me").unwrap().unwrap();
        assert_eq!(got.content, "new");
    }

    #[test]
    fn update_missing_template_fails() {
        let conn = open_memory_database().unwrap();
        let result = update_template(&conn, "ghost", "content");
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
    }
}
