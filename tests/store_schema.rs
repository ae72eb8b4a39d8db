//! Store Schema Tests
//!
//! Verifies that the cetane migrations produce the annotation store layout
//! the repositories and reports rely on.

use std::collections::{BTreeMap, BTreeSet};

use rusqlite::{Connection, Result as SqliteResult};

use patent_annotator::repository::migrations::run_migrations;

/// Column names per table or view.
fn extract_columns(conn: &Connection, kind: &str) -> SqliteResult<BTreeMap<String, BTreeSet<String>>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master WHERE type = ?1 AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )?;
    let names: Vec<String> = stmt
        .query_map([kind], |row| row.get(0))?
        .collect::<SqliteResult<Vec<_>>>()?;

    let mut objects = BTreeMap::new();
    for name in names {
        let mut info = conn.prepare(&format!("PRAGMA table_info('{}')", name))?;
        let columns = info
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<SqliteResult<BTreeSet<_>>>()?;
        objects.insert(name, columns);
    }
    Ok(objects)
}

fn set(columns: &[&str]) -> BTreeSet<String> {
    columns.iter().map(|c| c.to_string()).collect()
}

#[tokio::test]
async fn test_migrations_create_store_layout() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.db");
    let url = format!("sqlite:{}", path.display());

    let applied = run_migrations(&url).await.unwrap();
    assert_eq!(applied.len(), 5);

    let conn = Connection::open(&path).unwrap();
    let tables = extract_columns(&conn, "table").unwrap();

    assert_eq!(tables["annotator"], set(&["annotator_id", "name"]));
    assert_eq!(
        tables["patent"],
        set(&["patent_id", "patent_number", "publication_date"])
    );
    assert_eq!(tables["patent_annotated_by"], set(&["patent_id", "annotator_id"]));
    assert_eq!(
        tables["bioentity_patent_annotation_count"],
        set(&["bio_entity_id", "patent_id", "field_id", "term", "frequency"])
    );
    assert!(tables["annotation"].contains("term"));
    assert!(tables.contains_key("bio_type"));
    assert!(tables.contains_key("bio_entity"));
    assert!(tables.contains_key("idg_target"));
    assert!(tables.contains_key("ensembl_peptide_to_uniprot"));

    let views = extract_columns(&conn, "view").unwrap();
    assert_eq!(
        views["idg_entity"],
        set(&[
            "bio_entity_id",
            "entity_name",
            "uniprot_acc",
            "target_name",
            "development_level",
            "target_family",
        ])
    );
}

#[tokio::test]
async fn test_migrations_are_applied_once() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite:{}", dir.path().join("store.db").display());

    assert!(!run_migrations(&url).await.unwrap().is_empty());
    assert!(run_migrations(&url).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_annotated_by_rejects_duplicate_marks() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.db");
    run_migrations(&format!("sqlite:{}", path.display())).await.unwrap();

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "INSERT INTO annotator (name) VALUES ('tagger');
         INSERT INTO patent (patent_number, publication_date) VALUES ('EP-1-A1', '2020-01-01');
         INSERT INTO patent_annotated_by (patent_id, annotator_id) VALUES (1, 1);",
    )
    .unwrap();

    assert!(conn
        .execute(
            "INSERT INTO patent_annotated_by (patent_id, annotator_id) VALUES (1, 1)",
            [],
        )
        .is_err());
}
