use cetane::prelude::*;

pub fn migration() -> Migration {
    Migration::new("0001_annotators")
        .operation(RunSql::portable().for_backend(
            "sqlite",
            r#"CREATE TABLE IF NOT EXISTS annotator (
    annotator_id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
)"#,
        ))
        .operation(RunSql::portable().for_backend(
            "sqlite",
            r#"CREATE TABLE IF NOT EXISTS bio_type (
    bio_type_id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    annotator_id INTEGER NOT NULL REFERENCES annotator(annotator_id),
    UNIQUE (name, annotator_id)
)"#,
        ))
        .operation(RunSql::portable().for_backend(
            "sqlite",
            r#"CREATE TABLE IF NOT EXISTS bio_entity (
    bio_entity_id INTEGER PRIMARY KEY AUTOINCREMENT,
    bio_type_id INTEGER NOT NULL REFERENCES bio_type(bio_type_id),
    name TEXT NOT NULL,
    UNIQUE (bio_type_id, name)
)"#,
        ))
}
