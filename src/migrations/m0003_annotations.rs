use cetane::prelude::*;

pub fn migration() -> Migration {
    Migration::new("0003_annotations")
        .depends_on(&["0002_patents"])
        .operation(RunSql::portable().for_backend(
            "sqlite",
            r#"CREATE TABLE IF NOT EXISTS annotation (
    annotation_id INTEGER PRIMARY KEY AUTOINCREMENT,
    patent_id INTEGER NOT NULL REFERENCES patent(patent_id),
    field_id INTEGER NOT NULL,
    rank INTEGER NOT NULL,
    bio_entity_id INTEGER NOT NULL REFERENCES bio_entity(bio_entity_id),
    start_offset INTEGER NOT NULL,
    end_offset INTEGER NOT NULL,
    term VARCHAR(127) NOT NULL
)"#,
        ))
        .operation(RunSql::portable().for_backend(
            "sqlite",
            "CREATE INDEX IF NOT EXISTS idx_annotation_patent ON annotation(patent_id)",
        ))
        .operation(RunSql::portable().for_backend(
            "sqlite",
            r#"CREATE TABLE IF NOT EXISTS bioentity_patent_annotation_count (
    bio_entity_id INTEGER NOT NULL REFERENCES bio_entity(bio_entity_id),
    patent_id INTEGER NOT NULL REFERENCES patent(patent_id),
    field_id INTEGER NOT NULL,
    term VARCHAR(127) NOT NULL,
    frequency INTEGER NOT NULL,
    PRIMARY KEY (bio_entity_id, patent_id, field_id, term)
)"#,
        ))
        .operation(RunSql::portable().for_backend(
            "sqlite",
            "CREATE INDEX IF NOT EXISTS idx_annotation_count_patent ON bioentity_patent_annotation_count(patent_id)",
        ))
}
