use cetane::prelude::*;

pub fn migration() -> Migration {
    Migration::new("0002_patents")
        .depends_on(&["0001_annotators"])
        .operation(RunSql::portable().for_backend(
            "sqlite",
            r#"CREATE TABLE IF NOT EXISTS patent (
    patent_id INTEGER PRIMARY KEY AUTOINCREMENT,
    patent_number TEXT NOT NULL UNIQUE,
    publication_date TEXT NOT NULL
)"#,
        ))
        // Discovery watermark lookups
        .operation(RunSql::portable().for_backend(
            "sqlite",
            "CREATE INDEX IF NOT EXISTS idx_patent_publication_date ON patent(publication_date)",
        ))
        .operation(RunSql::portable().for_backend(
            "sqlite",
            r#"CREATE TABLE IF NOT EXISTS patent_annotated_by (
    patent_id INTEGER NOT NULL REFERENCES patent(patent_id),
    annotator_id INTEGER NOT NULL REFERENCES annotator(annotator_id),
    PRIMARY KEY (patent_id, annotator_id)
)"#,
        ))
}
