use cetane::prelude::*;

pub fn migration() -> Migration {
    Migration::new("0004_idg_targets")
        .depends_on(&["0003_annotations"])
        .operation(RunSql::portable().for_backend(
            "sqlite",
            r#"CREATE TABLE IF NOT EXISTS idg_target (
    uniprot_acc TEXT PRIMARY KEY NOT NULL,
    name TEXT NOT NULL,
    development_level TEXT NOT NULL,
    target_family TEXT NOT NULL
)"#,
        ))
}
