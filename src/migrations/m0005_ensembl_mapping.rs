use cetane::prelude::*;

pub fn migration() -> Migration {
    Migration::new("0005_ensembl_mapping")
        .depends_on(&["0004_idg_targets"])
        .operation(RunSql::portable().for_backend(
            "sqlite",
            r#"CREATE TABLE IF NOT EXISTS ensembl_peptide_to_uniprot (
    ensembl_peptide_id TEXT NOT NULL,
    uniprot_acc TEXT NOT NULL,
    ensembl_release TEXT NOT NULL,
    PRIMARY KEY (ensembl_peptide_id, uniprot_acc)
)"#,
        ))
        // Target-linked entities of the tagger's human gene vocabulary
        .operation(RunSql::portable().for_backend(
            "sqlite",
            r#"CREATE VIEW IF NOT EXISTS idg_entity AS
SELECT en.bio_entity_id AS bio_entity_id,
       en.name AS entity_name,
       tgt.uniprot_acc AS uniprot_acc,
       tgt.name AS target_name,
       tgt.development_level AS development_level,
       tgt.target_family AS target_family
  FROM bio_entity en
  JOIN bio_type ty ON ty.bio_type_id = en.bio_type_id
  JOIN annotator an ON an.annotator_id = ty.annotator_id
  JOIN ensembl_peptide_to_uniprot xref ON xref.ensembl_peptide_id = en.name
  JOIN idg_target tgt ON tgt.uniprot_acc = xref.uniprot_acc
 WHERE an.name = 'tagger'
   AND ty.name = 'HUMAN_GENE'"#,
        ))
}
