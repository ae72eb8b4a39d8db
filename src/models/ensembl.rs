use serde::{Deserialize, Serialize};

/// An Ensembl peptide id mapped to a UniProt accession at a given release.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeptideMapping {
    pub ensembl_peptide_id: String,
    pub uniprot_acc: String,
    pub ensembl_release: String,
}
