mod m0001_annotators;
mod m0002_patents;
mod m0003_annotations;
mod m0004_idg_targets;
mod m0005_ensembl_mapping;

use cetane::prelude::MigrationRegistry;

pub fn registry() -> MigrationRegistry {
    let mut reg = MigrationRegistry::new();
    reg.register(m0001_annotators::migration());
    reg.register(m0002_patents::migration());
    reg.register(m0003_annotations::migration());
    reg.register(m0004_idg_targets::migration());
    reg.register(m0005_ensembl_mapping::migration());
    reg
}
