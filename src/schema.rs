// Diesel table definitions for the annotation store.
// Kept in sync with the cetane migrations in `crate::migrations`.

diesel::table! {
    annotator (annotator_id) {
        annotator_id -> Integer,
        name -> Text,
    }
}

diesel::table! {
    bio_type (bio_type_id) {
        bio_type_id -> Integer,
        name -> Text,
        annotator_id -> Integer,
    }
}

diesel::table! {
    bio_entity (bio_entity_id) {
        bio_entity_id -> Integer,
        bio_type_id -> Integer,
        name -> Text,
    }
}

diesel::table! {
    patent (patent_id) {
        patent_id -> Integer,
        patent_number -> Text,
        publication_date -> Text,
    }
}

diesel::table! {
    patent_annotated_by (patent_id, annotator_id) {
        patent_id -> Integer,
        annotator_id -> Integer,
    }
}

diesel::table! {
    annotation (annotation_id) {
        annotation_id -> Integer,
        patent_id -> Integer,
        field_id -> Integer,
        rank -> Integer,
        bio_entity_id -> Integer,
        start_offset -> Integer,
        end_offset -> Integer,
        term -> Text,
    }
}

diesel::table! {
    bioentity_patent_annotation_count (bio_entity_id, patent_id, field_id, term) {
        bio_entity_id -> Integer,
        patent_id -> Integer,
        field_id -> Integer,
        term -> Text,
        frequency -> Integer,
    }
}

diesel::table! {
    idg_target (uniprot_acc) {
        uniprot_acc -> Text,
        name -> Text,
        development_level -> Text,
        target_family -> Text,
    }
}

diesel::table! {
    ensembl_peptide_to_uniprot (ensembl_peptide_id, uniprot_acc) {
        ensembl_peptide_id -> Text,
        uniprot_acc -> Text,
        ensembl_release -> Text,
    }
}

diesel::joinable!(bio_type -> annotator (annotator_id));
diesel::joinable!(bio_entity -> bio_type (bio_type_id));
diesel::joinable!(patent_annotated_by -> patent (patent_id));
diesel::joinable!(patent_annotated_by -> annotator (annotator_id));
diesel::joinable!(annotation -> patent (patent_id));
diesel::joinable!(annotation -> bio_entity (bio_entity_id));
diesel::joinable!(bioentity_patent_annotation_count -> patent (patent_id));
diesel::joinable!(bioentity_patent_annotation_count -> bio_entity (bio_entity_id));

diesel::allow_tables_to_appear_in_same_query!(
    annotator,
    bio_type,
    bio_entity,
    patent,
    patent_annotated_by,
    annotation,
    bioentity_patent_annotation_count,
    idg_target,
    ensembl_peptide_to_uniprot,
);
