//! Diesel record types for the annotation store tables.

use diesel::prelude::*;

use crate::models::{AnnotatorMetadata, IdgTarget, PatentMetadata, PeptideMapping};
use crate::schema;

use super::pool::DieselError;
use super::util::parse_date;

#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::annotator)]
#[diesel(primary_key(annotator_id))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AnnotatorRecord {
    pub annotator_id: i32,
    pub name: String,
}

impl From<AnnotatorRecord> for AnnotatorMetadata {
    fn from(record: AnnotatorRecord) -> Self {
        AnnotatorMetadata {
            id: record.annotator_id,
            name: record.name,
        }
    }
}

#[derive(Insertable, Debug)]
#[diesel(table_name = schema::annotator)]
pub struct NewAnnotator<'a> {
    pub name: &'a str,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = schema::bio_type)]
pub struct NewBioType<'a> {
    pub name: &'a str,
    pub annotator_id: i32,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = schema::bio_entity)]
pub struct NewBioEntity<'a> {
    pub bio_type_id: i32,
    pub name: &'a str,
}

#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::patent)]
#[diesel(primary_key(patent_id))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PatentRecord {
    pub patent_id: i32,
    pub patent_number: String,
    pub publication_date: String,
}

impl PatentRecord {
    pub fn into_metadata(self) -> Result<PatentMetadata, DieselError> {
        Ok(PatentMetadata {
            id: self.patent_id,
            publication_date: parse_date(&self.publication_date)?,
            patent_number: self.patent_number,
        })
    }
}

#[derive(Insertable, Debug)]
#[diesel(table_name = schema::patent)]
pub struct NewPatent<'a> {
    pub patent_number: &'a str,
    pub publication_date: String,
}

#[derive(Insertable, Debug, Clone, Copy, PartialEq, Eq)]
#[diesel(table_name = schema::patent_annotated_by)]
pub struct NewAnnotatedBy {
    pub patent_id: i32,
    pub annotator_id: i32,
}

#[derive(Insertable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = schema::annotation)]
pub struct NewAnnotation<'a> {
    pub patent_id: i32,
    pub field_id: i32,
    pub rank: i32,
    pub bio_entity_id: i32,
    pub start_offset: i32,
    pub end_offset: i32,
    pub term: &'a str,
}

#[derive(Queryable, Selectable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = schema::annotation)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AnnotationRecord {
    pub patent_id: i32,
    pub field_id: i32,
    pub rank: i32,
    pub bio_entity_id: i32,
    pub start_offset: i32,
    pub end_offset: i32,
    pub term: String,
}

#[derive(Insertable, Queryable, Selectable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = schema::bioentity_patent_annotation_count)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AnnotationCountRecord {
    pub bio_entity_id: i32,
    pub patent_id: i32,
    pub field_id: i32,
    pub term: String,
    pub frequency: i32,
}

#[derive(Insertable, Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = schema::idg_target)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct IdgTargetRecord {
    pub uniprot_acc: String,
    pub name: String,
    pub development_level: String,
    pub target_family: String,
}

impl From<IdgTargetRecord> for IdgTarget {
    fn from(record: IdgTargetRecord) -> Self {
        IdgTarget {
            uniprot_acc: record.uniprot_acc,
            name: record.name,
            development_level: record.development_level,
            target_family: record.target_family,
        }
    }
}

impl From<&IdgTarget> for IdgTargetRecord {
    fn from(target: &IdgTarget) -> Self {
        IdgTargetRecord {
            uniprot_acc: target.uniprot_acc.clone(),
            name: target.name.clone(),
            development_level: target.development_level.clone(),
            target_family: target.target_family.clone(),
        }
    }
}

#[derive(Insertable, Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = schema::ensembl_peptide_to_uniprot)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PeptideMappingRecord {
    pub ensembl_peptide_id: String,
    pub uniprot_acc: String,
    pub ensembl_release: String,
}

impl From<PeptideMappingRecord> for PeptideMapping {
    fn from(record: PeptideMappingRecord) -> Self {
        PeptideMapping {
            ensembl_peptide_id: record.ensembl_peptide_id,
            uniprot_acc: record.uniprot_acc,
            ensembl_release: record.ensembl_release,
        }
    }
}
