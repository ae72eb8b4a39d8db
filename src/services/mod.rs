//! Service layer: discovery, XML handling, dictionary identity and the
//! drug-target side outputs.
//!
//! Services hold domain logic separate from CLI concerns.

pub mod dictionary_guard;
pub mod discovery;
pub mod ensembl;
pub mod idg;
pub mod xml_fetcher;
pub mod xml_parser;

pub use dictionary_guard::{DictionaryError, DictionaryGuard};
pub use discovery::{DiscoveryError, PatentDiscovery};
pub use ensembl::{peptide_ids, EnsemblError, EnsemblMapper};
pub use idg::{IdgError, IdgService};
pub use xml_fetcher::{FetchError, XmlFetcher};
pub use xml_parser::parse_patent;
