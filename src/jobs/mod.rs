//! The annotation job and its pipeline stages.

mod annotate;
mod job;
mod persist;

pub use annotate::{AnnotationStage, POOL_TERMINATION_TIMEOUT};
pub use job::{AnnotatorJob, JobSettings, JobSummary};
pub use persist::{PersistenceStage, DEFAULT_BATCH_SIZE};
