use async_trait::async_trait;
use thiserror::Error;

use autostream_core::domain::lead::Lead;

pub mod csv;
pub mod memory;

pub use self::csv::CsvLeadRepository;
pub use self::memory::InMemoryLeadRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("lead storage i/o failed for `{path}`: {source}")]
    Io { path: String, source: std::io::Error },
    #[error("lead csv encoding failed: {0}")]
    Csv(#[from] ::csv::Error),
    #[error("lead csv row {row} is malformed: {message}")]
    Decode { row: usize, message: String },
}

/// Append-only lead storage. Leads are written once and never updated.
#[async_trait]
pub trait LeadRepository: Send + Sync {
    async fn append(&self, lead: &Lead) -> Result<(), RepositoryError>;
    async fn list(&self) -> Result<Vec<Lead>, RepositoryError>;

    /// Human-readable location, shown after a save.
    fn location(&self) -> String;
}
