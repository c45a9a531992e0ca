pub mod repositories;

pub use repositories::{CsvLeadRepository, InMemoryLeadRepository, LeadRepository, RepositoryError};
