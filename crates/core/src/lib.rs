pub mod config;
pub mod domain;
pub mod errors;
pub mod knowledge;

pub use domain::conversation::{ConversationTurn, Intent};
pub use domain::document::Document;
pub use domain::lead::{Lead, LeadField, LeadValidationError};
pub use errors::{ApplicationError, InterfaceError};
pub use knowledge::{load_knowledge_base, KnowledgeBaseError};
