use std::sync::Arc;

use cyberquest_database::Database;
use cyberquest_llm::QuestionGenerator;

pub mod accounts;
pub mod authoring;
pub mod caller;
pub mod config;
pub mod credentials;
pub mod error;
pub mod import;
pub mod progression;
pub mod stats;

pub use caller::{Access, Caller};
pub use credentials::CredentialService;
pub use error::{ApiError, ApiResult};
pub use progression::XpPolicy;

/// State shared by every request handler.
#[derive(Clone, Debug)]
pub struct Data {
    pub db: Database,
    pub generator: Option<QuestionGenerator>,
    pub credentials: CredentialService,
    pub policy: Arc<XpPolicy>,
}
