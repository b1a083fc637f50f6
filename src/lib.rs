pub mod accounts;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod domain;
pub mod error;
pub mod http;
pub mod orders;
pub mod payments;
pub mod reports;
pub mod store;

pub use accounts::{AccountService, LogMailer, Mailer, RecordingMailer};
pub use cache::TtlCache;
pub use catalog::CatalogService;
pub use config::AppConfig;
pub use error::{FieldError, ServiceError};
pub use http::{router, serve, AppState};
pub use orders::OrderService;
pub use store::MemoryStore;
