//! # Chat Module
//!
//! Quota-guarded chat turns and their history:
//! - Model selection and provider dispatch
//! - Daily usage counters with an atomic limit
//! - Session and message persistence

pub mod handlers;
pub mod models;
pub mod provider;
pub mod routes;
pub mod service;
pub mod store;
pub mod validators;


pub use provider::{ChatProvider, ProviderRegistry};
pub use routes::chat_routes;
pub use service::QuotaGuardedChatService;
pub use store::{ChatStore, SqliteChatStore};
