// Application state shared across all modules

use std::sync::Arc;

use super::config::AppConfig;
use crate::auth::models::User;
use crate::auth::IdentityVerifier;
use crate::chat::{ChatStore, QuotaGuardedChatService};

/// Application state containing configuration and the chat collaborators
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn ChatStore>,
    pub identity: Arc<dyn IdentityVerifier>,
    pub chat_service: Arc<QuotaGuardedChatService>,
    /// Set only in dev mode; every request is treated as this user
    pub dev_user: Option<User>,
}
