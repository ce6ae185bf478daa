// src/services/mod.rs
//
// Outbound integrations: the OpenAI chat provider and Google sign-in

pub mod google;
pub mod openai;

// Re-export commonly used types for convenience
pub use google::GoogleIdentityVerifier;
pub use openai::OpenAIService;
