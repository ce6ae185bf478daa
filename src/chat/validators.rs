//! Chat request validation

use super::models::ChatRequest;
use crate::common::{ValidationResult, Validator};

/// Upper bound on a single user message, in characters
pub const MAX_MESSAGE_CHARS: usize = 10_000;

pub struct ChatRequestValidator;

impl Validator<ChatRequest> for ChatRequestValidator {
    fn validate(&self, data: &ChatRequest) -> ValidationResult {
        let mut result = ValidationResult::new();
        let message = data.message.trim();

        if message.is_empty() {
            result.add_error("message", "must not be empty");
        } else if message.chars().count() > MAX_MESSAGE_CHARS {
            result.add_error(
                "message",
                &format!("must be at most {} characters", MAX_MESSAGE_CHARS),
            );
        }

        result
    }
}
