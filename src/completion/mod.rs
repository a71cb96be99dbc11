//! Completion service integration.

pub mod client;

pub use client::{
    Completion, CompletionClient, CompletionError, CompletionRequest, CompletionSettings,
    OpenAiCompletionClient, NO_RESPONSE_PLACEHOLDER,
};
