pub mod client;
pub mod dto;
pub mod handler;
pub mod prompt;
pub mod retry;
pub mod service;

pub use client::{AiClient, CompletionClient, FailureClass, OpenAiClient, UpstreamError};
pub use retry::RetryPolicy;
pub use service::{PromptRefiner, RefinementOutcome};
