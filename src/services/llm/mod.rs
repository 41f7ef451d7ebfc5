pub mod client;
pub mod types;

pub use client::GeminiClient;
pub use types::{GenerationError, GenerationReply, GenerationRequest, LanguageService};
