pub mod llm;
pub mod transcription;
