//! Conversions between wire formats and the canonical types

pub mod lmstudio;
pub mod ollama;
pub mod openai;
