//! Wire formats: the upstream `OpenAI` format and the two emulated dialects

pub mod lmstudio;
pub mod ollama;
pub mod openai;
