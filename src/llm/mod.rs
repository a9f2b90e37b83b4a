// Generation capability: backend trait, OpenAI adapter, retrying client

pub mod generator;
pub mod language;
pub mod openai;
pub mod prompts;
pub mod provider;

pub use generator::Generator;
pub use openai::OpenAiBackend;
pub use provider::{Completion, CompletionRequest, ContentGenerator, GenerationBackend};
