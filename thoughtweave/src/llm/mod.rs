//! LLM client abstraction used by the generator, evaluator and parser adapters.
//!
//! The search engine never talks to a model directly: it calls the typed
//! [`Generator`](crate::Generator) / [`Evaluator`](crate::Evaluator) contracts, and the
//! LLM-backed implementations of those contracts call an [`LlmClient`].

mod mock;
mod openai;

pub use mock::MockLlm;
pub use openai::ChatOpenAI;

use async_trait::async_trait;

use crate::error::AgentError;
use crate::message::Message;

/// Token usage for one LLM call, when the provider reports it.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LlmUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Response from a completion: assistant text.
#[derive(Clone, Debug)]
pub struct LlmResponse {
    /// Assistant message content (plain text).
    pub content: String,
    /// Token usage for this call, when available.
    pub usage: Option<LlmUsage>,
}

/// LLM client: given messages, returns the assistant text.
///
/// Implementations: [`MockLlm`] (scripted responses), [`ChatOpenAI`] (OpenAI-compatible API).
/// One call is one request/response exchange; retries on transport errors are the
/// implementation's concern.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn invoke(&self, messages: &[Message]) -> Result<LlmResponse, AgentError>;
}
