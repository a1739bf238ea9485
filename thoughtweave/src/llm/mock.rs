//! Mock LLM for tests and offline runs.
//!
//! Returns scripted responses in order; once the script is exhausted the last
//! response is repeated. Every call's messages are recorded so tests can assert
//! on the prompts that were sent.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::AgentError;
use crate::llm::{LlmClient, LlmResponse};
use crate::message::Message;

/// Mock LLM: scripted assistant replies.
pub struct MockLlm {
    script: Mutex<VecDeque<String>>,
    last: Mutex<String>,
    calls: Mutex<Vec<Vec<Message>>>,
}

impl MockLlm {
    /// Always answers with `content`.
    pub fn fixed(content: impl Into<String>) -> Self {
        Self::scripted([content.into()])
    }

    /// Answers with each entry of `responses` in turn, then repeats the last one.
    pub fn scripted<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let script: VecDeque<String> = responses.into_iter().map(Into::into).collect();
        let last = script.back().cloned().unwrap_or_default();
        Self {
            script: Mutex::new(script),
            last: Mutex::new(last),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Number of `invoke` calls so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }

    /// Messages passed to each call, in call order.
    pub fn calls(&self) -> Vec<Vec<Message>> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

fn poisoned<T>(_: T) -> AgentError {
    AgentError::ExecutionFailed("mock llm lock poisoned".to_string())
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn invoke(&self, messages: &[Message]) -> Result<LlmResponse, AgentError> {
        self.calls.lock().map_err(poisoned)?.push(messages.to_vec());
        let next = self.script.lock().map_err(poisoned)?.pop_front();
        let content = match next {
            Some(content) => {
                *self.last.lock().map_err(poisoned)? = content.clone();
                content
            }
            None => self.last.lock().map_err(poisoned)?.clone(),
        };
        Ok(LlmResponse {
            content,
            usage: None,
        })
    }
}
