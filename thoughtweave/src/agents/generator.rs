//! LLM-backed generator: proposes chains of steps and writes the final answer.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::AgentError;
use crate::llm::LlmClient;
use crate::message::Message;
use crate::tree::StepRecord;

use super::parser::{extract_records, StepParser};
use super::prompts::{answer_task, generator_system, generator_task, ANSWER_KEY};
use super::{ChainRequest, Generator};

pub struct LlmGenerator {
    llm: Arc<dyn LlmClient>,
    parser: StepParser,
}

impl LlmGenerator {
    /// Uses `llm` for both generation and reformatting.
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        let parser = StepParser::new(llm.clone());
        Self { llm, parser }
    }

    pub fn with_parser(mut self, parser: StepParser) -> Self {
        self.parser = parser;
        self
    }
}

#[async_trait]
impl Generator for LlmGenerator {
    async fn propose_chain(&self, request: &ChainRequest) -> Result<Vec<StepRecord>, AgentError> {
        let messages = [
            Message::system(generator_system(&request.domain, &request.problem)),
            Message::user(generator_task(
                &request.exclusion_text,
                &request.path_text,
                &request.hint_text,
                request.next_step_number,
            )),
        ];
        let response = self.llm.invoke(&messages).await?;
        debug!(
            step = request.next_step_number,
            chars = response.content.len(),
            "generator response"
        );
        self.parser.parse_steps(&response.content).await
    }

    async fn synthesize_answer(
        &self,
        problem: &str,
        path: &[StepRecord],
    ) -> Result<String, AgentError> {
        let steps = path
            .iter()
            .map(StepRecord::as_text)
            .collect::<Vec<_>>()
            .join("\n");
        let response = self
            .llm
            .invoke(&[Message::user(answer_task(problem, &steps))])
            .await?;
        // Models often answer in prose; keep the raw text when the key is absent.
        let answer = extract_records(&response.content, &[ANSWER_KEY])
            .into_iter()
            .next()
            .and_then(|mut r| r.remove(ANSWER_KEY))
            .filter(|a| !a.is_empty() && a != "N/A");
        Ok(answer.unwrap_or_else(|| response.content.trim().to_string()))
    }
}
