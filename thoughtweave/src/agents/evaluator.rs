//! LLM-backed evaluator: 0–100 step scores with an improvement hint.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::AgentError;
use crate::llm::LlmClient;
use crate::message::Message;

use super::parser::StepParser;
use super::prompts::{evaluator_system, evaluator_task};
use super::{Evaluator, ScoreRequest, StepScore};

pub struct LlmEvaluator {
    llm: Arc<dyn LlmClient>,
    parser: StepParser,
}

impl LlmEvaluator {
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
impl Evaluator for LlmEvaluator {
    async fn score_step(&self, request: &ScoreRequest) -> Result<StepScore, AgentError> {
        let messages = [
            Message::system(evaluator_system(&request.domain)),
            Message::user(evaluator_task(
                &request.problem,
                &request.path_text,
                &request.candidate_text,
            )),
        ];
        let response = self.llm.invoke(&messages).await?;
        let score = self.parser.parse_score(&response.content).await?;
        debug!(score = score.score, "step scored");
        Ok(score)
    }
}
