//! Free-text to record parser with LLM reformatting on malformed output.
//!
//! [`extract_records`] is a pure scan for `Key: value` pairs. When a key set is
//! missing, [`StepParser`] asks the model to rewrite the text as JSON in the
//! expected layout and scans again, a bounded number of times.

use std::collections::HashMap;
use std::sync::Arc;

use regex::Regex;
use tracing::debug;

use crate::error::AgentError;
use crate::llm::LlmClient;
use crate::message::Message;
use crate::tree::StepRecord;

use super::prompts::{
    parser_system, parser_task, EVALUATION_FORMAT, EVALUATION_KEYS, PROBLEM_FORMAT, PROBLEM_KEYS,
    SCORE_KEY, STEP_FORMAT, STEP_KEYS,
};
use super::{Problem, StepScore};

/// One parsed entry: key to value, `"N/A"` for keys absent from that entry.
pub type Record = HashMap<String, String>;

const MISSING: &str = "N/A";

/// Where a plain value stops, besides the next key.
const VALUE_TERMINATORS: &[&str] = &["\n\n", "}", "Step"];

/// Scans `text` for `Key: value` pairs (keys optionally quoted) and groups the
/// n-th occurrence of every key into the n-th record.
///
/// A value runs until the next key, a blank line, `}` or `Step`. Values of
/// `Final Score` are the leading number only.
pub fn extract_records(text: &str, keys: &[&str]) -> Vec<Record> {
    if keys.is_empty() {
        return Vec::new();
    }
    let alternation = keys
        .iter()
        .map(|k| regex::escape(k))
        .collect::<Vec<_>>()
        .join("|");
    let Ok(marker) = Regex::new(&format!(r#"["']?({})["']?\s*:"#, alternation)) else {
        return Vec::new();
    };

    let markers: Vec<(&str, usize, usize)> = marker
        .captures_iter(text)
        .filter_map(|c| {
            let whole = c.get(0)?;
            Some((c.get(1)?.as_str(), whole.start(), whole.end()))
        })
        .collect();

    let mut values: HashMap<&str, Vec<String>> = HashMap::new();
    for (i, (key, _, value_start)) in markers.iter().enumerate() {
        let end = markers.get(i + 1).map_or(text.len(), |next| next.1);
        let raw = &text[*value_start..end];
        let value = if *key == SCORE_KEY {
            leading_number(raw)
        } else {
            Some(clean_value(raw))
        };
        if let Some(v) = value {
            values.entry(*key).or_default().push(v);
        }
    }

    let rows = keys
        .iter()
        .map(|k| values.get(k).map_or(0, Vec::len))
        .max()
        .unwrap_or(0);
    (0..rows)
        .map(|i| {
            keys.iter()
                .map(|k| {
                    let v = values
                        .get(k)
                        .and_then(|vs| vs.get(i))
                        .cloned()
                        .unwrap_or_else(|| MISSING.to_string());
                    (k.to_string(), v)
                })
                .collect()
        })
        .collect()
}

fn clean_value(raw: &str) -> String {
    let cut = VALUE_TERMINATORS
        .iter()
        .filter_map(|t| raw.find(t))
        .min()
        .unwrap_or(raw.len());
    let v = raw[..cut].trim().trim_end_matches(',').trim();
    let v = v
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| v.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')))
        .unwrap_or(v);
    v.trim().to_string()
}

fn leading_number(raw: &str) -> Option<String> {
    let s = raw.trim_start().trim_start_matches(['"', '\'']);
    let end = s
        .char_indices()
        .find(|(_, c)| !(c.is_ascii_digit() || *c == '.'))
        .map_or(s.len(), |(i, _)| i);
    let n = s[..end].trim_end_matches('.');
    if n.is_empty() {
        None
    } else {
        Some(n.to_string())
    }
}

/// Every key has at least one real value and every score parses.
fn is_complete(records: &[Record], keys: &[&str]) -> bool {
    if records.is_empty() {
        return false;
    }
    let all_keys_seen = keys.iter().all(|k| {
        records
            .iter()
            .any(|r| r.get(*k).is_some_and(|v| v != MISSING))
    });
    let scores_parse = records.iter().all(|r| {
        r.get(SCORE_KEY)
            .map_or(true, |v| v.parse::<f64>().is_ok())
    });
    all_keys_seen && scores_parse
}

fn field(record: &Record, key: &str) -> String {
    record.get(key).cloned().unwrap_or_default()
}

/// Parser collaborator: turns model text into typed records.
pub struct StepParser {
    llm: Arc<dyn LlmClient>,
    max_reparse_attempts: usize,
}

impl StepParser {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self {
            llm,
            max_reparse_attempts: 3,
        }
    }

    /// How many times malformed text is sent back for reformatting before giving up.
    pub fn with_max_reparse_attempts(mut self, attempts: usize) -> Self {
        self.max_reparse_attempts = attempts;
        self
    }

    /// Extracts records for `keys`, reformatting through the model while any key is missing.
    pub async fn parse_records(
        &self,
        text: &str,
        format: &str,
        keys: &[&str],
    ) -> Result<Vec<Record>, AgentError> {
        let mut current = text.to_string();
        for attempt in 0..=self.max_reparse_attempts {
            let records = extract_records(&current, keys);
            if is_complete(&records, keys) {
                return Ok(records);
            }
            if attempt == self.max_reparse_attempts {
                break;
            }
            debug!(attempt = attempt + 1, ?keys, "reparse");
            current = self.reformat(&current, format).await?;
        }
        Err(AgentError::Parse(format!(
            "keys {:?} not found after {} reformat attempts",
            keys, self.max_reparse_attempts
        )))
    }

    /// Reformats `text` through the model first, then extracts records.
    pub async fn parse(
        &self,
        text: &str,
        format: &str,
        keys: &[&str],
    ) -> Result<Vec<Record>, AgentError> {
        let formatted = self.reformat(text, format).await?;
        self.parse_records(&formatted, format, keys).await
    }

    async fn reformat(&self, text: &str, format: &str) -> Result<String, AgentError> {
        let messages = [
            Message::system(parser_system(format)),
            Message::user(parser_task(text)),
        ];
        Ok(self.llm.invoke(&messages).await?.content)
    }

    /// Splits a raw problem statement into prior knowledge, question and domain.
    pub async fn parse_problem(&self, statement: &str) -> Result<Problem, AgentError> {
        let records = self.parse(statement, PROBLEM_FORMAT, PROBLEM_KEYS).await?;
        let first = records
            .first()
            .ok_or_else(|| AgentError::Parse("empty problem record".to_string()))?;
        Ok(Problem::new(
            statement.trim(),
            field(first, "Prior_Knowledge"),
            field(first, "Question"),
            field(first, "Domain"),
        ))
    }

    /// Generator output to ordered steps.
    pub async fn parse_steps(&self, text: &str) -> Result<Vec<StepRecord>, AgentError> {
        let records = self.parse_records(text, STEP_FORMAT, STEP_KEYS).await?;
        Ok(records
            .iter()
            .map(|r| StepRecord::new(field(r, "Thought"), field(r, "Action"), field(r, "Result")))
            .collect())
    }

    /// Evaluator output to a score and hint. Only the first evaluation counts.
    pub async fn parse_score(&self, text: &str) -> Result<StepScore, AgentError> {
        let records = self
            .parse_records(text, EVALUATION_FORMAT, EVALUATION_KEYS)
            .await?;
        let first = records
            .first()
            .ok_or_else(|| AgentError::Parse("empty evaluation record".to_string()))?;
        let score = field(first, SCORE_KEY)
            .parse::<f64>()
            .map_err(|e| AgentError::Parse(format!("{}: {}", SCORE_KEY, e)))?;
        Ok(StepScore::new(score, field(first, "Hint")))
    }
}
