//! Answer synthesis — one combination prompt, one model call.
//!
//! The synthesizer owns the prompt-construction contract: verbatim question,
//! structured answer (or an explicit placeholder), up to [`MAX_PASSAGES`]
//! semantic passages joined with a visible separator, and the serialized
//! trace. The instruction block is a fixed constant, not computed per
//! request. The model call is the provider's black-box `complete`.

use tracing::debug;

use crate::backend::Passage;
use crate::llm::LlmProvider;

use super::ChainError;

/// Passages fed into the prompt are capped here regardless of how many the
/// retriever returned.
pub const MAX_PASSAGES: usize = 6;

const PASSAGE_SEPARATOR: &str = "\n---\n";

const NO_STRUCTURED_ANSWER: &str = "(no structured answer)";
const NO_SEMANTIC_CONTEXT: &str = "(no semantic context retrieved)";
const NO_TRACE: &str = "(no trace recorded)";

const COMBINE_INSTRUCTIONS: &str = "\
1. Give a concise, accurate, student-friendly answer.
2. Combine structured facts (graph) with supplemental context (semantic); \
when one source is more directly relevant, prefer it.
3. If ranking, tuition or GPA details are present, include them succinctly.
4. Offer at most two follow-up guidance suggestions when helpful.
5. If the information is missing from both sources, say that briefly instead \
of inventing it.";

#[derive(Debug, Clone)]
pub struct Synthesizer {
    llm: LlmProvider,
}

impl Synthesizer {
    pub fn new(llm: LlmProvider) -> Self {
        Self { llm }
    }

    /// Build the combination prompt. Only the first [`MAX_PASSAGES`] passages
    /// are used.
    pub fn build_prompt(
        question: &str,
        structured_answer: &str,
        passages: &[Passage],
        trace: &[serde_json::Value],
    ) -> String {
        let structured = if structured_answer.trim().is_empty() {
            NO_STRUCTURED_ANSWER
        } else {
            structured_answer
        };

        let context = if passages.is_empty() {
            NO_SEMANTIC_CONTEXT.to_string()
        } else {
            passages
                .iter()
                .take(MAX_PASSAGES)
                .map(|p| p.text.as_str())
                .collect::<Vec<_>>()
                .join(PASSAGE_SEPARATOR)
        };

        let trace_text = if trace.is_empty() {
            NO_TRACE.to_string()
        } else {
            serde_json::to_string_pretty(trace).unwrap_or_else(|_| NO_TRACE.to_string())
        };

        format!(
            "You are EduConnect, an educational guidance assistant.\n\
             User question: {question}\n\n\
             Structured graph answer (may be partial):\n{structured}\n\n\
             Relevant semantic context (unstructured):\n{context}\n\n\
             Query / reasoning steps (for transparency):\n{trace_text}\n\n\
             Instructions:\n{COMBINE_INSTRUCTIONS}\n\n\
             Final answer:"
        )
    }

    /// One model round-trip; the trimmed reply is the final answer.
    pub async fn synthesize(
        &self,
        question: &str,
        structured_answer: &str,
        passages: &[Passage],
        trace: &[serde_json::Value],
    ) -> Result<String, ChainError> {
        let prompt = Self::build_prompt(question, structured_answer, passages, trace);
        debug!(prompt_len = prompt.len(), passages = passages.len().min(MAX_PASSAGES), "synthesizing answer");

        let text = self
            .llm
            .complete(&prompt)
            .await
            .map_err(|e| ChainError::Synthesis(e.to_string()))?;

        Ok(text.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn passage(text: &str) -> Passage {
        Passage { text: text.to_string(), source: None }
    }

    #[test]
    fn prompt_contains_question_and_answer() {
        let prompt = Synthesizer::build_prompt("top 10 universities", "MIT leads.", &[], &[]);
        assert!(prompt.contains("top 10 universities"));
        assert!(prompt.contains("MIT leads."));
    }

    #[test]
    fn placeholders_for_missing_sections() {
        let prompt = Synthesizer::build_prompt("q", "  ", &[], &[]);
        assert!(prompt.contains(NO_STRUCTURED_ANSWER));
        assert!(prompt.contains(NO_SEMANTIC_CONTEXT));
        assert!(prompt.contains(NO_TRACE));
    }

    #[test]
    fn passages_joined_and_truncated() {
        let passages: Vec<Passage> = (0..8).map(|i| passage(&format!("chunk-{i}"))).collect();
        let prompt = Synthesizer::build_prompt("q", "a", &passages, &[]);
        assert!(prompt.contains("chunk-0"));
        assert!(prompt.contains("chunk-5"));
        assert!(!prompt.contains("chunk-6"));
        assert_eq!(prompt.matches("---").count(), MAX_PASSAGES - 1);
    }

    #[test]
    fn trace_is_serialized() {
        let trace = vec![json!({"step": "match"})];
        let prompt = Synthesizer::build_prompt("q", "a", &[], &trace);
        assert!(prompt.contains("\"step\""));
        assert!(!prompt.contains(NO_TRACE));
    }

    #[tokio::test]
    async fn synthesize_trims_model_output() {
        let synth = Synthesizer::new(LlmProvider::Dummy(
            crate::llm::providers::dummy::DummyProvider,
        ));
        let answer = synth.synthesize("q", "a", &[], &[]).await.unwrap();
        assert!(answer.starts_with("[echo]"));
        assert_eq!(answer, answer.trim());
    }
}
