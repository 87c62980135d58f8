//! Scripted in-process backends.
//!
//! Serve two purposes: the `backends.kind = "fixture"` config runs the whole
//! service offline (canned admissions data, no graph or vector service), and
//! the integration tests script exact backend behaviour — preset answers,
//! invocation counting, and arming the next N calls to fail.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::json;

use super::{BackendError, GraphAnswer, Passage, RetrievalError};

// ── Structured fixture ────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct FixtureGraph {
    inner: Arc<GraphInner>,
}

#[derive(Debug)]
struct GraphInner {
    answer: String,
    trace: Vec<serde_json::Value>,
    calls: AtomicUsize,
    fail_remaining: AtomicUsize,
}

impl Default for FixtureGraph {
    fn default() -> Self {
        Self::new(
            "MIT (rank 1), Stanford (rank 2) and Caltech (rank 3) lead the Top 10 tier.",
            vec![
                json!({"step": "match", "detail": "(u:University)-[:BELONGS_TO_TIER]->(t:Tier {name: 'Top 10'})"}),
                json!({"step": "return", "detail": "u.name, u.rank ORDER BY u.rank LIMIT 10"}),
            ],
        )
    }
}

impl FixtureGraph {
    pub fn new(answer: impl Into<String>, trace: Vec<serde_json::Value>) -> Self {
        Self {
            inner: Arc::new(GraphInner {
                answer: answer.into(),
                trace,
                calls: AtomicUsize::new(0),
                fail_remaining: AtomicUsize::new(0),
            }),
        }
    }

    /// Arm the next `n` calls to fail as unreachable.
    pub fn with_failures(self, n: usize) -> Self {
        self.inner.fail_remaining.store(n, Ordering::SeqCst);
        self
    }

    /// How many times `answer` has been invoked.
    pub fn calls(&self) -> usize {
        self.inner.calls.load(Ordering::SeqCst)
    }

    pub fn answer(&self, _question: &str) -> Result<GraphAnswer, BackendError> {
        self.inner.calls.fetch_add(1, Ordering::SeqCst);
        if take_failure(&self.inner.fail_remaining) {
            return Err(BackendError::Unreachable("fixture armed to fail".to_string()));
        }
        Ok(GraphAnswer {
            answer: self.inner.answer.clone(),
            trace: self.inner.trace.clone(),
        })
    }
}

// ── Semantic fixture ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct FixtureSemantic {
    inner: Arc<SemanticInner>,
}

#[derive(Debug)]
struct SemanticInner {
    passages: Vec<Passage>,
    calls: AtomicUsize,
    fail_remaining: AtomicUsize,
}

impl Default for FixtureSemantic {
    fn default() -> Self {
        Self::new(vec![
            Passage {
                text: "MIT's undergraduate tuition is roughly $57,000 per year; need-based aid covers full demonstrated need.".to_string(),
                source: Some("universities.json#mit".to_string()),
            },
            Passage {
                text: "Stanford requires SAT or ACT scores and recommends a GPA of 3.9 or higher for competitive applicants.".to_string(),
                source: Some("universities.json#stanford".to_string()),
            },
            Passage {
                text: "Caltech is highly selective with an acceptance rate near 3% and strong merit scholarship options.".to_string(),
                source: Some("universities.json#caltech".to_string()),
            },
        ])
    }
}

impl FixtureSemantic {
    pub fn new(passages: Vec<Passage>) -> Self {
        Self {
            inner: Arc::new(SemanticInner {
                passages,
                calls: AtomicUsize::new(0),
                fail_remaining: AtomicUsize::new(0),
            }),
        }
    }

    /// Arm the next `n` calls to fail as unavailable.
    pub fn with_failures(self, n: usize) -> Self {
        self.inner.fail_remaining.store(n, Ordering::SeqCst);
        self
    }

    /// How many times `retrieve` has been invoked.
    pub fn calls(&self) -> usize {
        self.inner.calls.load(Ordering::SeqCst)
    }

    pub fn retrieve(&self, top_k: usize) -> Result<Vec<Passage>, RetrievalError> {
        self.inner.calls.fetch_add(1, Ordering::SeqCst);
        if take_failure(&self.inner.fail_remaining) {
            return Err(RetrievalError::Unavailable("fixture armed to fail".to_string()));
        }
        Ok(self.inner.passages.iter().take(top_k).cloned().collect())
    }
}

/// Decrement-and-test for the armed-failure counters. Never underflows.
fn take_failure(remaining: &AtomicUsize) -> bool {
    remaining
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graph_fixture_counts_and_fails() {
        let g = FixtureGraph::default().with_failures(1);
        assert!(g.answer("q").is_err());
        assert!(g.answer("q").is_ok());
        assert_eq!(g.calls(), 2);
    }

    #[test]
    fn semantic_fixture_truncates_to_top_k() {
        let s = FixtureSemantic::default();
        assert_eq!(s.retrieve(2).unwrap().len(), 2);
        assert_eq!(s.retrieve(10).unwrap().len(), 3);
    }

    #[test]
    fn clones_share_counters() {
        let g = FixtureGraph::default();
        let g2 = g.clone();
        let _ = g2.answer("q");
        assert_eq!(g.calls(), 1);
    }
}
