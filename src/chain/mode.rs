//! Request mode control.
//!
//! The process keeps one mutable default mode; each request may carry a
//! typed override that wins for that call only.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

/// Which backends a request consults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Structured graph backend only (faster).
    GraphOnly,
    /// Graph backend plus semantic retrieval.
    Hybrid,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::GraphOnly => "graph_only",
            Mode::Hybrid => "hybrid",
        }
    }

    pub fn is_graph_only(&self) -> bool {
        matches!(self, Mode::GraphOnly)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Process-wide default mode.
///
/// Two variants, so the default lives in an `AtomicBool` — reads are
/// lock-free and a `set_default` is visible to every request dispatched
/// after it returns. Requests already in flight keep the mode they resolved
/// at dispatch.
#[derive(Debug)]
pub struct ModeController {
    graph_only: AtomicBool,
}

impl ModeController {
    pub fn new(default_mode: Mode) -> Self {
        Self {
            graph_only: AtomicBool::new(default_mode.is_graph_only()),
        }
    }

    pub fn default_mode(&self) -> Mode {
        if self.graph_only.load(Ordering::SeqCst) {
            Mode::GraphOnly
        } else {
            Mode::Hybrid
        }
    }

    pub fn set_default(&self, mode: Mode) {
        self.graph_only.store(mode.is_graph_only(), Ordering::SeqCst);
    }

    /// Resolve the mode for one request: override wins, else the current
    /// default at the moment of dispatch.
    pub fn effective(&self, override_mode: Option<Mode>) -> Mode {
        override_mode.unwrap_or_else(|| self.default_mode())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_wins_over_default() {
        let ctl = ModeController::new(Mode::Hybrid);
        assert_eq!(ctl.effective(Some(Mode::GraphOnly)), Mode::GraphOnly);
        assert_eq!(ctl.effective(None), Mode::Hybrid);
    }

    #[test]
    fn set_default_is_visible() {
        let ctl = ModeController::new(Mode::GraphOnly);
        ctl.set_default(Mode::Hybrid);
        assert_eq!(ctl.default_mode(), Mode::Hybrid);
        assert_eq!(ctl.effective(None), Mode::Hybrid);
    }

    #[test]
    fn mode_serde_names() {
        assert_eq!(serde_json::to_string(&Mode::GraphOnly).unwrap(), "\"graph_only\"");
        assert_eq!(serde_json::to_string(&Mode::Hybrid).unwrap(), "\"hybrid\"");
    }
}
