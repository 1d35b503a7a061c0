//! # Parse Timing
//!
//! [`TimingHook`] turns the named timer events of a parse into a tree of
//! [`TraceNode`]s. Timers may nest; a timer started while another is running
//! becomes its child.
//!
//! ```rust
//! use ccg_parser::hooks::ParseHook;
//! use ccg_parser::trace::TimingHook;
//!
//! let hook = TimingHook::new();
//! hook.on_timer_start("ccg_parse/initialize_chart");
//! hook.on_timer_stop("ccg_parse/initialize_chart");
//! assert_eq!(hook.traces()[0].name, "ccg_parse/initialize_chart");
//! ```

use std::fmt::Write;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::hooks::ParseHook;

/// A node in the trace tree, recording timing and hierarchy.
#[derive(Debug, Clone)]
pub struct TraceNode {
    /// The name of the timed phase
    pub name: String,
    /// How long the phase took
    pub duration: Duration,
    /// Phases nested inside this one
    pub children: Vec<TraceNode>,
}

impl TraceNode {
    /// Create a new trace node.
    pub fn new(name: impl Into<String>, duration: Duration) -> Self {
        Self {
            name: name.into(),
            duration,
            children: Vec::new(),
        }
    }

    /// Add children, in order.
    pub fn with_children(mut self, children: Vec<TraceNode>) -> Self {
        self.children.extend(children);
        self
    }

    /// Find a node by name, depth first.
    pub fn find(&self, name: &str) -> Option<&TraceNode> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(name))
    }

    /// Pretty-print the trace tree.
    pub fn display(&self) -> String {
        self.display_indent(0)
    }

    fn display_indent(&self, indent: usize) -> String {
        let mut out = String::new();
        let prefix = "  ".repeat(indent);
        let _ = writeln!(out, "{}[{:?}] {}", prefix, self.duration, self.name);
        for child in &self.children {
            out.push_str(&child.display_indent(indent + 1));
        }
        out
    }
}

impl std::fmt::Display for TraceNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

struct OpenTimer {
    name: String,
    started: Instant,
    children: Vec<TraceNode>,
}

#[derive(Default)]
struct TimerState {
    open: Vec<OpenTimer>,
    finished: Vec<TraceNode>,
}

/// A hook that records parse phases as [`TraceNode`] trees.
#[derive(Default)]
pub struct TimingHook {
    state: Mutex<TimerState>,
}

impl TimingHook {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, TimerState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Completed top-level phases, in the order they finished.
    pub fn traces(&self) -> Vec<TraceNode> {
        self.state().finished.clone()
    }

    /// Total time of completed top-level phases with the given name.
    pub fn total(&self, name: &str) -> Duration {
        self.state()
            .finished
            .iter()
            .filter(|t| t.name == name)
            .map(|t| t.duration)
            .sum()
    }

    /// Discard all recorded phases.
    pub fn reset(&self) {
        *self.state() = TimerState::default();
    }
}

impl ParseHook for TimingHook {
    fn on_timer_start(&self, name: &str) {
        self.state().open.push(OpenTimer {
            name: name.to_string(),
            started: Instant::now(),
            children: Vec::new(),
        });
    }

    fn on_timer_stop(&self, name: &str) {
        let mut guard = self.state();
        let state = &mut *guard;
        let Some(position) = state.open.iter().rposition(|t| t.name == name) else {
            return;
        };
        // Timers opened after this one and never stopped are closed with it.
        while state.open.len() > position {
            let Some(timer) = state.open.pop() else {
                break;
            };
            let node = TraceNode::new(timer.name, timer.started.elapsed()).with_children(timer.children);
            match state.open.last_mut() {
                Some(parent) => parent.children.push(node),
                None => state.finished.push(node),
            }
        }
    }
}
