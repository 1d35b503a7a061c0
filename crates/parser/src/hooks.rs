//! Parse hooks for observability.
//!
//! Hooks observe chart construction without changing its results. Every
//! inference strategy reports through a [`ParseHook`].
//!
//! ## Events
//!
//! - `on_parse_start` / `on_parse_end`: Around one parse call
//! - `on_terminals`: After lexical entries are placed in the chart
//! - `on_span_complete` / `on_level_complete`: As the chart fills
//! - `on_timer_start` / `on_timer_stop`: Around named parse phases
//! - `on_abort`: When a time or size budget runs out
//!
//! ## Example
//!
//! ```rust
//! use ccg_parser::hooks::{CompositeHook, LoggingHook, NullHook, ParseHook};
//!
//! let hook = CompositeHook::new().with(NullHook).with(LoggingHook::new());
//! hook.on_level_complete(1, 12);
//! ```

use crate::inference::AbortReason;
use crate::sentence::TaggedSentence;

// ============================================================================
// Parse Hook Trait
// ============================================================================

/// Trait for observing parse events.
///
/// All methods have default no-op implementations. Hooks may be called
/// from worker threads while a chart level is filled in parallel.
pub trait ParseHook: Send + Sync {
    /// Called before the chart is initialized.
    fn on_parse_start(&self, _sentence: &TaggedSentence) {}

    /// Called once lexical entries are in the chart.
    ///
    /// # Arguments
    /// * `num_entries` - Terminal entries across all spans
    fn on_terminals(&self, _num_entries: usize) {}

    /// Called when the cell of an inclusive span is complete.
    fn on_span_complete(&self, _start: usize, _end: usize, _num_entries: usize) {}

    /// Called after every span of a given length has been filled.
    ///
    /// # Arguments
    /// * `level` - Span length minus one (shift-reduce reports rounds)
    /// * `chart_size` - Entries in the chart so far
    fn on_level_complete(&self, _level: usize, _chart_size: usize) {}

    /// Called when a named phase starts.
    fn on_timer_start(&self, _name: &str) {}

    /// Called when a named phase ends.
    fn on_timer_stop(&self, _name: &str) {}

    /// Called when a budget is exhausted; the parse then yields nothing.
    fn on_abort(&self, _reason: AbortReason) {}

    /// Called with the number of parses returned.
    fn on_parse_end(&self, _num_parses: usize) {}
}

// ============================================================================
// Null Hook (Default)
// ============================================================================

/// A no-op hook implementation for when no observation is needed.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullHook;

impl ParseHook for NullHook {}

// ============================================================================
// Logging Hook
// ============================================================================

/// A hook that logs parse events to stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingHook {
    /// Whether to log per-span and timer events
    pub verbose: bool,
}

impl LoggingHook {
    /// Create a new logging hook.
    pub fn new() -> Self {
        Self { verbose: false }
    }

    /// Create a verbose logging hook.
    pub fn verbose() -> Self {
        Self { verbose: true }
    }
}

impl ParseHook for LoggingHook {
    fn on_parse_start(&self, sentence: &TaggedSentence) {
        println!("[Hook] Parsing {} word(s): {}", sentence.len(), sentence);
    }

    fn on_terminals(&self, num_entries: usize) {
        println!("[Hook] {} terminal entries", num_entries);
    }

    fn on_span_complete(&self, start: usize, end: usize, num_entries: usize) {
        if self.verbose {
            println!("[Hook] Span {}..={}: {} entries", start, end, num_entries);
        }
    }

    fn on_level_complete(&self, level: usize, chart_size: usize) {
        println!("[Hook] Level {} complete, chart size {}", level, chart_size);
    }

    fn on_timer_start(&self, name: &str) {
        if self.verbose {
            println!("[Hook] Timer '{}' started", name);
        }
    }

    fn on_timer_stop(&self, name: &str) {
        if self.verbose {
            println!("[Hook] Timer '{}' stopped", name);
        }
    }

    fn on_abort(&self, reason: AbortReason) {
        println!("[Hook] Parse aborted: {}", reason);
    }

    fn on_parse_end(&self, num_parses: usize) {
        println!("[Hook] Parse finished with {} parse(s)", num_parses);
    }
}

// ============================================================================
// Composite Hook
// ============================================================================

/// A hook that delegates to multiple inner hooks.
pub struct CompositeHook {
    hooks: Vec<Box<dyn ParseHook>>,
}

impl CompositeHook {
    /// Create a new composite hook.
    pub fn new() -> Self {
        Self { hooks: Vec::new() }
    }

    /// Add a hook to the composite.
    pub fn with<H: ParseHook + 'static>(mut self, hook: H) -> Self {
        self.hooks.push(Box::new(hook));
        self
    }
}

impl Default for CompositeHook {
    fn default() -> Self {
        Self::new()
    }
}

impl ParseHook for CompositeHook {
    fn on_parse_start(&self, sentence: &TaggedSentence) {
        for hook in &self.hooks {
            hook.on_parse_start(sentence);
        }
    }

    fn on_terminals(&self, num_entries: usize) {
        for hook in &self.hooks {
            hook.on_terminals(num_entries);
        }
    }

    fn on_span_complete(&self, start: usize, end: usize, num_entries: usize) {
        for hook in &self.hooks {
            hook.on_span_complete(start, end, num_entries);
        }
    }

    fn on_level_complete(&self, level: usize, chart_size: usize) {
        for hook in &self.hooks {
            hook.on_level_complete(level, chart_size);
        }
    }

    fn on_timer_start(&self, name: &str) {
        for hook in &self.hooks {
            hook.on_timer_start(name);
        }
    }

    fn on_timer_stop(&self, name: &str) {
        for hook in &self.hooks {
            hook.on_timer_stop(name);
        }
    }

    fn on_abort(&self, reason: AbortReason) {
        for hook in &self.hooks {
            hook.on_abort(reason);
        }
    }

    fn on_parse_end(&self, num_parses: usize) {
        for hook in &self.hooks {
            hook.on_parse_end(num_parses);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingHook {
        levels: Arc<AtomicUsize>,
        aborts: Arc<AtomicUsize>,
    }

    impl ParseHook for CountingHook {
        fn on_level_complete(&self, _level: usize, _chart_size: usize) {
            self.levels.fetch_add(1, Ordering::SeqCst);
        }

        fn on_abort(&self, _reason: AbortReason) {
            self.aborts.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_null_hook() {
        let hook = NullHook;
        hook.on_level_complete(1, 10);
        hook.on_abort(AbortReason::Timeout);
    }

    #[test]
    fn test_logging_hook() {
        let hook = LoggingHook::verbose();
        assert!(hook.verbose);
        hook.on_span_complete(0, 1, 3);
        hook.on_timer_start("ccg_parse/decode");
    }

    #[test]
    fn test_composite_hook() {
        let levels = Arc::new(AtomicUsize::new(0));
        let aborts = Arc::new(AtomicUsize::new(0));
        let composite = CompositeHook::new()
            .with(CountingHook {
                levels: levels.clone(),
                aborts: aborts.clone(),
            })
            .with(CountingHook {
                levels: levels.clone(),
                aborts: aborts.clone(),
            });

        composite.on_level_complete(1, 4);
        composite.on_abort(AbortReason::ChartSizeExceeded);

        assert_eq!(levels.load(Ordering::SeqCst), 2);
        assert_eq!(aborts.load(Ordering::SeqCst), 2);
    }
}
