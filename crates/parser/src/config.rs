//! # Parser Configuration
//!
//! [`ParserConfig`] selects an inference strategy and its budgets. It reads
//! from and writes to JSON; missing fields take their defaults.
//!
//! ```rust
//! use ccg_parser::config::{ParserConfig, Strategy};
//!
//! let config = ParserConfig::from_json(r#"{"strategy": "shift_reduce", "beam_size": 8}"#).unwrap();
//! assert_eq!(config.strategy, Strategy::ShiftReduce);
//! assert_eq!(config.num_threads, Some(1));
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ParserError;
use crate::inference::{
    CcgBeamSearchInference, CcgExactInference, CcgInference, Parallelism, SearchLimits,
    ShiftReduceInference,
};

/// Which search to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    #[default]
    Beam,
    Exact,
    ShiftReduce,
}

/// Strategy and budgets for one parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    pub strategy: Strategy,
    /// Entries kept per cell, and parses returned.
    pub beam_size: usize,
    pub max_parse_time_millis: Option<u64>,
    /// Entries allowed across the whole chart.
    pub max_chart_size: Option<usize>,
    /// `Some(1)` parses on the calling thread; `None` uses the global pool.
    pub num_threads: Option<usize>,
    /// Shift-reduce only; defaults to the sentence length plus one.
    pub max_stack_size: Option<usize>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::Beam,
            beam_size: 100,
            max_parse_time_millis: None,
            max_chart_size: None,
            num_threads: Some(1),
            max_stack_size: None,
        }
    }
}

impl ParserConfig {
    pub fn from_json(json: &str) -> Result<Self, ParserError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ParserError::invalid_config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ParserError> {
        serde_json::to_string_pretty(self).map_err(|e| ParserError::invalid_config(e.to_string()))
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_beam_size(mut self, beam_size: usize) -> Self {
        self.beam_size = beam_size;
        self
    }

    pub fn with_max_parse_time_millis(mut self, millis: u64) -> Self {
        self.max_parse_time_millis = Some(millis);
        self
    }

    pub fn with_max_chart_size(mut self, size: usize) -> Self {
        self.max_chart_size = Some(size);
        self
    }

    pub fn with_num_threads(mut self, num_threads: Option<usize>) -> Self {
        self.num_threads = num_threads;
        self
    }

    pub fn with_max_stack_size(mut self, size: usize) -> Self {
        self.max_stack_size = Some(size);
        self
    }

    pub fn validate(&self) -> Result<(), ParserError> {
        if self.beam_size == 0 {
            return Err(ParserError::invalid_config("beam_size must be positive"));
        }
        if self.num_threads == Some(0) {
            return Err(ParserError::invalid_config("num_threads must be positive"));
        }
        if self.max_stack_size == Some(0) {
            return Err(ParserError::invalid_config("max_stack_size must be positive"));
        }
        Ok(())
    }

    pub fn limits(&self) -> SearchLimits {
        SearchLimits {
            max_parse_time_millis: self.max_parse_time_millis,
            max_chart_size: self.max_chart_size,
        }
    }

    /// The configured strategy, with its worker pool if one is needed.
    pub fn build_inference(&self) -> Result<Box<dyn CcgInference>, ParserError> {
        self.validate()?;
        Ok(match self.strategy {
            Strategy::Beam => Box::new(
                CcgBeamSearchInference::new(self.beam_size)
                    .with_limits(self.limits())
                    .with_parallelism(Parallelism::from_num_threads(self.num_threads)?),
            ),
            Strategy::Exact => Box::new(
                CcgExactInference::new()
                    .with_limits(self.limits())
                    .with_parallelism(Parallelism::from_num_threads(self.num_threads)?),
            ),
            Strategy::ShiftReduce => Box::new(
                ShiftReduceInference::new(self.beam_size)
                    .with_max_stack_size(self.max_stack_size)
                    .with_limits(self.limits()),
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ParserConfig::default();
        assert_eq!(config.strategy, Strategy::Beam);
        assert_eq!(config.beam_size, 100);
        assert_eq!(config.num_threads, Some(1));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_json_round_trip() {
        let config = ParserConfig::default()
            .with_strategy(Strategy::Exact)
            .with_max_chart_size(5000)
            .with_num_threads(None);
        let json = config.to_json().unwrap();
        assert!(json.contains("\"exact\""));
        assert_eq!(ParserConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config = ParserConfig::from_json("{}").unwrap();
        assert_eq!(config, ParserConfig::default());
    }

    #[test]
    fn test_validate_rejects_zero_beam() {
        let err = ParserConfig::from_json(r#"{"beam_size": 0}"#).unwrap_err();
        assert!(matches!(err, ParserError::InvalidConfig { .. }));
        assert!(ParserConfig::default().with_num_threads(Some(0)).build_inference().is_err());
    }

    #[test]
    fn test_unknown_strategy_is_invalid() {
        assert!(ParserConfig::from_json(r#"{"strategy": "greedy"}"#).is_err());
    }
}
