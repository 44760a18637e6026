//! Structural parsing, diffing and impact classification for smart-contract
//! source.

pub mod callgraph;
pub mod compare;
pub mod config;
pub mod diff;
pub mod error;
pub mod impact;
pub mod model;
pub mod parser;
pub mod semantic;

#[cfg(feature = "cli")]
pub mod cli;

pub use compare::{compare, compare_with_analysis, rule_only_analysis, ContractSource};
pub use config::AnalysisConfig;
pub use diff::{diff_lines, diff_models};
pub use error::AppError;
pub use impact::classify_security_impacts;
pub use parser::parse;
