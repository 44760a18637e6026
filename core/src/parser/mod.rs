//! Structural parser for Solidity source.
//!
//! Source text is parsed with tree-sitter (which tolerates dirty input),
//! lowered into the typed `ast`, and then reduced to a `ContractModel`.
//! Pragma and imports are recovered by text scans.

pub mod ast;
pub mod extract;
pub mod lower;
pub mod scan;

use crate::model::ContractModel;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Failed to load Solidity grammar: {0}")]
    Language(String),
    #[error("Source could not be parsed: {0}")]
    Unparseable(String),
}

/// Parse source text (possibly several concatenated files) into a model
/// of its main contract.
pub fn parse(source: &str) -> Result<ContractModel, ParseError> {
    let unit = lower::parse_source(source)?;
    let model = extract::build_model(source, &unit);
    log::debug!(
        "[parser] Parsed {} ({} functions, {} events, {} variables)",
        model.name,
        model.functions.len(),
        model.events.len(),
        model.variables.len()
    );
    Ok(model)
}

/// Parse, substituting an empty model when the source is unparseable.
///
/// Returns the parse error alongside so callers can report the fallback.
pub fn parse_or_empty(source: &str) -> (ContractModel, Option<ParseError>) {
    match parse(source) {
        Ok(model) => (model, None),
        Err(e) => {
            log::warn!("[parser] {e}; substituting an empty model");
            (ContractModel::empty(), Some(e))
        }
    }
}
