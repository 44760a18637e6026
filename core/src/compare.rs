//! End-to-end comparison of two contract sources.
//!
//! Parsing and diffing are synchronous and pure. The only suspension point
//! is the optional semantic analyzer, which runs under a timeout and may be
//! aborted. Either drops the analyzer's future, and every failure there
//! yields the rule-only payload instead of an error.

use crate::config::AnalysisConfig;
use crate::diff::lines::{count_changes, diff_lines_with_limit};
use crate::diff::structural::diff_models_detailed;
use crate::impact::classify_security_impacts;
use crate::model::{
    ContractIdentity, ContractModel, Degradation, DiffResult, DiffStats, SecurityImpact,
};
use crate::parser;
use crate::semantic::{self, CollaboratorError, SemanticAnalyzer, SemanticRequest};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tokio::sync::Notify;

/// One side of a comparison.
#[derive(Debug, Clone, Default)]
pub struct ContractSource {
    pub source: String,
    pub address: Option<String>,
}

impl ContractSource {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            address: None,
        }
    }

    #[must_use]
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }
}

/// Hex of the first 8 bytes of the SHA-256 of `source`.
pub fn source_hash(source: &str) -> String {
    let digest = Sha256::digest(source.as_bytes());
    hex::encode(&digest[..8])
}

fn identity(model: &ContractModel, side: &ContractSource) -> ContractIdentity {
    ContractIdentity {
        address: side.address.clone(),
        name: model.name.clone(),
        source_hash: source_hash(&side.source),
        source: side.source.clone(),
    }
}

/// Deterministic part of a comparison, before any semantic payload.
struct Prepared {
    result: DiffResult,
    impacts: Vec<SecurityImpact>,
}

fn prepare(a: &ContractSource, b: &ContractSource, config: &AnalysisConfig) -> Prepared {
    let mut degraded = Vec::new();
    let mut parse_side = |label: &str, side: &ContractSource| {
        let (model, error) = parser::parse_or_empty(&side.source);
        if let Some(e) = error {
            degraded.push(Degradation {
                component: format!("parser:{label}"),
                reason: e.to_string(),
            });
        }
        model
    };
    let model_a = parse_side("a", a);
    let model_b = parse_side("b", b);

    let structural = diff_models_detailed(&model_a, &model_b);
    degraded.extend(structural.degraded);
    let impacts = classify_security_impacts(&structural.changes, &model_a, &model_b);

    let lines = diff_lines_with_limit(&a.source, &b.source, config.lcs_cell_limit);
    let (lines_added, lines_removed) = count_changes(&lines);
    let mut stats = DiffStats {
        lines_added,
        lines_removed,
        ..DiffStats::default()
    };
    stats.record_changes(&structural.changes);

    log::info!(
        "[compare] {} -> {}: {} changes, {} findings, +{} -{} lines",
        model_a.name,
        model_b.name,
        structural.changes.len(),
        impacts.len(),
        lines_added,
        lines_removed
    );

    Prepared {
        result: DiffResult {
            contract_a: identity(&model_a, a),
            contract_b: identity(&model_b, b),
            changes: structural.changes,
            stats,
            semantic: None,
            degraded,
        },
        impacts,
    }
}

/// Structural comparison without a semantic payload.
pub fn compare(a: &ContractSource, b: &ContractSource, config: &AnalysisConfig) -> DiffResult {
    prepare(a, b, config).result
}

/// Structural comparison with the rule-only semantic payload.
pub fn rule_only_analysis(
    a: &ContractSource,
    b: &ContractSource,
    config: &AnalysisConfig,
) -> DiffResult {
    let Prepared {
        mut result,
        impacts,
    } = prepare(a, b, config);
    result.semantic = Some(semantic::rule_only(&result.changes, &impacts));
    result
}

/// Full comparison including the semantic analyzer.
///
/// A timeout, a notification on `abort`, or any analyzer error falls back
/// to the rule-only payload and is recorded in `degraded`.
pub async fn compare_with_analysis(
    a: &ContractSource,
    b: &ContractSource,
    config: &AnalysisConfig,
    analyzer: Arc<dyn SemanticAnalyzer>,
    abort: Option<Arc<Notify>>,
) -> DiffResult {
    let Prepared {
        mut result,
        impacts,
    } = prepare(a, b, config);

    let request = SemanticRequest::new(
        (result.contract_a.name.as_str(), a.source.as_str()),
        (result.contract_b.name.as_str(), b.source.as_str()),
        &result.changes,
        &impacts,
        config.max_source_chars,
    );

    let outcome = run_analyzer(analyzer.as_ref(), &request, config, abort).await;
    result.semantic = Some(match outcome {
        Ok(response) => semantic::merge(&result.changes, &impacts, response),
        Err(e) => {
            log::warn!("[semantic] Falling back to rule-only analysis: {e}");
            result.degraded.push(Degradation {
                component: "semantic".to_owned(),
                reason: e.to_string(),
            });
            semantic::rule_only(&result.changes, &impacts)
        }
    });
    result
}

async fn run_analyzer(
    analyzer: &dyn SemanticAnalyzer,
    request: &SemanticRequest,
    config: &AnalysisConfig,
    abort: Option<Arc<Notify>>,
) -> Result<semantic::SemanticResponse, CollaboratorError> {
    let budget = config.semantic_timeout;
    let call = async {
        tokio::time::timeout(budget, analyzer.analyze(request))
            .await
            .unwrap_or(Err(CollaboratorError::Timeout(budget)))
    };

    match abort {
        Some(abort) => {
            tokio::select! {
                result = call => result,
                () = abort.notified() => Err(CollaboratorError::Aborted),
            }
        }
        None => call.await,
    }
}
