//! Optional semantic analysis layered over the rule-based results.
//!
//! The pipeline depends on a [`SemanticAnalyzer`] only through its
//! `analyze` call. Any failure falls back to [`rule_only`], so results
//! never depend on the collaborator for correctness.

#[cfg(feature = "claude")]
pub mod claude;
#[cfg(feature = "claude")]
pub mod prompt;

use crate::model::{
    AnalysisMode, BreakingChange, ChangeCategory, DiffChange, RiskLevel, SecurityImpact,
    SemanticAnalysis, Severity,
};
use futures::future::{self, BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::Write;
use std::time::Duration;
use thiserror::Error;

#[cfg(feature = "claude")]
pub use claude::ClaudeAnalyzer;

#[derive(Error, Debug)]
pub enum CollaboratorError {
    #[error("Semantic analyzer unavailable: {0}")]
    Unavailable(String),
    #[error("Analyzer command failed: {0}")]
    CommandFailed(String),
    #[error("Semantic analysis timed out after {0:?}")]
    Timeout(Duration),
    #[error("Semantic analysis aborted")]
    Aborted,
    #[error("Failed to parse analyzer response: {0}")]
    ParseError(String),
    #[error("Empty response from analyzer")]
    EmptyResponse,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One side of the comparison as sent to the analyzer.
#[derive(Debug, Clone, Serialize)]
pub struct RequestSource {
    pub name: String,
    pub source: String,
    pub truncated: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SemanticRequest {
    #[serde(rename = "contractA")]
    pub contract_a: RequestSource,
    #[serde(rename = "contractB")]
    pub contract_b: RequestSource,
    pub changes: Vec<DiffChange>,
    #[serde(rename = "securityImpacts")]
    pub security_impacts: Vec<SecurityImpact>,
}

impl SemanticRequest {
    pub fn new(
        (name_a, source_a): (&str, &str),
        (name_b, source_b): (&str, &str),
        changes: &[DiffChange],
        security_impacts: &[SecurityImpact],
        max_source_chars: usize,
    ) -> Self {
        let side = |name: &str, source: &str| {
            let (source, truncated) = truncate_source(source, max_source_chars);
            RequestSource {
                name: name.to_owned(),
                source,
                truncated,
            }
        };
        Self {
            contract_a: side(name_a, source_a),
            contract_b: side(name_b, source_b),
            changes: changes.to_vec(),
            security_impacts: security_impacts.to_vec(),
        }
    }
}

/// What the analyzer is expected to return. Missing fields read as empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SemanticResponse {
    #[serde(default)]
    pub summary: String,
    #[serde(default, rename = "breakingChanges")]
    pub breaking_changes: Vec<BreakingChange>,
    #[serde(default, rename = "securityImpacts")]
    pub security_impacts: Vec<SecurityImpact>,
    #[serde(default, rename = "migrationGuide")]
    pub migration_guide: String,
    #[serde(default, rename = "riskLevel")]
    pub risk_level: Option<RiskLevel>,
}

/// A collaborator that enriches structural findings.
///
/// The pipeline drops the returned future on timeout or abort, so an
/// implementation must release whatever it started when dropped.
pub trait SemanticAnalyzer: Send + Sync {
    fn analyze<'a>(
        &'a self,
        request: &'a SemanticRequest,
    ) -> BoxFuture<'a, Result<SemanticResponse, CollaboratorError>>;
}

/// Analyzer used in rule-only mode. Always unavailable.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAnalyzer;

impl SemanticAnalyzer for NoopAnalyzer {
    fn analyze<'a>(
        &'a self,
        _request: &'a SemanticRequest,
    ) -> BoxFuture<'a, Result<SemanticResponse, CollaboratorError>> {
        future::ready(Err(CollaboratorError::Unavailable(
            "semantic analysis is disabled".to_owned(),
        )))
        .boxed()
    }
}

/// Cut `source` to at most `max_chars` characters, appending a marker.
pub fn truncate_source(source: &str, max_chars: usize) -> (String, bool) {
    let Some((cut, _)) = source.char_indices().nth(max_chars) else {
        return (source.to_owned(), false);
    };
    let remaining = source[cut..].chars().count();
    let mut truncated = source[..cut].to_owned();
    let _ = write!(
        truncated,
        "\n// ... truncated ({remaining} more characters)"
    );
    (truncated, true)
}

/// Breaking structural changes in the payload's shape.
pub fn rule_breaking_changes(changes: &[DiffChange]) -> Vec<BreakingChange> {
    changes
        .iter()
        .filter(|c| c.is_breaking())
        .map(|c| BreakingChange {
            category: c.category,
            name: c.name.clone(),
            description: c.description.clone(),
        })
        .collect()
}

/// Overall risk from the findings present.
pub fn derive_risk(impacts: &[SecurityImpact], changes: &[DiffChange]) -> RiskLevel {
    let worst = impacts.iter().map(|i| i.severity).max();
    if worst == Some(Severity::Critical) {
        RiskLevel::Critical
    } else if worst == Some(Severity::High) {
        RiskLevel::High
    } else if changes.iter().any(DiffChange::is_breaking) {
        RiskLevel::Medium
    } else if !changes.is_empty() {
        RiskLevel::Low
    } else {
        RiskLevel::None
    }
}

/// Migration note synthesized from the breaking-change list.
pub fn migration_note(breaking: &[BreakingChange]) -> String {
    if breaking.is_empty() {
        return "No breaking changes detected; existing integrations need no migration.".to_owned();
    }
    let mut note = String::from("Integrators must account for these breaking changes:\n");
    for change in breaking {
        let _ = writeln!(note, "- [{}] {}: {}", change.category, change.name, change.description);
    }
    note.trim_end().to_owned()
}

fn rule_summary(changes: &[DiffChange], impacts: &[SecurityImpact]) -> String {
    if changes.is_empty() && impacts.is_empty() {
        return "No structural changes detected.".to_owned();
    }
    let breaking = changes.iter().filter(|c| c.is_breaking()).count();
    format!(
        "{} structural change(s), {} breaking, with {} security finding(s).",
        changes.len(),
        breaking,
        impacts.len()
    )
}

/// The payload produced without any collaborator.
pub fn rule_only(changes: &[DiffChange], impacts: &[SecurityImpact]) -> SemanticAnalysis {
    let breaking_changes = rule_breaking_changes(changes);
    SemanticAnalysis {
        mode: AnalysisMode::RuleOnly,
        summary: rule_summary(changes, impacts),
        migration_guide: migration_note(&breaking_changes),
        breaking_changes,
        security_impacts: impacts.to_vec(),
        risk_level: derive_risk(impacts, changes),
    }
}

/// Merge collaborator output into the rule-based findings.
///
/// Breaking changes dedupe on (category, name) and security impacts on
/// case-insensitive change text; rule-based entries come first and win.
pub fn merge(
    changes: &[DiffChange],
    impacts: &[SecurityImpact],
    response: SemanticResponse,
) -> SemanticAnalysis {
    let mut breaking_changes = rule_breaking_changes(changes);
    let mut seen: HashSet<(ChangeCategory, String)> = breaking_changes
        .iter()
        .map(|c| (c.category, c.name.clone()))
        .collect();
    for change in response.breaking_changes {
        if seen.insert((change.category, change.name.clone())) {
            breaking_changes.push(change);
        }
    }

    let mut security_impacts = impacts.to_vec();
    let mut seen_impacts: HashSet<String> =
        impacts.iter().map(|i| i.change.to_lowercase()).collect();
    for impact in response.security_impacts {
        if seen_impacts.insert(impact.change.to_lowercase()) {
            security_impacts.push(impact);
        }
    }

    let derived = derive_risk(&security_impacts, changes);
    let risk_level = response.risk_level.map_or(derived, |r| r.max(derived));

    let summary = if response.summary.trim().is_empty() {
        rule_summary(changes, &security_impacts)
    } else {
        response.summary
    };
    let migration_guide = if response.migration_guide.trim().is_empty() {
        migration_note(&breaking_changes)
    } else {
        response.migration_guide
    };

    SemanticAnalysis {
        mode: AnalysisMode::Collaborator,
        summary,
        breaking_changes,
        security_impacts,
        migration_guide,
        risk_level,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ChangeType;

    fn removed_function(name: &str, breaking: bool) -> DiffChange {
        DiffChange::new(
            ChangeType::Removed,
            ChangeCategory::Function,
            name,
            breaking,
            format!("Function {name} removed"),
        )
    }

    fn impact(change: &str, severity: Severity) -> SecurityImpact {
        SecurityImpact {
            change: change.to_owned(),
            impact: "impact".to_owned(),
            severity,
            recommendation: None,
        }
    }

    #[test]
    fn test_derive_risk_ladder() {
        let breaking = removed_function("transfer", true);
        let harmless = removed_function("_helper", false);

        assert_eq!(derive_risk(&[], &[]), RiskLevel::None);
        assert_eq!(derive_risk(&[], &[harmless.clone()]), RiskLevel::Low);
        assert_eq!(derive_risk(&[], &[breaking.clone()]), RiskLevel::Medium);
        assert_eq!(
            derive_risk(&[impact("x", Severity::Medium)], &[harmless.clone()]),
            RiskLevel::Low
        );
        assert_eq!(
            derive_risk(&[impact("x", Severity::High)], &[harmless]),
            RiskLevel::High
        );
        assert_eq!(
            derive_risk(&[impact("x", Severity::Critical)], &[]),
            RiskLevel::Critical
        );
    }

    #[test]
    fn test_rule_only_payload() {
        let changes = vec![removed_function("transfer", true)];
        let analysis = rule_only(&changes, &[]);
        assert_eq!(analysis.mode, AnalysisMode::RuleOnly);
        assert_eq!(analysis.breaking_changes.len(), 1);
        assert_eq!(analysis.risk_level, RiskLevel::Medium);
        assert!(analysis
            .migration_guide
            .contains("[function] transfer: Function transfer removed"));
    }

    #[test]
    fn test_merge_dedupes_rule_first() {
        let changes = vec![removed_function("transfer", true)];
        let impacts = vec![impact("Modifier onlyOwner removed", Severity::High)];
        let response = SemanticResponse {
            summary: "Ownership model reworked".to_owned(),
            breaking_changes: vec![
                BreakingChange {
                    category: ChangeCategory::Function,
                    name: "transfer".to_owned(),
                    description: "collaborator wording".to_owned(),
                },
                BreakingChange {
                    category: ChangeCategory::Event,
                    name: "transfer".to_owned(),
                    description: "different category".to_owned(),
                },
            ],
            security_impacts: vec![
                impact("MODIFIER ONLYOWNER REMOVED", Severity::Low),
                impact("Oracle dependency added", Severity::Medium),
            ],
            migration_guide: String::new(),
            risk_level: Some(RiskLevel::Low),
        };

        let merged = merge(&changes, &impacts, response);
        assert_eq!(merged.mode, AnalysisMode::Collaborator);
        assert_eq!(merged.summary, "Ownership model reworked");
        assert_eq!(merged.breaking_changes.len(), 2);
        assert_eq!(merged.breaking_changes[0].description, "Function transfer removed");
        assert_eq!(merged.security_impacts.len(), 2);
        assert_eq!(merged.security_impacts[0].severity, Severity::High);
        // the collaborator cannot lower the rule-derived risk
        assert_eq!(merged.risk_level, RiskLevel::High);
        assert!(merged.migration_guide.contains("[event] transfer"));
    }

    #[test]
    fn test_truncate_source_on_char_boundary() {
        let (text, truncated) = truncate_source("contract Ünïcode {}", 10);
        assert!(truncated);
        assert!(text.starts_with("contract Ü"));
        assert!(text.ends_with("(9 more characters)"));

        let (text, truncated) = truncate_source("short", 10);
        assert!(!truncated);
        assert_eq!(text, "short");
    }

    #[test]
    fn test_response_tolerates_missing_fields() {
        let response: SemanticResponse =
            serde_json::from_str(r#"{"summary": "ok", "riskLevel": "high"}"#).unwrap();
        assert_eq!(response.summary, "ok");
        assert!(response.breaking_changes.is_empty());
        assert_eq!(response.risk_level, Some(RiskLevel::High));
    }

    #[tokio::test]
    async fn test_noop_analyzer_is_unavailable() {
        let request = SemanticRequest::new(("A", ""), ("B", ""), &[], &[], 100);
        assert!(matches!(
            NoopAnalyzer.analyze(&request).await,
            Err(CollaboratorError::Unavailable(_))
        ));
    }
}
