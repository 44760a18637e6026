use super::SemanticRequest;
use std::fmt::Write;

/// Build the prompt sent to the analyzer backend.
///
/// The structural findings are passed as JSON so the response can refer
/// back to them by category and name.
pub fn build_analysis_prompt(request: &SemanticRequest) -> String {
    let mut prompt = String::new();

    let _ = write!(
        prompt,
        "You are a smart-contract security reviewer. Two versions of a Solidity contract \
         are shown below together with the structural differences and preliminary security \
         findings computed by a deterministic analyzer. Explain what changed for integrators \
         and auditors.\n\n\
         ## Output format\n\n\
         Respond with ONLY a JSON object (no fences, no explanation) with these keys:\n\
         - `summary`: two or three sentences describing the change.\n\
         - `breakingChanges`: array of `{{\"category\", \"name\", \"description\"}}` for breaking \
           changes NOT already listed below. `category` is one of function, event, variable, \
           modifier, import, inheritance.\n\
         - `securityImpacts`: array of `{{\"change\", \"impact\", \"severity\", \"recommendation\"}}` \
           for findings NOT already listed below. `severity` is one of critical, high, medium, \
           low, info.\n\
         - `migrationGuide`: concrete steps an integrator must take, as plain text.\n\
         - `riskLevel`: one of none, low, medium, high, critical.\n\n"
    );

    for (label, side) in [("Old", &request.contract_a), ("New", &request.contract_b)] {
        let _ = writeln!(prompt, "## {label} version: {}", side.name);
        if side.truncated {
            let _ = writeln!(prompt, "(source truncated)");
        }
        let _ = writeln!(prompt, "```solidity\n{}\n```\n", side.source);
    }

    let changes = serde_json::to_string_pretty(&request.changes).unwrap_or_default();
    let _ = writeln!(prompt, "## Structural changes\n\n{changes}\n");

    let impacts = serde_json::to_string_pretty(&request.security_impacts).unwrap_or_default();
    let _ = writeln!(prompt, "## Preliminary security findings\n\n{impacts}");

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ChangeCategory, ChangeType, DiffChange};

    #[test]
    fn test_prompt_contains_sources_and_changes() {
        let change = DiffChange::new(
            ChangeType::Removed,
            ChangeCategory::Function,
            "transfer",
            true,
            "Function transfer removed",
        );
        let request = SemanticRequest::new(
            ("TokenV1", "contract TokenV1 {}"),
            ("TokenV2", "contract TokenV2 {}"),
            &[change],
            &[],
            10,
        );
        let prompt = build_analysis_prompt(&request);
        assert!(prompt.contains("## Old version: TokenV1"));
        assert!(prompt.contains("## New version: TokenV2"));
        assert!(prompt.contains("(source truncated)"));
        assert!(prompt.contains("\"name\": \"transfer\""));
        assert!(prompt.contains("\"riskLevel\"") || prompt.contains("`riskLevel`"));
    }
}
