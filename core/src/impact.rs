//! Rule-based security findings layered on top of structural changes.
//!
//! Rules are independent and additive. A single change may produce several
//! findings and nothing is suppressed.

use crate::diff::index::NameIndex;
use crate::model::{
    ChangeCategory, ChangeType, ContractModel, DiffChange, ExternalCall, Function, Mutability,
    SecurityImpact, Severity,
};
use std::collections::BTreeSet;

pub fn classify_security_impacts(
    changes: &[DiffChange],
    a: &ContractModel,
    b: &ContractModel,
) -> Vec<SecurityImpact> {
    let (a_functions, _) = NameIndex::build(ChangeCategory::Function, &a.functions);
    let (b_functions, _) = NameIndex::build(ChangeCategory::Function, &b.functions);

    let modified_functions: Vec<(&Function, &Function)> = changes
        .iter()
        .filter(|c| c.category == ChangeCategory::Function && c.change_type == ChangeType::Modified)
        .filter_map(|c| Some((a_functions.get(&c.name)?, b_functions.get(&c.name)?)))
        .collect();

    let mut impacts = Vec::new();
    removed_modifiers(changes, a, &mut impacts);
    relaxed_visibility(&modified_functions, &mut impacts);
    new_external_calls(&a_functions, &b_functions, &mut impacts);
    mutability_escalation(&modified_functions, &mut impacts);
    removed_events(changes, &mut impacts);
    impacts
}

/// A removed modifier that guarded functions in the old version.
fn removed_modifiers(changes: &[DiffChange], a: &ContractModel, out: &mut Vec<SecurityImpact>) {
    for change in changes {
        if change.category != ChangeCategory::Modifier || change.change_type != ChangeType::Removed
        {
            continue;
        }
        let guarded: Vec<&str> = a
            .functions
            .iter()
            .filter(|f| f.modifiers.iter().any(|m| *m == change.name))
            .map(Function::key)
            .collect();
        if guarded.is_empty() {
            continue;
        }
        out.push(SecurityImpact {
            change: format!("Modifier {} removed", change.name),
            impact: format!(
                "Functions previously guarded by {} may now be unprotected: {}",
                change.name,
                guarded.join(", ")
            ),
            severity: Severity::High,
            recommendation: Some(format!(
                "Confirm the checks from {} are enforced another way in {}",
                change.name,
                guarded.join(", ")
            )),
        });
    }
}

/// Visibility moved up the order private < internal < external < public.
fn relaxed_visibility(modified: &[(&Function, &Function)], out: &mut Vec<SecurityImpact>) {
    for (before, after) in modified {
        if after.visibility <= before.visibility {
            continue;
        }
        out.push(SecurityImpact {
            change: format!(
                "Function {} visibility changed from {} to {}",
                after.key(),
                before.visibility,
                after.visibility
            ),
            impact: format!(
                "{} is reachable by more callers than before",
                after.key()
            ),
            severity: Severity::Medium,
            recommendation: Some("Review access control on the newly exposed entry point".to_owned()),
        });
    }
}

/// Functions present in both versions that gained external calls.
fn new_external_calls(
    a_functions: &NameIndex<'_, Function>,
    b_functions: &NameIndex<'_, Function>,
    out: &mut Vec<SecurityImpact>,
) {
    for key in a_functions.keys() {
        let (Some(before), Some(after)) = (a_functions.get(key), b_functions.get(key)) else {
            continue;
        };
        if after.external_calls.len() <= before.external_calls.len() {
            continue;
        }
        let known: BTreeSet<&ExternalCall> = before.external_calls.iter().collect();
        let mut introduced: Vec<String> = Vec::new();
        for call in &after.external_calls {
            let rendered = call.to_string();
            if !known.contains(call) && !introduced.contains(&rendered) {
                introduced.push(rendered);
            }
        }
        if introduced.is_empty() {
            continue;
        }
        out.push(SecurityImpact {
            change: format!("Function {key} makes new external calls"),
            impact: format!("New external calls: {}", introduced.join(", ")),
            severity: Severity::Medium,
            recommendation: Some(
                "Check reentrancy and trust assumptions for the new call targets".to_owned(),
            ),
        });
    }
}

/// A read-only function that can now write state.
fn mutability_escalation(modified: &[(&Function, &Function)], out: &mut Vec<SecurityImpact>) {
    for (before, after) in modified {
        if !before.mutability.is_read_only() || after.mutability.is_read_only() {
            continue;
        }
        let payable = after.mutability == Mutability::Payable;
        out.push(SecurityImpact {
            change: format!(
                "Function {} mutability changed from {} to {}",
                after.key(),
                before.mutability,
                after.mutability
            ),
            impact: if payable {
                format!("{} can now receive funds and modify state", after.key())
            } else {
                format!("{} can now modify state", after.key())
            },
            severity: if payable {
                Severity::High
            } else {
                Severity::Medium
            },
            recommendation: Some("Callers treating this function as read-only must be updated".to_owned()),
        });
    }
}

fn removed_events(changes: &[DiffChange], out: &mut Vec<SecurityImpact>) {
    let removed: Vec<&str> = changes
        .iter()
        .filter(|c| c.category == ChangeCategory::Event && c.change_type == ChangeType::Removed)
        .map(|c| c.name.as_str())
        .collect();
    if removed.is_empty() {
        return;
    }
    out.push(SecurityImpact {
        change: format!("Events removed: {}", removed.join(", ")),
        impact: "Monitoring and indexers relying on these events lose visibility".to_owned(),
        severity: Severity::Low,
        recommendation: Some("Update off-chain monitoring before upgrading".to_owned()),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::diff_models;
    use crate::model::{Event, FunctionKind, LineSpan, Modifier, Visibility};

    fn func(name: &str, visibility: Visibility, mutability: Mutability) -> Function {
        Function {
            name: name.to_owned(),
            kind: FunctionKind::Function,
            is_constructor: false,
            visibility,
            mutability,
            parameters: vec![],
            returns: vec![],
            modifiers: vec![],
            span: LineSpan::default(),
            calls: BTreeSet::new(),
            external_calls: vec![],
            complexity: 1,
        }
    }

    fn call(contract: &str, function: &str) -> ExternalCall {
        ExternalCall {
            contract: contract.to_owned(),
            function: function.to_owned(),
        }
    }

    fn classify(a: &ContractModel, b: &ContractModel) -> Vec<SecurityImpact> {
        let changes = diff_models(a, b);
        classify_security_impacts(&changes, a, b)
    }

    #[test]
    fn test_removed_modifier_names_guarded_functions() {
        let mut a = ContractModel::default();
        a.modifiers.push(Modifier {
            name: "onlyOwner".to_owned(),
            parameters: vec![],
            span: LineSpan::default(),
        });
        for name in ["pause", "unpause", "deposit"] {
            let mut f = func(name, Visibility::External, Mutability::Nonpayable);
            if name != "deposit" {
                f.modifiers.push("onlyOwner".to_owned());
            }
            a.functions.push(f);
        }
        let mut b = a.clone();
        b.modifiers.clear();
        for f in &mut b.functions {
            f.modifiers.clear();
        }

        let impacts = classify(&a, &b);
        let high: Vec<&SecurityImpact> = impacts
            .iter()
            .filter(|i| i.severity == Severity::High)
            .collect();
        assert_eq!(high.len(), 1);
        assert!(high[0].impact.contains("pause, unpause"));
        assert!(!high[0].impact.contains("deposit"));
    }

    #[test]
    fn test_unused_removed_modifier_is_silent() {
        let mut a = ContractModel::default();
        a.modifiers.push(Modifier {
            name: "whenPaused".to_owned(),
            parameters: vec![],
            span: LineSpan::default(),
        });
        assert!(classify(&a, &ContractModel::default()).is_empty());
    }

    #[test]
    fn test_visibility_relaxation() {
        let mut a = ContractModel::default();
        a.functions.push(func("_mint", Visibility::Internal, Mutability::Nonpayable));
        a.functions.push(func("burn", Visibility::Public, Mutability::Nonpayable));
        let mut b = ContractModel::default();
        b.functions.push(func("_mint", Visibility::External, Mutability::Nonpayable));
        b.functions.push(func("burn", Visibility::External, Mutability::Nonpayable));

        let impacts = classify(&a, &b);
        assert_eq!(impacts.len(), 1);
        assert_eq!(impacts[0].severity, Severity::Medium);
        assert!(impacts[0].change.contains("_mint"));
    }

    #[test]
    fn test_only_new_external_calls_are_listed() {
        let mut before = func("swap", Visibility::External, Mutability::Nonpayable);
        before.external_calls = vec![call("router", "swap")];
        let mut after = before.clone();
        after.external_calls = vec![
            call("router", "swap"),
            call("oracle", "latest"),
            call("IERC20", "transfer"),
        ];
        let mut a = ContractModel::default();
        a.functions.push(before);
        let mut b = ContractModel::default();
        b.functions.push(after);

        // Bodies differ but signatures do not, so there is no structural change.
        let impacts = classify_security_impacts(&[], &a, &b);
        assert_eq!(impacts.len(), 1);
        assert_eq!(impacts[0].impact, "New external calls: oracle.latest, IERC20.transfer");
        assert!(!impacts[0].impact.contains("router"));
    }

    #[test]
    fn test_mutability_escalation_severity() {
        let mut a = ContractModel::default();
        a.functions.push(func("price", Visibility::External, Mutability::View));
        a.functions.push(func("quote", Visibility::External, Mutability::Pure));
        let mut b = ContractModel::default();
        b.functions.push(func("price", Visibility::External, Mutability::Nonpayable));
        b.functions.push(func("quote", Visibility::External, Mutability::Payable));

        let impacts = classify(&a, &b);
        let severities: Vec<Severity> = impacts.iter().map(|i| i.severity).collect();
        assert_eq!(severities, vec![Severity::Medium, Severity::High]);
    }

    #[test]
    fn test_removed_events_aggregate() {
        let event = |name: &str| Event {
            name: name.to_owned(),
            parameters: vec![],
            span: LineSpan::default(),
        };
        let mut a = ContractModel::default();
        a.events.extend([event("Deposit"), event("Withdraw"), event("Paused")]);
        let mut b = ContractModel::default();
        b.events.push(event("Paused"));

        let impacts = classify(&a, &b);
        assert_eq!(impacts.len(), 1);
        assert_eq!(impacts[0].severity, Severity::Low);
        assert_eq!(impacts[0].change, "Events removed: Deposit, Withdraw");
    }
}
