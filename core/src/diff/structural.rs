//! Category-by-category comparison of two contract models.
//!
//! Each comparator walks A's entities in declaration order (removed and
//! modified), then B's (added). Comparators are independent: an entity
//! that cannot be resolved is skipped, and its category is reported as
//! degraded while every other category still contributes its changes.

use super::index::{Keyed, NameIndex};
use super::signature::{
    event_signature, function_signature, modifier_signature, normalize_type, type_list,
    variable_signature,
};
use super::DiffError;
use crate::model::{
    ChangeCategory, ChangeType, ContractModel, DiffChange, Degradation, Event, Function,
    FunctionKind, Import, Modifier, Variable, Visibility,
};

/// Changes plus any categories that could not be fully compared.
#[derive(Debug, Clone, Default)]
pub struct StructuralDiff {
    pub changes: Vec<DiffChange>,
    pub degraded: Vec<Degradation>,
}

/// Outcome of one category comparator.
#[derive(Default)]
struct Comparison {
    changes: Vec<DiffChange>,
    skipped: Vec<DiffError>,
}

impl Comparison {
    fn record(&mut self, result: Result<Option<DiffChange>, DiffError>) {
        match result {
            Ok(Some(change)) => self.changes.push(change),
            Ok(None) => {}
            Err(e) => {
                log::warn!("[diff] Skipping entity: {e}");
                self.skipped.push(e);
            }
        }
    }
}

/// Compare two models, returning every structural change.
pub fn diff_models(a: &ContractModel, b: &ContractModel) -> Vec<DiffChange> {
    diff_models_detailed(a, b).changes
}

pub fn diff_models_detailed(a: &ContractModel, b: &ContractModel) -> StructuralDiff {
    let mut result = StructuralDiff::default();

    for category in ChangeCategory::ALL {
        let comparison = match category {
            ChangeCategory::Function => compare_functions(a, b),
            ChangeCategory::Event => compare_events(a, b),
            ChangeCategory::Variable => compare_variables(a, b),
            ChangeCategory::Modifier => compare_modifiers(a, b),
            ChangeCategory::Import => compare_imports(a, b),
            ChangeCategory::Inheritance => compare_inheritance(a, b),
        };

        if !comparison.skipped.is_empty() {
            let reasons: Vec<String> = comparison.skipped.iter().map(ToString::to_string).collect();
            result.degraded.push(Degradation {
                component: format!("comparator:{category}"),
                reason: reasons.join("; "),
            });
        }
        result.changes.extend(comparison.changes);
    }

    log::debug!(
        "[diff] {} vs {}: {} changes",
        a.name,
        b.name,
        result.changes.len()
    );
    result
}

/// Shared walk: removed/modified over A's keys, then added over B's keys.
fn compare_by_key<'a, T: Keyed>(
    category: ChangeCategory,
    a_items: &'a [T],
    b_items: &'a [T],
    mut removed: impl FnMut(&'a T) -> DiffChange,
    mut modified: impl FnMut(&'a T, &'a T) -> Option<DiffChange>,
    mut added: impl FnMut(&'a T) -> DiffChange,
) -> Comparison {
    let (a_index, a_malformed) = NameIndex::build(category, a_items);
    let (b_index, b_malformed) = NameIndex::build(category, b_items);
    let mut comparison = Comparison {
        changes: Vec::new(),
        skipped: a_malformed.into_iter().chain(b_malformed).collect(),
    };

    for key in a_index.keys() {
        let result = a_index.require(key).map(|before| match b_index.get(key) {
            Some(after) => modified(before, after),
            None => Some(removed(before)),
        });
        comparison.record(result);
    }

    for key in b_index.keys() {
        if a_index.contains(key) {
            continue;
        }
        let result = b_index.require(key).map(|after| Some(added(after)));
        comparison.record(result);
    }

    comparison
}

// --- Functions ---

fn compare_functions(a: &ContractModel, b: &ContractModel) -> Comparison {
    compare_by_key(
        ChangeCategory::Function,
        &a.functions,
        &b.functions,
        |func| {
            let breaking = is_callable_api(func);
            let change = DiffChange::new(
                ChangeType::Removed,
                ChangeCategory::Function,
                func.key(),
                breaking,
                format!("Function {} removed", func.key()),
            )
            .with_before(function_signature(func));
            if breaking {
                change.with_explanation(format!(
                    "Callers of the {} function {} will fail",
                    func.visibility,
                    func.key()
                ))
            } else {
                change
            }
        },
        |before, after| {
            let before_sig = function_signature(before);
            let after_sig = function_signature(after);
            if before_sig == after_sig {
                return None;
            }

            let mut changed = Vec::new();
            let params_changed = type_list(&before.parameters) != type_list(&after.parameters);
            let returns_changed = type_list(&before.returns) != type_list(&after.returns);
            let visibility_changed = before.visibility != after.visibility;
            let mutability_changed = before.mutability != after.mutability;
            if params_changed {
                changed.push("parameters");
            }
            if returns_changed {
                changed.push("return values");
            }
            if visibility_changed {
                changed.push("visibility");
            }
            if mutability_changed {
                changed.push("mutability");
            }
            if before.modifiers != after.modifiers {
                changed.push("modifiers");
            }

            let interface_changed =
                params_changed || returns_changed || visibility_changed || mutability_changed;
            let exposed = is_callable_api(before) || is_callable_api(after);
            let breaking = exposed && interface_changed;

            let change = DiffChange::new(
                ChangeType::Modified,
                ChangeCategory::Function,
                after.key(),
                breaking,
                format!("Function {} changed: {}", after.key(), changed.join(", ")),
            )
            .with_before(before_sig)
            .with_after(after_sig);
            Some(if breaking {
                change.with_explanation("The external interface of this function changed")
            } else {
                change
            })
        },
        |func| {
            DiffChange::new(
                ChangeType::Added,
                ChangeCategory::Function,
                func.key(),
                false,
                format!("Function {} added", func.key()),
            )
            .with_after(function_signature(func))
        },
    )
}

/// Externally callable after deployment.
fn is_callable_api(func: &Function) -> bool {
    match func.kind {
        FunctionKind::Constructor => false,
        FunctionKind::Function | FunctionKind::Fallback | FunctionKind::Receive => {
            func.visibility.is_externally_visible()
        }
    }
}

// --- Events ---

fn compare_events(a: &ContractModel, b: &ContractModel) -> Comparison {
    compare_by_key(
        ChangeCategory::Event,
        &a.events,
        &b.events,
        |event: &Event| {
            DiffChange::new(
                ChangeType::Removed,
                ChangeCategory::Event,
                &event.name,
                true,
                format!("Event {} removed", event.name),
            )
            .with_before(event_signature(event))
            .with_explanation("Off-chain consumers listening for this event will stop receiving it")
        },
        |before, after| {
            let before_sig = event_signature(before);
            let after_sig = event_signature(after);
            (before_sig != after_sig).then(|| {
                DiffChange::new(
                    ChangeType::Modified,
                    ChangeCategory::Event,
                    &after.name,
                    true,
                    format!("Event {} signature changed", after.name),
                )
                .with_before(before_sig)
                .with_after(after_sig)
                .with_explanation("The event topic or data layout changed for off-chain consumers")
            })
        },
        |event| {
            DiffChange::new(
                ChangeType::Added,
                ChangeCategory::Event,
                &event.name,
                false,
                format!("Event {} added", event.name),
            )
            .with_after(event_signature(event))
        },
    )
}

// --- Variables ---

fn compare_variables(a: &ContractModel, b: &ContractModel) -> Comparison {
    compare_by_key(
        ChangeCategory::Variable,
        &a.variables,
        &b.variables,
        |var: &Variable| {
            let breaking = var.visibility == Visibility::Public;
            let change = DiffChange::new(
                ChangeType::Removed,
                ChangeCategory::Variable,
                &var.name,
                breaking,
                format!("State variable {} removed", var.name),
            )
            .with_before(variable_signature(var));
            if breaking {
                change.with_explanation(format!("The public getter {}() no longer exists", var.name))
            } else {
                change
            }
        },
        |before, after| {
            let before_sig = variable_signature(before);
            let after_sig = variable_signature(after);
            if before_sig == after_sig {
                return None;
            }
            let type_changed = normalize_type(&before.type_name) != normalize_type(&after.type_name);
            let breaking = type_changed
                || before.visibility == Visibility::Public
                || after.visibility == Visibility::Public;
            let what = if type_changed {
                format!("type changed from {} to {}", before.type_name, after.type_name)
            } else if before.visibility == after.visibility {
                "declaration changed".to_owned()
            } else {
                format!(
                    "visibility changed from {} to {}",
                    before.visibility, after.visibility
                )
            };
            let change = DiffChange::new(
                ChangeType::Modified,
                ChangeCategory::Variable,
                &after.name,
                breaking,
                format!("State variable {} {what}", after.name),
            )
            .with_before(before_sig)
            .with_after(after_sig);
            Some(if type_changed {
                change.with_explanation("Storage layout or getter return type changed")
            } else {
                change
            })
        },
        |var| {
            DiffChange::new(
                ChangeType::Added,
                ChangeCategory::Variable,
                &var.name,
                false,
                format!("State variable {} added", var.name),
            )
            .with_after(variable_signature(var))
        },
    )
}

// --- Modifiers ---

fn compare_modifiers(a: &ContractModel, b: &ContractModel) -> Comparison {
    compare_by_key(
        ChangeCategory::Modifier,
        &a.modifiers,
        &b.modifiers,
        |modifier: &Modifier| {
            DiffChange::new(
                ChangeType::Removed,
                ChangeCategory::Modifier,
                &modifier.name,
                false,
                format!("Modifier {} removed", modifier.name),
            )
            .with_before(modifier_signature(modifier))
            .with_explanation(format!(
                "Checks enforced by {} are gone wherever it was applied",
                modifier.name
            ))
        },
        |before, after| {
            let before_sig = modifier_signature(before);
            let after_sig = modifier_signature(after);
            (before_sig != after_sig).then(|| {
                DiffChange::new(
                    ChangeType::Modified,
                    ChangeCategory::Modifier,
                    &after.name,
                    false,
                    format!("Modifier {} parameters changed", after.name),
                )
                .with_before(before_sig)
                .with_after(after_sig)
            })
        },
        |modifier| {
            DiffChange::new(
                ChangeType::Added,
                ChangeCategory::Modifier,
                &modifier.name,
                false,
                format!("Modifier {} added", modifier.name),
            )
            .with_after(modifier_signature(modifier))
        },
    )
}

// --- Imports and inheritance ---

fn compare_imports(a: &ContractModel, b: &ContractModel) -> Comparison {
    compare_by_key(
        ChangeCategory::Import,
        &a.imports,
        &b.imports,
        |import: &Import| {
            DiffChange::new(
                ChangeType::Removed,
                ChangeCategory::Import,
                &import.path,
                false,
                format!("Import {} removed", import.path),
            )
        },
        |_, _| None,
        |import| {
            DiffChange::new(
                ChangeType::Added,
                ChangeCategory::Import,
                &import.path,
                false,
                format!("Import {} added", import.path),
            )
        },
    )
}

fn compare_inheritance(a: &ContractModel, b: &ContractModel) -> Comparison {
    compare_by_key(
        ChangeCategory::Inheritance,
        &a.inherits,
        &b.inherits,
        |base: &String| {
            DiffChange::new(
                ChangeType::Removed,
                ChangeCategory::Inheritance,
                base,
                true,
                format!("No longer inherits from {base}"),
            )
            .with_explanation(format!("Members inherited from {base} may no longer exist"))
        },
        |_, _| None,
        |base| {
            DiffChange::new(
                ChangeType::Added,
                ChangeCategory::Inheritance,
                base,
                false,
                format!("Now inherits from {base}"),
            )
        },
    )
}
