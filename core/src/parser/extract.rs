//! Builds a `ContractModel` from the typed syntax tree.

use super::ast::{ContractDecl, FunctionDecl, FunctionForm, Member, ParamDecl, SourceItem, SourceUnit};
use super::scan::{extract_imports, extract_pragma};
use crate::callgraph;
use crate::model::{
    ContractModel, EnumDef, Event, EventParameter, Function, FunctionKind, Modifier, Mutability,
    Parameter, StructDef, StructMember, Variable, Visibility,
};

/// Extract the model of the main contract: the last contract-like
/// declaration in the file, since dependencies are listed first.
pub fn build_model(source: &str, unit: &SourceUnit) -> ContractModel {
    let main = unit.items.iter().rev().find_map(|item| match item {
        SourceItem::Contract(decl) => Some(decl),
        SourceItem::Other => None,
    });

    let mut model = ContractModel {
        pragma: extract_pragma(source),
        imports: extract_imports(source),
        total_lines: source.lines().count() as u32,
        ..ContractModel::default()
    };

    if let Some(decl) = main {
        fill_from_contract(&mut model, decl);
    } else {
        log::debug!("[parser] No contract declaration found");
    }

    model.total_complexity = model.functions.iter().map(|f| f.complexity).sum();
    model
}

fn fill_from_contract(model: &mut ContractModel, decl: &ContractDecl) {
    model.name.clone_from(&decl.name);
    model.kind = decl.kind;
    model.inherits.clone_from(&decl.bases);

    for member in &decl.members {
        match member {
            Member::Function(func) => model.functions.push(to_function(func)),
            Member::Modifier(modifier) => model.modifiers.push(Modifier {
                name: modifier.name.clone(),
                parameters: modifier.params.iter().map(to_parameter).collect(),
                span: modifier.span,
            }),
            Member::Event(event) => model.events.push(Event {
                name: event.name.clone(),
                parameters: event
                    .params
                    .iter()
                    .map(|p| EventParameter {
                        name: p.name.clone(),
                        type_name: p.type_name.clone(),
                        indexed: p.indexed,
                    })
                    .collect(),
                span: event.span,
            }),
            Member::StateVariable(var) => model.variables.push(Variable {
                name: var.name.clone(),
                type_name: var.type_name.clone(),
                visibility: var
                    .visibility
                    .as_deref()
                    .and_then(Visibility::from_keyword)
                    .unwrap_or(Visibility::Internal),
                constant: var.constant,
                immutable: var.immutable,
                span: var.span,
            }),
            Member::Struct(def) => model.structs.push(StructDef {
                name: def.name.clone(),
                members: def
                    .members
                    .iter()
                    .map(|(name, type_name)| StructMember {
                        name: name.clone(),
                        type_name: type_name.clone(),
                    })
                    .collect(),
                span: def.span,
            }),
            Member::Enum(def) => model.enums.push(EnumDef {
                name: def.name.clone(),
                members: def.values.clone(),
                span: def.span,
            }),
            Member::Other => {}
        }
    }
}

fn to_parameter(param: &ParamDecl) -> Parameter {
    Parameter {
        name: param.name.clone(),
        type_name: param.type_name.clone(),
        storage_location: param.location.clone(),
    }
}

fn to_function(func: &FunctionDecl) -> Function {
    let kind = match func.form {
        FunctionForm::Named => FunctionKind::Function,
        FunctionForm::Constructor => FunctionKind::Constructor,
        FunctionForm::Fallback => FunctionKind::Fallback,
        FunctionForm::Receive => FunctionKind::Receive,
    };
    let default_visibility = match kind {
        FunctionKind::Fallback | FunctionKind::Receive => Visibility::External,
        FunctionKind::Function | FunctionKind::Constructor => Visibility::Public,
    };

    let analysis = func
        .body
        .as_deref()
        .map(callgraph::analyze)
        .unwrap_or_else(|| callgraph::BodyAnalysis {
            complexity: 1,
            ..callgraph::BodyAnalysis::default()
        });

    Function {
        name: func.name.clone(),
        kind,
        is_constructor: kind == FunctionKind::Constructor,
        visibility: func
            .visibility
            .as_deref()
            .and_then(Visibility::from_keyword)
            .unwrap_or(default_visibility),
        mutability: func
            .mutability
            .as_deref()
            .and_then(Mutability::from_keyword)
            .unwrap_or_default(),
        parameters: func.params.iter().map(to_parameter).collect(),
        returns: func.returns.iter().map(to_parameter).collect(),
        modifiers: func.modifiers.clone(),
        span: func.span,
        calls: analysis.calls,
        external_calls: analysis.external_calls,
        complexity: analysis.complexity,
    }
}
