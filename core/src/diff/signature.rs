//! Canonical signatures used for equality between model versions.
//!
//! Only types take part in parameter lists: names and storage locations
//! are ignored, and `indexed` is kept for events. Type strings are
//! normalized so equivalent spellings (`uint` and `uint256`) compare equal.

use crate::model::{Event, Function, Modifier, Parameter, Variable};
use regex::Regex;
use std::sync::LazyLock;

static SHORTHAND_TYPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(uint|int|byte|ufixed|fixed)\b").expect("shorthand type pattern is valid")
});

/// Normalize a rendered type string.
///
/// Whitespace is collapsed with ` => ` kept inside mappings, then the
/// shorthand elementary types are expanded token-wise: `uint`→`uint256`,
/// `int`→`int256`, `byte`→`bytes1`, `ufixed`→`ufixed128x18`,
/// `fixed`→`fixed128x18`.
pub fn normalize_type(type_name: &str) -> String {
    let rendered = crate::parser::lower::render_type(type_name);
    SHORTHAND_TYPE
        .replace_all(&rendered, |caps: &regex::Captures| {
            match &caps[1] {
                "uint" => "uint256",
                "int" => "int256",
                "byte" => "bytes1",
                "ufixed" => "ufixed128x18",
                _ => "fixed128x18",
            }
            .to_owned()
        })
        .into_owned()
}

/// Normalized parameter types, in order.
pub fn type_list(params: &[Parameter]) -> Vec<String> {
    params.iter().map(|p| normalize_type(&p.type_name)).collect()
}

/// `name(t1,t2) visibility mutability [modifiers] [returns (r1)]`
pub fn function_signature(func: &Function) -> String {
    let mut sig = format!(
        "{}({}) {} {}",
        func.key(),
        type_list(&func.parameters).join(","),
        func.visibility,
        func.mutability
    );
    for modifier in &func.modifiers {
        sig.push(' ');
        sig.push_str(modifier);
    }
    if !func.returns.is_empty() {
        sig.push_str(" returns (");
        sig.push_str(&type_list(&func.returns).join(","));
        sig.push(')');
    }
    sig
}

/// `Name(t1 indexed,t2)`
pub fn event_signature(event: &Event) -> String {
    let params: Vec<String> = event
        .parameters
        .iter()
        .map(|p| {
            let ty = normalize_type(&p.type_name);
            if p.indexed {
                format!("{ty} indexed")
            } else {
                ty
            }
        })
        .collect();
    format!("{}({})", event.name, params.join(","))
}

/// `type visibility [constant] [immutable] name`
pub fn variable_signature(var: &Variable) -> String {
    let mut sig = format!("{} {}", normalize_type(&var.type_name), var.visibility);
    if var.constant {
        sig.push_str(" constant");
    }
    if var.immutable {
        sig.push_str(" immutable");
    }
    sig.push(' ');
    sig.push_str(&var.name);
    sig
}

pub fn modifier_signature(modifier: &Modifier) -> String {
    format!(
        "{}({})",
        modifier.name,
        type_list(&modifier.parameters).join(",")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EventParameter, FunctionKind, LineSpan, Mutability, Visibility};
    use std::collections::BTreeSet;

    fn param(name: &str, type_name: &str) -> Parameter {
        Parameter {
            name: name.to_owned(),
            type_name: type_name.to_owned(),
            storage_location: None,
        }
    }

    fn transfer(params: Vec<Parameter>) -> Function {
        Function {
            name: "transfer".to_owned(),
            kind: FunctionKind::Function,
            is_constructor: false,
            visibility: Visibility::External,
            mutability: Mutability::Nonpayable,
            parameters: params,
            returns: vec![param("", "bool")],
            modifiers: vec!["whenNotPaused".to_owned()],
            span: LineSpan::default(),
            calls: BTreeSet::new(),
            external_calls: vec![],
            complexity: 1,
        }
    }

    #[test]
    fn test_normalize_shorthand_types() {
        assert_eq!(normalize_type("uint"), "uint256");
        assert_eq!(normalize_type("int"), "int256");
        assert_eq!(normalize_type("byte"), "bytes1");
        assert_eq!(normalize_type("ufixed"), "ufixed128x18");
        assert_eq!(normalize_type("fixed"), "fixed128x18");
        assert_eq!(normalize_type("uint[]"), "uint256[]");
        assert_eq!(
            normalize_type("mapping(address=>mapping(uint => uint))"),
            "mapping(address => mapping(uint256 => uint256))"
        );
    }

    #[test]
    fn test_normalize_leaves_sized_types() {
        assert_eq!(normalize_type("uint8"), "uint8");
        assert_eq!(normalize_type("bytes"), "bytes");
        assert_eq!(normalize_type("bytes32"), "bytes32");
        assert_eq!(normalize_type("fixed64x10"), "fixed64x10");
        assert_eq!(normalize_type("Uint"), "Uint");
    }

    #[test]
    fn test_function_signature_shape() {
        let func = transfer(vec![param("to", "address"), param("amount", "uint")]);
        assert_eq!(
            function_signature(&func),
            "transfer(address,uint256) external nonpayable whenNotPaused returns (bool)"
        );
    }

    #[test]
    fn test_function_signature_ignores_names_and_locations() {
        let a = transfer(vec![param("to", "address"), param("amount", "uint256")]);
        let mut b = transfer(vec![param("recipient", "address"), param("value", "uint")]);
        b.parameters[1].storage_location = Some("memory".to_owned());
        assert_eq!(function_signature(&a), function_signature(&b));
    }

    #[test]
    fn test_event_signature_keeps_indexed() {
        let event = Event {
            name: "Transfer".to_owned(),
            parameters: vec![
                EventParameter {
                    name: "from".to_owned(),
                    type_name: "address".to_owned(),
                    indexed: true,
                },
                EventParameter {
                    name: "value".to_owned(),
                    type_name: "uint256".to_owned(),
                    indexed: false,
                },
            ],
            span: LineSpan::default(),
        };
        assert_eq!(event_signature(&event), "Transfer(address indexed,uint256)");
    }

    #[test]
    fn test_variable_signature() {
        let var = Variable {
            name: "MAX".to_owned(),
            type_name: "uint".to_owned(),
            visibility: Visibility::Public,
            constant: true,
            immutable: false,
            span: LineSpan::default(),
        };
        assert_eq!(variable_signature(&var), "uint256 public constant MAX");
    }
}
