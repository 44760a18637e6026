//! Call-graph and complexity analysis over a function body.
//!
//! Complexity starts at 1 and adds one for every `if`, loop, ternary,
//! `require`/`assert` invocation and short-circuit `&&`/`||`.

use crate::model::ExternalCall;
use crate::parser::ast::{BinaryOp, Expr, Stmt};
use std::collections::BTreeSet;

/// Identifier calls that act as runtime failure paths.
const INVARIANT_CHECKS: &[&str] = &["require", "assert"];

/// Identifier calls that are language builtins rather than contract functions.
const BUILTIN_CALLS: &[&str] = &["require", "assert", "revert"];

/// Member-call receivers that are language namespaces or the contract itself.
const BUILTIN_RECEIVERS: &[&str] = &[
    "abi", "msg", "block", "tx", "super", "this", "type", "bytes", "string",
];

/// Everything the analyzer derives from one function body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BodyAnalysis {
    pub complexity: u32,
    pub calls: BTreeSet<String>,
    pub external_calls: Vec<ExternalCall>,
}

/// Run every analysis in a single pass.
pub fn analyze(body: &[Stmt]) -> BodyAnalysis {
    let mut complexity = ComplexityCounter { branches: 0 };
    let mut collector = CallCollector::default();
    for stmt in body {
        complexity.visit_stmt(stmt);
        collector.visit_stmt(stmt);
    }
    BodyAnalysis {
        complexity: 1 + complexity.branches,
        calls: collector.calls,
        external_calls: collector.external,
    }
}

pub fn complexity(body: &[Stmt]) -> u32 {
    let mut counter = ComplexityCounter { branches: 0 };
    for stmt in body {
        counter.visit_stmt(stmt);
    }
    1 + counter.branches
}

/// Names of intra-contract functions called by plain identifier.
pub fn calls(body: &[Stmt]) -> BTreeSet<String> {
    let mut collector = CallCollector::default();
    for stmt in body {
        collector.visit_stmt(stmt);
    }
    collector.calls
}

/// Member calls on other contracts, in order of appearance.
pub fn external_calls(body: &[Stmt]) -> Vec<ExternalCall> {
    let mut collector = CallCollector::default();
    for stmt in body {
        collector.visit_stmt(stmt);
    }
    collector.external
}

// --- Traversal ---

/// Pre-order traversal over statements and expressions.
pub trait Visitor {
    fn visit_stmt(&mut self, stmt: &Stmt) {
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &Expr) {
        walk_expr(self, expr);
    }
}

pub fn walk_stmt<V: Visitor + ?Sized>(visitor: &mut V, stmt: &Stmt) {
    match stmt {
        Stmt::Block(stmts) => {
            for s in stmts {
                visitor.visit_stmt(s);
            }
        }
        Stmt::Expr(expr) => visitor.visit_expr(expr),
        Stmt::VarDecl(values) | Stmt::Revert(values) => {
            for e in values {
                visitor.visit_expr(e);
            }
        }
        Stmt::If {
            condition,
            then_branch,
            else_branch,
        } => {
            visitor.visit_expr(condition);
            visitor.visit_stmt(then_branch);
            if let Some(else_branch) = else_branch {
                visitor.visit_stmt(else_branch);
            }
        }
        Stmt::For { header, body } => {
            for s in header {
                visitor.visit_stmt(s);
            }
            visitor.visit_stmt(body);
        }
        Stmt::While { condition, body } | Stmt::DoWhile { body, condition } => {
            visitor.visit_expr(condition);
            visitor.visit_stmt(body);
        }
        Stmt::Return(value) => {
            if let Some(value) = value {
                visitor.visit_expr(value);
            }
        }
        Stmt::Emit { event, args } => {
            visitor.visit_expr(event);
            for e in args {
                visitor.visit_expr(e);
            }
        }
        Stmt::Try { call, clauses } => {
            visitor.visit_expr(call);
            for s in clauses {
                visitor.visit_stmt(s);
            }
        }
        Stmt::Assembly | Stmt::Break | Stmt::Continue => {}
    }
}

pub fn walk_expr<V: Visitor + ?Sized>(visitor: &mut V, expr: &Expr) {
    match expr {
        Expr::Member { object, .. } => visitor.visit_expr(object),
        Expr::Call { callee, args } => {
            visitor.visit_expr(callee);
            for a in args {
                visitor.visit_expr(a);
            }
        }
        Expr::TypeCast { arg, .. } => visitor.visit_expr(arg),
        Expr::Binary { lhs, rhs, .. } => {
            visitor.visit_expr(lhs);
            visitor.visit_expr(rhs);
        }
        Expr::Unary(inner) => visitor.visit_expr(inner),
        Expr::Ternary {
            condition,
            then_value,
            else_value,
        } => {
            visitor.visit_expr(condition);
            visitor.visit_expr(then_value);
            visitor.visit_expr(else_value);
        }
        Expr::Assign { target, value } => {
            visitor.visit_expr(target);
            visitor.visit_expr(value);
        }
        Expr::Index { base, index } => {
            visitor.visit_expr(base);
            if let Some(index) = index {
                visitor.visit_expr(index);
            }
        }
        Expr::Tuple(items) | Expr::Opaque(items) => {
            for e in items {
                visitor.visit_expr(e);
            }
        }
        Expr::Ident(_) | Expr::New(_) | Expr::Literal => {}
    }
}

// --- Complexity ---

struct ComplexityCounter {
    branches: u32,
}

impl Visitor for ComplexityCounter {
    fn visit_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::If { .. } | Stmt::For { .. } | Stmt::While { .. } | Stmt::DoWhile { .. } => {
                self.branches += 1;
            }
            Stmt::Block(_)
            | Stmt::Expr(_)
            | Stmt::VarDecl(_)
            | Stmt::Return(_)
            | Stmt::Emit { .. }
            | Stmt::Revert(_)
            | Stmt::Try { .. }
            | Stmt::Assembly
            | Stmt::Break
            | Stmt::Continue => {}
        }
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Ternary { .. } => self.branches += 1,
            Expr::Binary { op, .. } => match op {
                BinaryOp::And | BinaryOp::Or => self.branches += 1,
                BinaryOp::Other => {}
            },
            Expr::Call { callee, .. } => {
                if matches!(callee.as_ref(), Expr::Ident(name) if INVARIANT_CHECKS.contains(&name.as_str()))
                {
                    self.branches += 1;
                }
            }
            Expr::Ident(_)
            | Expr::Member { .. }
            | Expr::TypeCast { .. }
            | Expr::Unary(_)
            | Expr::Assign { .. }
            | Expr::Index { .. }
            | Expr::Tuple(_)
            | Expr::New(_)
            | Expr::Literal
            | Expr::Opaque(_) => {}
        }
        walk_expr(self, expr);
    }
}

// --- Calls ---

#[derive(Default)]
struct CallCollector {
    calls: BTreeSet<String>,
    external: Vec<ExternalCall>,
}

impl Visitor for CallCollector {
    fn visit_expr(&mut self, expr: &Expr) {
        if let Expr::Call { callee, .. } = expr {
            match callee.as_ref() {
                Expr::Ident(name) => {
                    if !BUILTIN_CALLS.contains(&name.as_str()) {
                        self.calls.insert(name.clone());
                    }
                }
                Expr::Member { object, property } => {
                    if let Some(contract) = receiver_name(object) {
                        self.external.push(ExternalCall {
                            contract,
                            function: property.clone(),
                        });
                    }
                }
                Expr::Call { .. }
                | Expr::TypeCast { .. }
                | Expr::Binary { .. }
                | Expr::Unary(_)
                | Expr::Ternary { .. }
                | Expr::Assign { .. }
                | Expr::Index { .. }
                | Expr::Tuple(_)
                | Expr::New(_)
                | Expr::Literal
                | Expr::Opaque(_) => {}
            }
        }
        walk_expr(self, expr);
    }
}

/// Resolve the contract a member call is sent to.
///
/// A bare variable names itself; `IERC20(addr)` and `address(addr)` name
/// the cast target. Cast-like calls are recognized by a capitalized callee.
fn receiver_name(object: &Expr) -> Option<String> {
    match object {
        Expr::Ident(name) => {
            (!BUILTIN_RECEIVERS.contains(&name.as_str())).then(|| name.clone())
        }
        Expr::Call { callee, .. } => match callee.as_ref() {
            Expr::Ident(name) if name.starts_with(|c: char| c.is_ascii_uppercase()) => {
                Some(name.clone())
            }
            _ => None,
        },
        Expr::TypeCast { target, .. } => Some(target.clone()),
        Expr::Member { .. }
        | Expr::Binary { .. }
        | Expr::Unary(_)
        | Expr::Ternary { .. }
        | Expr::Assign { .. }
        | Expr::Index { .. }
        | Expr::Tuple(_)
        | Expr::New(_)
        | Expr::Literal
        | Expr::Opaque(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str) -> Expr {
        Expr::Ident(name.to_owned())
    }

    fn call(callee: Expr, args: Vec<Expr>) -> Expr {
        Expr::Call {
            callee: Box::new(callee),
            args,
        }
    }

    fn member(object: Expr, property: &str) -> Expr {
        Expr::Member {
            object: Box::new(object),
            property: property.to_owned(),
        }
    }

    fn and(lhs: Expr, rhs: Expr) -> Expr {
        Expr::Binary {
            op: BinaryOp::And,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    #[test]
    fn test_straight_line_body_has_complexity_one() {
        let body = vec![
            Stmt::Expr(Expr::Assign {
                target: Box::new(ident("x")),
                value: Box::new(Expr::Literal),
            }),
            Stmt::Return(Some(ident("x"))),
        ];
        assert_eq!(complexity(&body), 1);
        assert_eq!(complexity(&[]), 1);
    }

    #[test]
    fn test_requires_ifs_and_short_circuit() {
        let require = |arg| Stmt::Expr(call(ident("require"), vec![arg]));
        let body = vec![
            require(ident("a")),
            require(ident("b")),
            require(ident("c")),
            Stmt::If {
                condition: and(ident("a"), ident("b")),
                then_branch: Box::new(Stmt::Block(vec![])),
                else_branch: None,
            },
            Stmt::If {
                condition: ident("c"),
                then_branch: Box::new(Stmt::Return(None)),
                else_branch: Some(Box::new(Stmt::Block(vec![]))),
            },
        ];
        assert_eq!(complexity(&body), 7);
    }

    #[test]
    fn test_loops_and_ternary() {
        let body = vec![
            Stmt::For {
                header: vec![],
                body: Box::new(Stmt::While {
                    condition: ident("ok"),
                    body: Box::new(Stmt::Block(vec![])),
                }),
            },
            Stmt::DoWhile {
                body: Box::new(Stmt::Block(vec![])),
                condition: Expr::Ternary {
                    condition: Box::new(ident("a")),
                    then_value: Box::new(ident("b")),
                    else_value: Box::new(ident("c")),
                },
            },
        ];
        assert_eq!(complexity(&body), 5);
    }

    #[test]
    fn test_call_shapes() {
        let body = vec![
            Stmt::Expr(call(ident("_mint"), vec![])),
            Stmt::Expr(call(member(ident("token"), "transfer"), vec![])),
            Stmt::Expr(call(
                member(call(ident("IERC20"), vec![ident("addr")]), "approve"),
                vec![],
            )),
            Stmt::Expr(call(
                member(
                    Expr::TypeCast {
                        target: "address".to_owned(),
                        arg: Box::new(ident("x")),
                    },
                    "transfer",
                ),
                vec![],
            )),
            Stmt::Expr(call(member(ident("abi"), "encode"), vec![])),
            Stmt::Expr(call(ident("require"), vec![ident("ok")])),
        ];

        let analysis = analyze(&body);
        assert_eq!(analysis.calls.iter().collect::<Vec<_>>(), vec!["IERC20", "_mint"]);
        assert_eq!(
            analysis.external_calls,
            vec![
                ExternalCall {
                    contract: "token".to_owned(),
                    function: "transfer".to_owned()
                },
                ExternalCall {
                    contract: "IERC20".to_owned(),
                    function: "approve".to_owned()
                },
                ExternalCall {
                    contract: "address".to_owned(),
                    function: "transfer".to_owned()
                },
            ]
        );
        assert_eq!(analysis.complexity, 2);
    }

    #[test]
    fn test_nested_calls_in_arguments_are_found() {
        let body = vec![Stmt::Emit {
            event: ident("Paid"),
            args: vec![call(member(ident("oracle"), "price"), vec![])],
        }];
        assert_eq!(external_calls(&body).len(), 1);
        assert!(calls(&body).is_empty());
    }

    /// The single function `f` of a parsed contract wrapping `body`.
    fn parsed(body: &str) -> crate::model::Function {
        let source = format!(
            "contract C {{\n    uint256 x;\n    function f(uint256 a, uint256 b, address to) public {{\n{body}\n    }}\n}}\n"
        );
        let model = crate::parser::parse(&source).unwrap();
        model.functions.into_iter().next().unwrap()
    }

    #[test]
    fn test_parsed_branch_complexity() {
        let cases = [
            ("x = a + b;", 1),
            ("if (a > 0) { x = 1; }", 2),
            ("if (a > 0) { x = 1; } else if (a > 1) { x = 2; } else { x = 3; }", 3),
            ("for (uint256 i = 0; i < a; i++) { x++; }", 2),
            ("while (x > 0) { x--; }", 2),
            ("do { x++; } while (x < 10);", 2),
            ("x = a > b ? a : b;", 2),
            ("require(a > 0);", 2),
            ("assert(b != 0);", 2),
            ("bool ok = a > 0 && b > 0;", 2),
            ("bool ok = a > 0 || b > 0;", 2),
            ("for (uint256 i = 0; i < a; i++) { if (i > b) { x++; } }", 3),
        ];
        for (body, expected) in cases {
            assert_eq!(parsed(body).complexity, expected, "body: {body}");
        }
    }

    #[test]
    fn test_parsed_call_shapes() {
        let func = parsed(
            "        token.transfer(to, 1);\n        IERC20(to).approve(to, 2);\n        payable(to).transfer(a);\n        helper();",
        );
        let external: Vec<String> = func.external_calls.iter().map(ToString::to_string).collect();
        assert_eq!(
            external,
            vec!["token.transfer", "IERC20.approve", "payable.transfer"]
        );
        assert!(func.calls.contains("helper"));
        assert_eq!(func.complexity, 1);
    }
}
