//! Lowers the tree-sitter concrete syntax tree into the typed `ast`.
//!
//! Tree-sitter recovers from syntax errors by wrapping the offending
//! region in `ERROR` nodes, so dirty source still yields a usable tree.
//! Field names are preferred where the grammar defines them, with
//! positional fallbacks for recovered nodes that lost their fields.

use super::ast::{
    BinaryOp, ContractDecl, EnumDecl, EventDecl, Expr, FunctionDecl, FunctionForm, Member,
    ModifierDecl, ParamDecl, SourceItem, SourceUnit, StateVariableDecl, Stmt, StructDecl,
};
use super::ParseError;
use crate::model::{ContractKind, LineSpan};
use tree_sitter::{Language, Node, Parser};

const STORAGE_LOCATIONS: &[&str] = &["memory", "storage", "calldata"];
const VISIBILITY_KEYWORDS: &[&str] = &["public", "external", "internal", "private"];
const MUTABILITY_KEYWORDS: &[&str] = &["pure", "view", "payable", "constant"];

/// Get the tree-sitter language for Solidity source.
pub fn solidity_language() -> Language {
    tree_sitter_solidity::LANGUAGE.into()
}

/// Parse source text and lower it into a `SourceUnit`.
///
/// Fails only when the builder produces no tree, or a tree made of
/// nothing but error nodes with no contract-like declaration recovered.
pub fn parse_source(source: &str) -> Result<SourceUnit, ParseError> {
    let mut parser = Parser::new();
    parser
        .set_language(&solidity_language())
        .map_err(|e| ParseError::Language(e.to_string()))?;

    let tree = parser
        .parse(source, None)
        .ok_or_else(|| ParseError::Unparseable("tree builder returned no tree".to_owned()))?;
    let root = tree.root_node();

    let lowerer = Lowerer { source };
    let unit = lowerer.lower_source_unit(root);

    let has_contract = unit
        .items
        .iter()
        .any(|item| matches!(item, SourceItem::Contract(_)));
    if root.has_error() && !has_contract {
        let detail = first_error(root).map_or_else(
            || "source contains no recognizable declarations".to_owned(),
            |node| {
                let pos = node.start_position();
                format!(
                    "syntax error at line {}, column {}",
                    pos.row + 1,
                    pos.column + 1
                )
            },
        );
        return Err(ParseError::Unparseable(detail));
    }

    Ok(unit)
}

/// Depth-first search for the first error or missing node.
fn first_error(node: Node) -> Option<Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .filter(|c| c.has_error())
        .find_map(first_error)
}

fn span_of(node: Node) -> LineSpan {
    LineSpan {
        start_line: node.start_position().row as u32 + 1,
        end_line: node.end_position().row as u32 + 1,
    }
}

/// All children, including anonymous keyword tokens.
fn all_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    let children = node.children(&mut cursor).collect();
    children
}

/// Named children, skipping comments (which tree-sitter treats as extras).
fn named_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    let children = node
        .named_children(&mut cursor)
        .filter(|c| c.kind() != "comment")
        .collect();
    children
}

/// Descend through single-child `expression` and parenthesis wrappers.
fn unwrap_expression(node: Node<'_>) -> Node<'_> {
    let mut current = node;
    while matches!(current.kind(), "expression" | "parenthesized_expression") {
        let inner = named_children(current);
        if inner.len() != 1 {
            break;
        }
        current = inner[0];
    }
    current
}

/// Render a type name with canonical spacing: one space between words,
/// ` => ` inside mappings, no space around other punctuation.
pub fn render_type(text: &str) -> String {
    let mut tokens: Vec<String> = Vec::new();
    let mut word = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c.is_alphanumeric() || c == '_' || c == '$' {
            word.push(c);
            continue;
        }
        if !word.is_empty() {
            tokens.push(std::mem::take(&mut word));
        }
        if c.is_whitespace() {
            continue;
        }
        if c == '=' && chars.peek() == Some(&'>') {
            chars.next();
            tokens.push("=>".to_owned());
        } else {
            tokens.push(c.to_string());
        }
    }
    if !word.is_empty() {
        tokens.push(word);
    }

    let is_word = |t: &str| t.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '$');
    let mut out = String::new();
    let mut prev_word = false;
    for token in &tokens {
        if token == "=>" {
            out.push_str(" => ");
            prev_word = false;
            continue;
        }
        let word = is_word(token);
        if word && prev_word {
            out.push(' ');
        }
        out.push_str(token);
        prev_word = word;
    }
    out
}

struct Lowerer<'a> {
    source: &'a str,
}

impl<'a> Lowerer<'a> {
    fn text(&self, node: Node) -> &'a str {
        &self.source[node.byte_range()]
    }

    fn field_text(&self, node: Node, field: &str) -> Option<String> {
        node.child_by_field_name(field)
            .map(|n| self.text(n).trim().to_owned())
    }

    fn lower_source_unit(&self, root: Node) -> SourceUnit {
        let mut items = Vec::new();
        for child in named_children(root) {
            let item = match child.kind() {
                "contract_declaration" | "interface_declaration" | "library_declaration" => {
                    self.lower_contract(child).map_or(SourceItem::Other, SourceItem::Contract)
                }
                _ => SourceItem::Other,
            };
            items.push(item);
        }
        SourceUnit { items }
    }

    // --- Declarations ---

    fn lower_contract(&self, node: Node) -> Option<ContractDecl> {
        let name = self.field_text(node, "name")?;
        let is_abstract = all_children(node).iter().any(|c| c.kind() == "abstract");
        let kind = match node.kind() {
            "interface_declaration" => ContractKind::Interface,
            "library_declaration" => ContractKind::Library,
            _ if is_abstract => ContractKind::Abstract,
            _ => ContractKind::Contract,
        };

        let mut bases = Vec::new();
        let mut members = Vec::new();
        for child in named_children(node) {
            match child.kind() {
                "inheritance_specifier" => {
                    let ancestor = child
                        .child_by_field_name("ancestor")
                        .or_else(|| named_children(child).first().copied());
                    if let Some(ancestor) = ancestor {
                        bases.push(render_type(self.text(ancestor)));
                    }
                }
                "contract_body" => {
                    members = named_children(child)
                        .into_iter()
                        .map(|m| self.lower_member(m))
                        .collect();
                }
                _ => {}
            }
        }

        Some(ContractDecl {
            kind,
            name,
            bases,
            members,
            span: span_of(node),
        })
    }

    fn lower_member(&self, node: Node) -> Member {
        match node.kind() {
            "function_definition" => Member::Function(self.lower_function(node, FunctionForm::Named)),
            "constructor_definition" => {
                Member::Function(self.lower_function(node, FunctionForm::Constructor))
            }
            "fallback_receive_definition" => {
                Member::Function(self.lower_function(node, FunctionForm::Fallback))
            }
            "modifier_definition" => Member::Modifier(ModifierDecl {
                name: self.field_text(node, "name").unwrap_or_default(),
                params: self.collect_params(node),
                span: span_of(node),
            }),
            "event_definition" => Member::Event(EventDecl {
                name: self.field_text(node, "name").unwrap_or_default(),
                params: self.collect_event_params(node),
                span: span_of(node),
            }),
            "state_variable_declaration" => Member::StateVariable(self.lower_state_variable(node)),
            "struct_declaration" => Member::Struct(self.lower_struct(node)),
            "enum_declaration" => Member::Enum(self.lower_enum(node)),
            _ => Member::Other,
        }
    }

    fn lower_function(&self, node: Node, form: FunctionForm) -> FunctionDecl {
        let mut form = form;
        let mut params = Vec::new();
        let mut returns = Vec::new();
        let mut visibility = None;
        let mut mutability = None;
        let mut modifiers = Vec::new();
        let mut body = None;

        for child in all_children(node) {
            match child.kind() {
                "parameter" => params.push(self.lower_param(child)),
                "parameter_list" => params.extend(self.collect_params(child)),
                "return_type_definition" => returns = self.collect_params(child),
                "visibility" => visibility = Some(self.text(child).trim().to_owned()),
                "state_mutability" => mutability = Some(self.text(child).trim().to_owned()),
                // Legacy `constant` parses as a modifier invocation.
                "modifier_invocation" => {
                    let name = self.invocation_name(child);
                    if MUTABILITY_KEYWORDS.contains(&name.as_str()) {
                        mutability = Some(name);
                    } else {
                        modifiers.push(name);
                    }
                }
                "function_body" => body = Some(self.lower_block(child)),
                "receive" => form = FunctionForm::Receive,
                "fallback" => form = FunctionForm::Fallback,
                kind if !child.is_named() && VISIBILITY_KEYWORDS.contains(&kind) => {
                    visibility = Some(kind.to_owned());
                }
                kind if !child.is_named() && MUTABILITY_KEYWORDS.contains(&kind) => {
                    mutability = Some(kind.to_owned());
                }
                _ => {}
            }
        }

        let name = match form {
            FunctionForm::Named => self.field_text(node, "name").unwrap_or_default(),
            FunctionForm::Constructor | FunctionForm::Fallback | FunctionForm::Receive => {
                String::new()
            }
        };

        FunctionDecl {
            form,
            name,
            params,
            returns,
            visibility,
            mutability,
            modifiers,
            body,
            span: span_of(node),
        }
    }

    /// `onlyRole(ADMIN)` is invoked as `onlyRole`.
    fn invocation_name(&self, node: Node) -> String {
        let text = self.text(node);
        let head = text.split('(').next().unwrap_or(text);
        render_type(head)
    }

    fn collect_params(&self, node: Node) -> Vec<ParamDecl> {
        let mut params = Vec::new();
        for child in named_children(node) {
            match child.kind() {
                "parameter" => params.push(self.lower_param(child)),
                "parameter_list" => params.extend(self.collect_params(child)),
                _ => {}
            }
        }
        params
    }

    fn collect_event_params(&self, node: Node) -> Vec<ParamDecl> {
        let mut params = Vec::new();
        for child in named_children(node) {
            match child.kind() {
                "event_parameter" => params.push(self.lower_param(child)),
                "event_parameter_list" => params.extend(self.collect_event_params(child)),
                _ => {}
            }
        }
        params
    }

    fn lower_param(&self, node: Node) -> ParamDecl {
        let named = named_children(node);
        let type_node = node
            .child_by_field_name("type")
            .or_else(|| named.first().copied());
        let type_name = type_node.map(|n| render_type(self.text(n))).unwrap_or_default();

        let name = self.field_text(node, "name").unwrap_or_else(|| {
            named
                .last()
                .filter(|n| n.kind() == "identifier" && Some(**n) != type_node)
                .map(|n| self.text(*n).to_owned())
                .unwrap_or_default()
        });

        let children = all_children(node);
        let location = node
            .child_by_field_name("location")
            .map(|n| self.text(n).trim().to_owned())
            .or_else(|| {
                children
                    .iter()
                    .map(|c| self.text(*c))
                    .find(|t| STORAGE_LOCATIONS.contains(t))
                    .map(str::to_owned)
            });
        let indexed = children.iter().any(|c| c.kind() == "indexed");

        ParamDecl {
            name,
            type_name,
            location,
            indexed,
        }
    }

    fn lower_state_variable(&self, node: Node) -> StateVariableDecl {
        let children = all_children(node);
        let type_node = node
            .child_by_field_name("type")
            .or_else(|| named_children(node).first().copied());
        let type_name = type_node.map(|n| render_type(self.text(n))).unwrap_or_default();
        let name = self.field_text(node, "name").unwrap_or_else(|| {
            children
                .iter()
                .rev()
                .find(|c| c.kind() == "identifier")
                .map(|c| self.text(*c).to_owned())
                .unwrap_or_default()
        });

        let mut visibility = None;
        let mut constant = false;
        let mut immutable = false;
        for child in &children {
            let text = self.text(*child).trim();
            if child.kind() == "visibility" || VISIBILITY_KEYWORDS.contains(&text) {
                visibility = Some(text.to_owned());
            } else if text == "constant" {
                constant = true;
            } else if text == "immutable" {
                immutable = true;
            }
        }

        StateVariableDecl {
            name,
            type_name,
            visibility,
            constant,
            immutable,
            span: span_of(node),
        }
    }

    fn lower_struct(&self, node: Node) -> StructDecl {
        let mut members = Vec::new();
        let mut stack = named_children(node);
        stack.reverse();
        while let Some(child) = stack.pop() {
            match child.kind() {
                "struct_member" => {
                    let named = named_children(child);
                    let type_node = child
                        .child_by_field_name("type")
                        .or_else(|| named.first().copied());
                    let name = self.field_text(child, "name").unwrap_or_else(|| {
                        named
                            .last()
                            .map(|n| self.text(*n).to_owned())
                            .unwrap_or_default()
                    });
                    let type_name = type_node.map(|n| render_type(self.text(n))).unwrap_or_default();
                    members.push((name, type_name));
                }
                "struct_body" => {
                    let mut inner = named_children(child);
                    inner.reverse();
                    stack.extend(inner);
                }
                _ => {}
            }
        }

        StructDecl {
            name: self.field_text(node, "name").unwrap_or_default(),
            members,
            span: span_of(node),
        }
    }

    fn lower_enum(&self, node: Node) -> EnumDecl {
        let name_node = node.child_by_field_name("name");
        let mut values = Vec::new();
        for child in named_children(node) {
            match child.kind() {
                "enum_value" => values.push(self.text(child).trim().to_owned()),
                "enum_body" => values.extend(
                    named_children(child)
                        .into_iter()
                        .filter(|v| matches!(v.kind(), "enum_value" | "identifier"))
                        .map(|v| self.text(v).trim().to_owned()),
                ),
                "identifier" if Some(child) != name_node => {
                    values.push(self.text(child).trim().to_owned());
                }
                _ => {}
            }
        }

        EnumDecl {
            name: name_node
                .map(|n| self.text(n).trim().to_owned())
                .unwrap_or_default(),
            values,
            span: span_of(node),
        }
    }

    // --- Statements ---

    fn lower_block(&self, node: Node) -> Vec<Stmt> {
        named_children(node)
            .into_iter()
            .map(|c| self.lower_stmt(c))
            .collect()
    }

    fn lower_stmt(&self, node: Node) -> Stmt {
        match node.kind() {
            "statement" => match named_children(node).as_slice() {
                [inner] => self.lower_stmt(*inner),
                inner => Stmt::Block(inner.iter().map(|c| self.lower_stmt(*c)).collect()),
            },
            "block_statement" | "unchecked_block" | "ERROR" => Stmt::Block(self.lower_block(node)),
            "expression_statement" => match named_children(node).first() {
                Some(inner) => Stmt::Expr(self.lower_expr(*inner)),
                None => Stmt::Block(vec![]),
            },
            "variable_declaration_statement" => Stmt::VarDecl(
                named_children(node)
                    .into_iter()
                    .filter(|c| {
                        !matches!(c.kind(), "variable_declaration" | "variable_declaration_tuple")
                    })
                    .map(|c| self.lower_expr(c))
                    .collect(),
            ),
            "if_statement" => {
                let named = named_children(node);
                let condition = node.child_by_field_name("condition").or_else(|| named.first().copied());
                let then_branch = node.child_by_field_name("body").or_else(|| named.get(1).copied());
                let else_branch = node.child_by_field_name("else").or_else(|| named.get(2).copied());
                Stmt::If {
                    condition: self.lower_opt_expr(condition),
                    then_branch: Box::new(self.lower_opt_stmt(then_branch)),
                    else_branch: else_branch.map(|n| Box::new(self.lower_stmt(n))),
                }
            }
            "for_statement" => {
                let named = named_children(node);
                let body = node.child_by_field_name("body").or_else(|| named.last().copied());
                let header = named
                    .iter()
                    .filter(|c| Some(**c) != body)
                    .map(|c| self.lower_stmt(*c))
                    .collect();
                Stmt::For {
                    header,
                    body: Box::new(self.lower_opt_stmt(body)),
                }
            }
            "while_statement" => {
                let named = named_children(node);
                let condition = node.child_by_field_name("condition").or_else(|| named.first().copied());
                let body = node.child_by_field_name("body").or_else(|| named.get(1).copied());
                Stmt::While {
                    condition: self.lower_opt_expr(condition),
                    body: Box::new(self.lower_opt_stmt(body)),
                }
            }
            "do_while_statement" => {
                let named = named_children(node);
                let body = node.child_by_field_name("body").or_else(|| named.first().copied());
                let condition = node.child_by_field_name("condition").or_else(|| named.get(1).copied());
                Stmt::DoWhile {
                    body: Box::new(self.lower_opt_stmt(body)),
                    condition: self.lower_opt_expr(condition),
                }
            }
            "return_statement" => {
                Stmt::Return(named_children(node).first().map(|c| self.lower_expr(*c)))
            }
            "emit_statement" => {
                let named = named_children(node);
                let event = node.child_by_field_name("name").or_else(|| named.first().copied());
                let args = named
                    .iter()
                    .filter(|c| Some(**c) != event)
                    .flat_map(|c| self.lower_argument(*c))
                    .collect();
                Stmt::Emit {
                    event: self.lower_opt_expr(event),
                    args,
                }
            }
            "revert_statement" => Stmt::Revert(
                named_children(node)
                    .into_iter()
                    .flat_map(|c| self.lower_argument(c))
                    .collect(),
            ),
            "try_statement" => {
                let named = named_children(node);
                let call = node.child_by_field_name("attempt").or_else(|| named.first().copied());
                let mut clauses = Vec::new();
                for child in named.iter().filter(|c| Some(**c) != call) {
                    match child.kind() {
                        "block_statement" => clauses.push(self.lower_stmt(*child)),
                        "catch_clause" => {
                            let blocks = named_children(*child)
                                .into_iter()
                                .filter(|c| c.kind() == "block_statement")
                                .map(|c| self.lower_stmt(c))
                                .collect();
                            clauses.push(Stmt::Block(blocks));
                        }
                        _ => {}
                    }
                }
                Stmt::Try {
                    call: self.lower_opt_expr(call),
                    clauses,
                }
            }
            "assembly_statement" => Stmt::Assembly,
            "break_statement" => Stmt::Break,
            "continue_statement" => Stmt::Continue,
            _ => Stmt::Expr(self.lower_expr(node)),
        }
    }

    fn lower_opt_stmt(&self, node: Option<Node>) -> Stmt {
        node.map_or(Stmt::Block(vec![]), |n| self.lower_stmt(n))
    }

    // --- Expressions ---

    fn lower_opt_expr(&self, node: Option<Node>) -> Expr {
        node.map_or(Expr::Opaque(vec![]), |n| self.lower_expr(n))
    }

    /// Call arguments are wrapped in `call_argument` nodes.
    fn lower_argument(&self, node: Node) -> Vec<Expr> {
        if node.kind() == "call_argument" {
            named_children(node)
                .into_iter()
                .map(|c| self.lower_expr(c))
                .collect()
        } else {
            vec![self.lower_expr(node)]
        }
    }

    fn lower_children(&self, node: Node) -> Vec<Expr> {
        named_children(node)
            .into_iter()
            .map(|c| self.lower_expr(c))
            .collect()
    }

    fn lower_expr(&self, node: Node) -> Expr {
        let node = unwrap_expression(node);
        let kind = node.kind();
        match kind {
            "identifier" => Expr::Ident(self.text(node).to_owned()),
            "member_expression" => {
                let named = named_children(node);
                let object = node.child_by_field_name("object").or_else(|| named.first().copied());
                let property = node
                    .child_by_field_name("property")
                    .or_else(|| named.last().copied())
                    .map(|n| self.text(n).trim().to_owned())
                    .unwrap_or_default();
                Expr::Member {
                    object: Box::new(self.lower_opt_expr(object)),
                    property,
                }
            }
            "call_expression" => {
                let named = named_children(node);
                let callee = node.child_by_field_name("function").or_else(|| named.first().copied());
                let args: Vec<Expr> = named
                    .iter()
                    .filter(|c| Some(**c) != callee)
                    .flat_map(|c| self.lower_argument(*c))
                    .collect();
                let Some(callee) = callee else {
                    return Expr::Opaque(args);
                };
                let callee_node = unwrap_expression(callee);
                if callee_node.kind() == "primitive_type" && args.len() == 1 {
                    return Expr::TypeCast {
                        target: render_type(self.text(callee_node)),
                        arg: Box::new(args.into_iter().next().unwrap_or(Expr::Literal)),
                    };
                }
                Expr::Call {
                    callee: Box::new(self.lower_expr(callee_node)),
                    args,
                }
            }
            "payable_conversion_expression" => {
                let arg = named_children(node)
                    .into_iter()
                    .next()
                    .map_or(Expr::Literal, |n| self.lower_expr(n));
                Expr::TypeCast {
                    target: "payable".to_owned(),
                    arg: Box::new(arg),
                }
            }
            "type_cast_expression" => {
                let named = named_children(node);
                let target = named
                    .first()
                    .map(|n| render_type(self.text(*n)))
                    .unwrap_or_default();
                Expr::TypeCast {
                    target,
                    arg: Box::new(self.lower_opt_expr(named.get(1).copied())),
                }
            }
            "binary_expression" => {
                let named = named_children(node);
                let lhs = node.child_by_field_name("left").or_else(|| named.first().copied());
                let rhs = node.child_by_field_name("right").or_else(|| named.last().copied());
                let op = node
                    .child_by_field_name("operator")
                    .map(|n| self.text(n).trim().to_owned())
                    .or_else(|| {
                        all_children(node)
                            .into_iter()
                            .find(|c| !c.is_named())
                            .map(|c| c.kind().to_owned())
                    })
                    .unwrap_or_default();
                Expr::Binary {
                    op: BinaryOp::from_operator(&op),
                    lhs: Box::new(self.lower_opt_expr(lhs)),
                    rhs: Box::new(self.lower_opt_expr(rhs)),
                }
            }
            "unary_expression" | "update_expression" => {
                Expr::Unary(Box::new(self.lower_opt_expr(named_children(node).first().copied())))
            }
            "ternary_expression" => {
                let named = named_children(node);
                Expr::Ternary {
                    condition: Box::new(self.lower_opt_expr(named.first().copied())),
                    then_value: Box::new(self.lower_opt_expr(named.get(1).copied())),
                    else_value: Box::new(self.lower_opt_expr(named.get(2).copied())),
                }
            }
            "assignment_expression" | "augmented_assignment_expression" => {
                let named = named_children(node);
                Expr::Assign {
                    target: Box::new(self.lower_opt_expr(named.first().copied())),
                    value: Box::new(self.lower_opt_expr(named.last().copied())),
                }
            }
            "array_access" => {
                let named = named_children(node);
                let base = node.child_by_field_name("base").or_else(|| named.first().copied());
                let index = node.child_by_field_name("index").or_else(|| named.get(1).copied());
                Expr::Index {
                    base: Box::new(self.lower_opt_expr(base)),
                    index: index.map(|n| Box::new(self.lower_expr(n))),
                }
            }
            "tuple_expression" | "inline_array_expression" | "parenthesized_expression" => {
                Expr::Tuple(self.lower_children(node))
            }
            "new_expression" => {
                let named = named_children(node);
                let target = node.child_by_field_name("name").or_else(|| named.first().copied());
                Expr::New(target.map(|n| render_type(self.text(n))).unwrap_or_default())
            }
            // Call options `target.call{value: v}` lower to their target.
            "struct_expression" => {
                let named = named_children(node);
                let target = node.child_by_field_name("type").or_else(|| named.first().copied());
                self.lower_opt_expr(target)
            }
            "primitive_type" | "user_defined_type" | "type_name" => {
                Expr::Ident(render_type(self.text(node)))
            }
            "boolean_literal" | "number_literal" | "string_literal" | "hex_string_literal"
            | "unicode_string_literal" | "string" | "true" | "false" => Expr::Literal,
            _ if kind.ends_with("_literal") => Expr::Literal,
            _ => Expr::Opaque(self.lower_children(node)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_contract(unit: &SourceUnit) -> &ContractDecl {
        unit.items
            .iter()
            .find_map(|item| match item {
                SourceItem::Contract(c) => Some(c),
                SourceItem::Other => None,
            })
            .unwrap()
    }

    #[test]
    fn test_render_type_mapping() {
        assert_eq!(
            render_type("mapping (address=>mapping(address =>  uint256))"),
            "mapping(address => mapping(address => uint256))"
        );
        assert_eq!(render_type("uint256 [ ]"), "uint256[]");
        assert_eq!(render_type("address  payable"), "address payable");
    }

    #[test]
    fn test_lower_contract_header() {
        let source = "abstract contract Vault is Ownable, Pausable {\n}\n";
        let unit = parse_source(source).unwrap();
        let contract = first_contract(&unit);
        assert_eq!(contract.name, "Vault");
        assert_eq!(contract.kind, ContractKind::Abstract);
        assert_eq!(contract.bases, vec!["Ownable", "Pausable"]);
    }

    #[test]
    fn test_lower_call_shapes() {
        let source = r#"
contract C {
    function f(address a) public {
        token.transfer(a, 1);
        IERC20(a).approve(a, 2);
        helper();
    }
}
"#;
        let unit = parse_source(source).unwrap();
        let contract = first_contract(&unit);
        let Member::Function(func) = &contract.members[0] else {
            panic!("expected function");
        };
        let body = func.body.as_ref().unwrap();
        assert_eq!(body.len(), 3);

        let Stmt::Expr(Expr::Call { callee, .. }) = &body[0] else {
            panic!("expected call");
        };
        assert!(matches!(callee.as_ref(), Expr::Member { property, .. } if property == "transfer"));

        let Stmt::Expr(Expr::Call { callee, .. }) = &body[1] else {
            panic!("expected call");
        };
        let Expr::Member { object, .. } = callee.as_ref() else {
            panic!("expected member callee");
        };
        assert!(matches!(object.as_ref(), Expr::Call { .. }));

        let Stmt::Expr(Expr::Call { callee, .. }) = &body[2] else {
            panic!("expected call");
        };
        assert_eq!(callee.as_ref(), &Expr::Ident("helper".to_owned()));
    }

    #[test]
    fn test_garbage_is_unparseable() {
        let result = parse_source("}}}{{{ ;;; )))");
        assert!(matches!(result, Err(ParseError::Unparseable(_))));
    }
}
