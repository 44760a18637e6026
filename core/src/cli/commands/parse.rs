use super::{read_source, to_json};
use crate::cli::OutputFormat;
use crate::error::AppError;
use crate::model::{ContractModel, Function};
use crate::parser;
use std::fmt::Write;

pub fn run(file: &str, format: OutputFormat) -> Result<String, String> {
    let source = read_source(file)?;
    let model = parser::parse(&source).map_err(|e| AppError::from(e).to_string())?;

    match format {
        OutputFormat::Json => to_json(&model),
        OutputFormat::Text => Ok(render_model(&model)),
    }
}

fn render_function(out: &mut String, func: &Function) {
    let params: Vec<String> = func
        .parameters
        .iter()
        .map(|p| {
            if p.name.is_empty() {
                p.type_name.clone()
            } else {
                format!("{} {}", p.type_name, p.name)
            }
        })
        .collect();
    let _ = write!(
        out,
        "  {}({}) {} {}",
        func.key(),
        params.join(", "),
        func.visibility,
        func.mutability
    );
    if !func.modifiers.is_empty() {
        let _ = write!(out, " {}", func.modifiers.join(" "));
    }
    if !func.returns.is_empty() {
        let returns: Vec<&str> = func.returns.iter().map(|r| r.type_name.as_str()).collect();
        let _ = write!(out, " returns ({})", returns.join(", "));
    }
    let _ = writeln!(
        out,
        "  [lines {}-{}, complexity {}]",
        func.span.start_line, func.span.end_line, func.complexity
    );
    if !func.calls.is_empty() {
        let calls: Vec<&str> = func.calls.iter().map(String::as_str).collect();
        let _ = writeln!(out, "      calls: {}", calls.join(", "));
    }
    if !func.external_calls.is_empty() {
        let calls: Vec<String> = func.external_calls.iter().map(ToString::to_string).collect();
        let _ = writeln!(out, "      external: {}", calls.join(", "));
    }
}

fn render_model(model: &ContractModel) -> String {
    let mut out = String::new();
    let _ = write!(out, "{} ({})", model.name, model.kind.as_str());
    if !model.pragma.is_empty() {
        let _ = write!(out, " pragma solidity {}", model.pragma);
    }
    let _ = writeln!(
        out,
        "\n{} lines, total complexity {}",
        model.total_lines, model.total_complexity
    );

    if !model.inherits.is_empty() {
        let _ = writeln!(out, "Inherits: {}", model.inherits.join(", "));
    }
    for import in &model.imports {
        let _ = write!(out, "Import: {}", import.path);
        if !import.symbols.is_empty() {
            let _ = write!(out, " {{{}}}", import.symbols.join(", "));
        }
        if let Some(alias) = &import.alias {
            let _ = write!(out, " as {alias}");
        }
        out.push('\n');
    }

    if !model.functions.is_empty() {
        let _ = writeln!(out, "\nFunctions ({}):", model.functions.len());
        for func in &model.functions {
            render_function(&mut out, func);
        }
    }

    if !model.events.is_empty() {
        let _ = writeln!(out, "\nEvents ({}):", model.events.len());
        for event in &model.events {
            let params: Vec<String> = event
                .parameters
                .iter()
                .map(|p| {
                    let indexed = if p.indexed { " indexed" } else { "" };
                    format!("{}{indexed} {}", p.type_name, p.name)
                })
                .collect();
            let _ = writeln!(out, "  {}({})", event.name, params.join(", "));
        }
    }

    if !model.variables.is_empty() {
        let _ = writeln!(out, "\nState variables ({}):", model.variables.len());
        for var in &model.variables {
            let mut flags = String::new();
            if var.constant {
                flags.push_str(" constant");
            }
            if var.immutable {
                flags.push_str(" immutable");
            }
            let _ = writeln!(
                out,
                "  {} {}{flags} {}",
                var.type_name, var.visibility, var.name
            );
        }
    }

    if !model.modifiers.is_empty() {
        let names: Vec<&str> = model.modifiers.iter().map(|m| m.name.as_str()).collect();
        let _ = writeln!(out, "\nModifiers: {}", names.join(", "));
    }
    if !model.structs.is_empty() {
        let names: Vec<&str> = model.structs.iter().map(|s| s.name.as_str()).collect();
        let _ = writeln!(out, "Structs: {}", names.join(", "));
    }
    if !model.enums.is_empty() {
        let names: Vec<&str> = model.enums.iter().map(|e| e.name.as_str()).collect();
        let _ = writeln!(out, "Enums: {}", names.join(", "));
    }

    out.trim_end().to_owned()
}
