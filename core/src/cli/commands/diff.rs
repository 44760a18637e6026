use super::{read_source, to_json};
use crate::cli::OutputFormat;
use crate::compare::{compare_with_analysis, rule_only_analysis, ContractSource};
use crate::config::AnalysisConfig;
use crate::diff::{diff_lines_with_limit, LineType};
use crate::error::AppError;
use crate::model::DiffResult;
use crate::semantic::ClaudeAnalyzer;
use std::fmt::Write;
use std::sync::Arc;
use std::time::Duration;

pub struct DiffArgs<'a> {
    pub old: &'a str,
    pub new: &'a str,
    pub semantic: bool,
    pub model: Option<&'a str>,
    pub timeout: Option<u64>,
    pub address_a: Option<&'a str>,
    pub address_b: Option<&'a str>,
    pub lines: bool,
}

fn side(source: String, address: Option<&str>) -> ContractSource {
    let side = ContractSource::new(source);
    match address {
        Some(address) => side.with_address(address),
        None => side,
    }
}

pub fn run(args: &DiffArgs<'_>, format: OutputFormat) -> Result<String, String> {
    let a = side(read_source(args.old)?, args.address_a);
    let b = side(read_source(args.new)?, args.address_b);

    let mut config = AnalysisConfig::from_env();
    if let Some(model) = args.model {
        config.model = model.to_owned();
    }
    if let Some(secs) = args.timeout {
        if secs == 0 {
            return Err(AppError::config("--timeout must be at least 1 second").to_string());
        }
        config.semantic_timeout = Duration::from_secs(secs);
    }

    let result = if args.semantic {
        let analyzer = Arc::new(ClaudeAnalyzer::new(
            config.model.clone(),
            config.custom_command.clone(),
        ));
        if !analyzer.is_available() {
            log::warn!("[cli] claude CLI not found; expect the rule-only fallback");
        }
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(|e| format!("Failed to start runtime: {e}"))?;
        let result = runtime.block_on(compare_with_analysis(&a, &b, &config, analyzer, None));
        // Dropping the runtime would wait for work left behind by a timed-out call.
        runtime.shutdown_background();
        result
    } else {
        rule_only_analysis(&a, &b, &config)
    };

    match format {
        OutputFormat::Json => to_json(&result),
        OutputFormat::Text => {
            let mut out = render_result(&result);
            if args.lines {
                out.push_str("\n\n");
                out.push_str(&render_lines(&a.source, &b.source, config.lcs_cell_limit));
            }
            Ok(out)
        }
    }
}

fn render_result(result: &DiffResult) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} ({}) -> {} ({})",
        result.contract_a.name,
        result.contract_a.source_hash,
        result.contract_b.name,
        result.contract_b.source_hash
    );
    let _ = writeln!(
        out,
        "+{} -{} lines",
        result.stats.lines_added, result.stats.lines_removed
    );

    if result.changes.is_empty() {
        out.push_str("\nNo structural changes\n");
    } else {
        let _ = writeln!(out, "\nChanges ({}):", result.changes.len());
        for change in &result.changes {
            let marker = if change.is_breaking() { " [BREAKING]" } else { "" };
            let _ = writeln!(
                out,
                "  {} {} {}{marker}: {}",
                change.change_type.as_str(),
                change.category,
                change.name,
                change.description
            );
            if let Some(explanation) = &change.explanation {
                let _ = writeln!(out, "      {explanation}");
            }
        }
    }

    if let Some(semantic) = &result.semantic {
        if !semantic.security_impacts.is_empty() {
            let _ = writeln!(
                out,
                "\nSecurity impacts ({}):",
                semantic.security_impacts.len()
            );
            for impact in &semantic.security_impacts {
                let _ = writeln!(
                    out,
                    "  [{}] {}: {}",
                    impact.severity.as_str(),
                    impact.change,
                    impact.impact
                );
                if let Some(recommendation) = &impact.recommendation {
                    let _ = writeln!(out, "      -> {recommendation}");
                }
            }
        }

        let _ = writeln!(out, "\nRisk: {}", semantic.risk_level.as_str());
        if !semantic.summary.is_empty() {
            let _ = writeln!(out, "Summary: {}", semantic.summary);
        }
        if !semantic.migration_guide.is_empty() {
            let _ = writeln!(out, "Migration: {}", semantic.migration_guide);
        }
    }

    for entry in &result.degraded {
        let _ = writeln!(out, "Degraded {}: {}", entry.component, entry.reason);
    }

    out.trim_end().to_owned()
}

fn render_lines(old: &str, new: &str, cell_limit: usize) -> String {
    diff_lines_with_limit(old, new, cell_limit)
        .iter()
        .map(|line| {
            let prefix = match line.line_type {
                LineType::Unchanged => ' ',
                LineType::Added => '+',
                LineType::Removed => '-',
            };
            format!("{prefix} {}", line.content)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
