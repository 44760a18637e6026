//! Structured contract model and diff result types.
//!
//! A `ContractModel` is produced fresh by every parse and never mutated
//! afterwards. Diff types carry derived fields (`impact`) that only the
//! differencer can set.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// The kind of top-level declaration a contract model was built from.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ContractKind {
    #[default]
    Contract,
    Interface,
    Library,
    Abstract,
}

impl ContractKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ContractKind::Contract => "contract",
            ContractKind::Interface => "interface",
            ContractKind::Library => "library",
            ContractKind::Abstract => "abstract contract",
        }
    }
}

/// Function and variable visibility, ordered from most to least restrictive.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Private,
    Internal,
    External,
    Public,
}

impl Visibility {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "private" => Some(Self::Private),
            "internal" => Some(Self::Internal),
            "external" => Some(Self::External),
            "public" => Some(Self::Public),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::Internal => "internal",
            Self::External => "external",
            Self::Public => "public",
        }
    }

    /// Whether the member is reachable by other contracts or off-chain callers.
    pub fn is_externally_visible(self) -> bool {
        matches!(self, Self::External | Self::Public)
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Mutability {
    Pure,
    View,
    #[default]
    Nonpayable,
    Payable,
}

impl Mutability {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "pure" => Some(Self::Pure),
            // Pre-0.5 spelling of `view`.
            "view" | "constant" => Some(Self::View),
            "payable" => Some(Self::Payable),
            "nonpayable" => Some(Self::Nonpayable),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pure => "pure",
            Self::View => "view",
            Self::Nonpayable => "nonpayable",
            Self::Payable => "payable",
        }
    }

    /// `pure` and `view` functions cannot modify state.
    pub fn is_read_only(self) -> bool {
        matches!(self, Self::Pure | Self::View)
    }
}

impl fmt::Display for Mutability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Distinguishes named functions from the special unnamed entry points.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FunctionKind {
    #[default]
    Function,
    Constructor,
    Fallback,
    Receive,
}

impl FunctionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Function => "function",
            Self::Constructor => "constructor",
            Self::Fallback => "fallback",
            Self::Receive => "receive",
        }
    }
}

/// A line range within a source text (1-based, inclusive).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LineSpan {
    #[serde(rename = "startLine")]
    pub start_line: u32,
    #[serde(rename = "endLine")]
    pub end_line: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    /// `memory`, `storage` or `calldata` when written explicitly.
    #[serde(rename = "storageLocation", skip_serializing_if = "Option::is_none")]
    pub storage_location: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub indexed: bool,
}

/// A member call whose receiver is another contract.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExternalCall {
    /// Receiver variable name, or the target type of a cast receiver.
    pub contract: String,
    pub function: String,
}

impl fmt::Display for ExternalCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.contract, self.function)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Function {
    /// Empty for constructors, fallback and receive functions.
    pub name: String,
    pub kind: FunctionKind,
    #[serde(rename = "isConstructor")]
    pub is_constructor: bool,
    pub visibility: Visibility,
    pub mutability: Mutability,
    pub parameters: Vec<Parameter>,
    pub returns: Vec<Parameter>,
    pub modifiers: Vec<String>,
    pub span: LineSpan,
    pub calls: BTreeSet<String>,
    #[serde(rename = "externalCalls")]
    pub external_calls: Vec<ExternalCall>,
    pub complexity: u32,
}

impl Function {
    /// Name used to match the function across two models.
    pub fn key(&self) -> &str {
        if self.name.is_empty() {
            self.kind.as_str()
        } else {
            &self.name
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Variable {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub visibility: Visibility,
    pub constant: bool,
    pub immutable: bool,
    pub span: LineSpan,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Event {
    pub name: String,
    pub parameters: Vec<EventParameter>,
    pub span: LineSpan,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Modifier {
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub span: LineSpan,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Import {
    pub path: String,
    /// Empty for bare and default imports.
    pub symbols: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StructMember {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StructDef {
    pub name: String,
    pub members: Vec<StructMember>,
    pub span: LineSpan,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnumDef {
    pub name: String,
    pub members: Vec<String>,
    pub span: LineSpan,
}

/// Structured view of the main contract in a source text.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContractModel {
    pub name: String,
    pub kind: ContractKind,
    pub pragma: String,
    pub imports: Vec<Import>,
    pub inherits: Vec<String>,
    pub functions: Vec<Function>,
    pub events: Vec<Event>,
    pub variables: Vec<Variable>,
    pub modifiers: Vec<Modifier>,
    pub structs: Vec<StructDef>,
    pub enums: Vec<EnumDef>,
    #[serde(rename = "totalLines")]
    pub total_lines: u32,
    #[serde(rename = "totalComplexity")]
    pub total_complexity: u32,
}

impl ContractModel {
    /// Stand-in for a side that failed to parse.
    pub fn empty() -> Self {
        Self::default()
    }
}

// --- Diff types ---

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Added,
    Removed,
    Modified,
}

impl ChangeType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Removed => "removed",
            Self::Modified => "modified",
        }
    }
}

/// Every change belongs to exactly one of these.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ChangeCategory {
    Function,
    Event,
    Variable,
    Modifier,
    Import,
    Inheritance,
}

impl ChangeCategory {
    pub const ALL: [ChangeCategory; 6] = [
        Self::Function,
        Self::Event,
        Self::Variable,
        Self::Modifier,
        Self::Import,
        Self::Inheritance,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Function => "function",
            Self::Event => "event",
            Self::Variable => "variable",
            Self::Modifier => "modifier",
            Self::Import => "import",
            Self::Inheritance => "inheritance",
        }
    }
}

impl fmt::Display for ChangeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Impact {
    Breaking,
    NonBreaking,
}

/// One structural difference between two contract models.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiffChange {
    #[serde(rename = "type")]
    pub change_type: ChangeType,
    pub category: ChangeCategory,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,
    pub description: String,
    impact: Impact,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl DiffChange {
    pub(crate) fn new(
        change_type: ChangeType,
        category: ChangeCategory,
        name: impl Into<String>,
        breaking: bool,
        description: impl Into<String>,
    ) -> Self {
        Self {
            change_type,
            category,
            name: name.into(),
            before: None,
            after: None,
            description: description.into(),
            impact: if breaking {
                Impact::Breaking
            } else {
                Impact::NonBreaking
            },
            explanation: None,
        }
    }

    pub(crate) fn with_before(mut self, before: impl Into<String>) -> Self {
        self.before = Some(before.into());
        self
    }

    pub(crate) fn with_after(mut self, after: impl Into<String>) -> Self {
        self.after = Some(after.into());
        self
    }

    pub(crate) fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = Some(explanation.into());
        self
    }

    pub fn impact(&self) -> Impact {
        self.impact
    }

    pub fn is_breaking(&self) -> bool {
        self.impact == Impact::Breaking
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SecurityImpact {
    pub change: String,
    pub impact: String,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    None,
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::None => "none",
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }
}

/// A breaking change as reported in the semantic payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BreakingChange {
    pub category: ChangeCategory,
    pub name: String,
    pub description: String,
}

/// Whether the semantic payload came from the collaborator or from rules alone.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum AnalysisMode {
    Collaborator,
    RuleOnly,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticAnalysis {
    pub mode: AnalysisMode,
    pub summary: String,
    #[serde(rename = "breakingChanges")]
    pub breaking_changes: Vec<BreakingChange>,
    #[serde(rename = "securityImpacts")]
    pub security_impacts: Vec<SecurityImpact>,
    #[serde(rename = "migrationGuide")]
    pub migration_guide: String,
    #[serde(rename = "riskLevel")]
    pub risk_level: RiskLevel,
}

/// Who a side of the comparison is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractIdentity {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub name: String,
    #[serde(rename = "sourceHash")]
    pub source_hash: String,
    pub source: String,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryCounts {
    pub added: u32,
    pub removed: u32,
    pub modified: u32,
}

impl CategoryCounts {
    fn record(&mut self, change_type: ChangeType) {
        match change_type {
            ChangeType::Added => self.added += 1,
            ChangeType::Removed => self.removed += 1,
            ChangeType::Modified => self.modified += 1,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiffStats {
    #[serde(rename = "linesAdded")]
    pub lines_added: u32,
    #[serde(rename = "linesRemoved")]
    pub lines_removed: u32,
    pub functions: CategoryCounts,
    pub events: CategoryCounts,
    pub variables: CategoryCounts,
    pub modifiers: CategoryCounts,
    pub imports: CategoryCounts,
    pub inheritance: CategoryCounts,
}

impl DiffStats {
    pub fn counts(&self, category: ChangeCategory) -> CategoryCounts {
        match category {
            ChangeCategory::Function => self.functions,
            ChangeCategory::Event => self.events,
            ChangeCategory::Variable => self.variables,
            ChangeCategory::Modifier => self.modifiers,
            ChangeCategory::Import => self.imports,
            ChangeCategory::Inheritance => self.inheritance,
        }
    }

    /// Tally structural changes per category and type.
    pub fn record_changes(&mut self, changes: &[DiffChange]) {
        for change in changes {
            let counts = match change.category {
                ChangeCategory::Function => &mut self.functions,
                ChangeCategory::Event => &mut self.events,
                ChangeCategory::Variable => &mut self.variables,
                ChangeCategory::Modifier => &mut self.modifiers,
                ChangeCategory::Import => &mut self.imports,
                ChangeCategory::Inheritance => &mut self.inheritance,
            };
            counts.record(change.change_type);
        }
    }
}

/// A component that fell back to a degraded mode while building a result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Degradation {
    pub component: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffResult {
    #[serde(rename = "contractA")]
    pub contract_a: ContractIdentity,
    #[serde(rename = "contractB")]
    pub contract_b: ContractIdentity,
    pub changes: Vec<DiffChange>,
    pub stats: DiffStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semantic: Option<SemanticAnalysis>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub degraded: Vec<Degradation>,
}
