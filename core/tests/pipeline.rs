//! End-to-end checks from source text through the structural diff and the
//! security classifier.

use contract_diff::diff::{diff_lines, diff_lines_with_limit, LineType};
use contract_diff::model::{ChangeCategory, ChangeType, Severity};
use contract_diff::{
    classify_security_impacts, compare, diff_models, parse, AnalysisConfig, ContractSource,
};

/// Wrap contract members in a minimal compilation unit.
fn contract(name: &str, body: &str) -> String {
    format!("pragma solidity ^0.8.0;\n\ncontract {name} {{\n{body}\n}}\n")
}

#[test]
fn test_removed_external_function_is_breaking() {
    let before = contract(
        "Token",
        r#"
    function transfer(address to, uint256 amount) external returns (bool) {
        return true;
    }
    function name() external pure returns (string memory) {
        return "T";
    }"#,
    );
    let after = contract(
        "Token",
        r#"
    function name() external pure returns (string memory) {
        return "T";
    }"#,
    );

    let changes = diff_models(&parse(&before).unwrap(), &parse(&after).unwrap());
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].change_type, ChangeType::Removed);
    assert_eq!(changes[0].category, ChangeCategory::Function);
    assert_eq!(changes[0].name, "transfer");
    assert!(changes[0].is_breaking());
}

#[test]
fn test_event_parameter_rename_is_not_a_change() {
    let before = contract(
        "Token",
        "    event Transfer(address indexed from, address indexed to, uint256 value);",
    );
    let after = contract(
        "Token",
        "    event Transfer(address indexed from, address indexed to, uint256 amount);",
    );

    let changes = diff_models(&parse(&before).unwrap(), &parse(&after).unwrap());
    assert!(changes.is_empty(), "unexpected changes: {changes:?}");
}

#[test]
fn test_single_line_change_in_long_file() {
    let old: Vec<String> = (0..500).map(|i| format!("line {i}")).collect();
    let mut new = old.clone();
    new[250] = "line 250 changed".to_owned();

    let lines = diff_lines(&old.join("\n"), &new.join("\n"));
    let added = lines.iter().filter(|l| l.line_type == LineType::Added).count();
    let removed = lines
        .iter()
        .filter(|l| l.line_type == LineType::Removed)
        .count();
    assert_eq!((added, removed), (1, 1));
    assert_eq!(lines.len(), 501);
}

#[test]
fn test_complexity_counts_checks_branches_and_short_circuits() {
    let source = contract(
        "Calc",
        r#"
    uint256 x;
    function f(uint256 a, uint256 b) public {
        require(a > 0, "a");
        require(b > 0, "b");
        require(a != b, "eq");
        if (a > b) {
            x = 1;
        }
        if (a > 1 && b > 1) {
            x = 2;
        }
    }"#,
    );

    let model = parse(&source).unwrap();
    let f = model.functions.iter().find(|f| f.name == "f").unwrap();
    assert_eq!(f.complexity, 7);
    assert_eq!(model.total_complexity, 7);
}

#[test]
fn test_removed_modifier_reports_every_guarded_function() {
    let before = contract(
        "Vault",
        r#"
    address owner;
    modifier onlyOwner() {
        require(msg.sender == owner, "owner");
        _;
    }
    function pause() external onlyOwner {}
    function withdraw() external onlyOwner {}"#,
    );
    let after = contract(
        "Vault",
        r#"
    address owner;
    function pause() external {}
    function withdraw() external {}"#,
    );

    let a = parse(&before).unwrap();
    let b = parse(&after).unwrap();
    let changes = diff_models(&a, &b);
    let impacts = classify_security_impacts(&changes, &a, &b);

    let high: Vec<_> = impacts
        .iter()
        .filter(|i| i.severity == Severity::High)
        .collect();
    assert_eq!(high.len(), 1);
    assert!(high[0].impact.contains("pause"));
    assert!(high[0].impact.contains("withdraw"));
}

#[test]
fn test_identical_models_have_no_changes() {
    let source = contract(
        "Same",
        r#"
    uint256 public total;
    event Bumped(uint256 by);
    function bump(uint256 by) external {
        total += by;
        emit Bumped(by);
    }"#,
    );
    let model = parse(&source).unwrap();
    assert!(diff_models(&model, &model).is_empty());
}

#[test]
fn test_comparison_is_deterministic() {
    let before = contract(
        "Bank",
        r#"
    mapping(address => uint256) public balances;
    event Deposit(address who, uint256 amount);
    function deposit() external payable {
        balances[msg.sender] += msg.value;
    }
    function balance() external view returns (uint256) {
        return balances[msg.sender];
    }"#,
    );
    let after = contract(
        "Bank",
        r#"
    mapping(address => uint256) balances;
    function deposit() external payable {
        balances[msg.sender] += msg.value;
    }
    function sweep(address to) external {
        payable(to).transfer(address(this).balance);
    }"#,
    );

    let config = AnalysisConfig::default();
    let first = compare(
        &ContractSource::new(before.clone()),
        &ContractSource::new(after.clone()),
        &config,
    );
    let second = compare(
        &ContractSource::new(before),
        &ContractSource::new(after),
        &config,
    );
    assert_eq!(first.changes, second.changes);
    assert_eq!(first.stats, second.stats);
    assert_eq!(
        first.contract_a.source_hash,
        second.contract_a.source_hash
    );
}

#[test]
fn test_private_function_removal_is_not_breaking() {
    let before = contract(
        "Lib",
        r#"
    function api() public pure returns (uint256) { return 1; }
    function helper() private pure returns (uint256) { return 2; }"#,
    );
    let after = contract("Lib", "");

    let changes = diff_models(&parse(&before).unwrap(), &parse(&after).unwrap());
    let api = changes.iter().find(|c| c.name == "api").unwrap();
    let helper = changes.iter().find(|c| c.name == "helper").unwrap();
    assert!(api.is_breaking());
    assert!(!helper.is_breaking());
}

#[test]
fn test_uint_alias_is_not_a_type_change() {
    let before = contract(
        "Store",
        r#"
    uint public count;
    function set(uint value) external { count = value; }"#,
    );
    let after = contract(
        "Store",
        r#"
    uint256 public count;
    function set(uint256 value) external { count = value; }"#,
    );

    let changes = diff_models(&parse(&before).unwrap(), &parse(&after).unwrap());
    assert!(changes.is_empty(), "unexpected changes: {changes:?}");
}

#[test]
fn test_linear_fallback_accounts_for_every_line() {
    let old: Vec<String> = (0..40).map(|i| format!("old {i}")).collect();
    let new: Vec<String> = (0..30).map(|i| format!("new {i}")).collect();

    let lines = diff_lines_with_limit(&old.join("\n"), &new.join("\n"), 100);
    let removed = lines
        .iter()
        .filter(|l| l.line_type == LineType::Removed)
        .count();
    let added = lines.iter().filter(|l| l.line_type == LineType::Added).count();
    assert_eq!(removed, 40);
    assert_eq!(added, 30);
}
