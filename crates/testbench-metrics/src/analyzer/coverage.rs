//! Which parts of the source the generated tests appear to exercise.
//!
//! All ratios here are text heuristics over the test body. Nothing is
//! executed and nothing is instrumented.

use super::{Metrics, MetricsAnalyzer};
use crate::parser::{Branch, CodeParser, Condition, ConditionKind, Statement, StatementKind};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

static METHOD_DECL: Lazy<Regex> = Lazy::new(|| Regex::new(r"fun\s+(\w+)\s*\(").unwrap());
static METHOD_CALL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\w+)\(").unwrap());
static BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)test.*(?:boundary|limit|max|min).*").unwrap());
static COMPARISON_ASSERT: Lazy<Regex> = Lazy::new(|| Regex::new(r"assert.*[<>]").unwrap());
static IDENTIFIER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").unwrap());

static EDGE_CASES: Lazy<Vec<(&'static str, &'static str, Regex)>> = Lazy::new(|| {
    [
        ("zero", "a test mentions the value 0", r"(?i)test.*0"),
        ("negative", "a test mentions negative input", r"(?i)test.*negative"),
        ("empty", "a test mentions empty input", r"(?i)test.*empty"),
        ("null", "a test mentions null", r"(?i)test.*null"),
        ("large_values", "a test mentions large values", r"(?i)test.*large"),
    ]
    .into_iter()
    .map(|(kind, description, pattern)| (kind, description, Regex::new(pattern).unwrap()))
    .collect()
});

const NON_METHOD_CALLS: &[&str] = &[
    "if", "when", "for", "while", "catch", "switch", "return", "super", "this", "init",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeCase {
    pub kind: String,
    pub covered: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageMetrics {
    /// Source methods whose name appears in the test
    pub methods_covered: BTreeSet<String>,
    /// Methods declared in the source
    pub methods_total: usize,
    pub edge_cases: Vec<EdgeCase>,
    /// Lines that look like boundary tests
    pub boundary_tests: Vec<String>,
    pub line_coverage: f64,
    pub branch_coverage: f64,
    pub condition_coverage: f64,
    pub statement_coverage: f64,
    pub path_coverage: f64,
}

impl Default for CoverageMetrics {
    fn default() -> Self {
        Self {
            methods_covered: BTreeSet::new(),
            methods_total: 0,
            edge_cases: Vec::new(),
            boundary_tests: Vec::new(),
            line_coverage: 1.0,
            branch_coverage: 1.0,
            condition_coverage: 1.0,
            statement_coverage: 1.0,
            path_coverage: 1.0,
        }
    }
}

impl CoverageMetrics {
    pub fn edge_cases_covered(&self) -> usize {
        self.edge_cases.iter().filter(|e| e.covered).count()
    }

    pub fn ratios(&self) -> [f64; 5] {
        [
            self.line_coverage,
            self.branch_coverage,
            self.condition_coverage,
            self.statement_coverage,
            self.path_coverage,
        ]
    }
}

impl Metrics for CoverageMetrics {
    fn score(&self) -> f64 {
        self.ratios()
            .iter()
            .map(|r| r.clamp(0.0, 1.0) * 20.0)
            .sum()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CoverageAnalyzer {
    parser: CodeParser,
}

impl MetricsAnalyzer for CoverageAnalyzer {
    type Output = CoverageMetrics;

    fn analyze(&self, code: &str, test: &str) -> CoverageMetrics {
        let parsed = self.parser.parse(code);
        let declared = declared_methods(code);

        CoverageMetrics {
            methods_covered: declared
                .iter()
                .filter(|m| test.contains(m.as_str()))
                .cloned()
                .collect(),
            methods_total: declared.len(),
            edge_cases: edge_cases(test),
            boundary_tests: BOUNDARY
                .find_iter(test)
                .map(|m| m.as_str().to_string())
                .collect(),
            line_coverage: line_coverage(code, test),
            branch_coverage: ratio(&parsed.branches, |b| branch_covered(b, test)),
            condition_coverage: ratio(&parsed.conditions, |c| condition_covered(c, test)),
            statement_coverage: ratio(&parsed.statements, |s| statement_covered(s, test)),
            path_coverage: path_coverage(&parsed.branches, test),
        }
    }
}

fn declared_methods(code: &str) -> BTreeSet<String> {
    METHOD_DECL
        .captures_iter(code)
        .map(|caps| caps[1].to_string())
        .collect()
}

fn edge_cases(test: &str) -> Vec<EdgeCase> {
    EDGE_CASES
        .iter()
        .map(|(kind, description, pattern)| EdgeCase {
            kind: (*kind).to_string(),
            covered: pattern.is_match(test),
            description: Some((*description).to_string()),
        })
        .collect()
}

fn ratio<T>(items: &[T], covered: impl Fn(&T) -> bool) -> f64 {
    if items.is_empty() {
        return 1.0;
    }
    items.iter().filter(|item| covered(item)).count() as f64 / items.len() as f64
}

/// Builds a regex from a fixed prefix, escaped input text and a fixed
/// suffix. A pattern that fails to compile never matches.
fn matches_around(test: &str, prefix: &str, text: &str, suffix: &str) -> bool {
    Regex::new(&format!("{prefix}{}{suffix}", regex::escape(text)))
        .map(|re| re.is_match(test))
        .unwrap_or(false)
}

fn strip_whitespace(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

fn is_countable_line(line: &str) -> bool {
    !line.is_empty()
        && !line.starts_with("//")
        && !line.starts_with("/*")
        && !line.starts_with('*')
        && !line.chars().all(|c| "{}()[];,".contains(c))
}

fn line_coverage(code: &str, test: &str) -> f64 {
    let lines: Vec<&str> = code
        .lines()
        .map(str::trim)
        .filter(|line| is_countable_line(line))
        .collect();
    let compact_test = strip_whitespace(test);
    ratio(&lines, |line| line_covered(line, test, &compact_test))
}

fn line_covered(line: &str, test: &str, compact_test: &str) -> bool {
    let code_part = line.split("//").next().unwrap_or(line);
    let compact = strip_whitespace(code_part);
    if compact.is_empty() {
        return false;
    }

    compact_test.contains(&compact)
        || METHOD_CALL.captures_iter(code_part).any(|caps| {
            let name = &caps[1];
            !NON_METHOD_CALLS.contains(&name) && test.contains(name)
        })
}

fn branch_covered(branch: &Branch, test: &str) -> bool {
    matches_around(test, "test.*", &branch.condition, ".*true")
        && matches_around(test, "test.*", &branch.condition, ".*false")
}

fn condition_covered(condition: &Condition, test: &str) -> bool {
    let text = condition.content.as_str();
    if !test.contains(text) {
        return false;
    }
    match condition.kind {
        ConditionKind::Equality => test.contains("assertEquals"),
        ConditionKind::Inequality => test.contains("assertNotEquals"),
        ConditionKind::GreaterThan | ConditionKind::LessThan => COMPARISON_ASSERT.is_match(test),
        ConditionKind::Contains => test.contains("contains") || test.contains("assertTrue"),
        ConditionKind::Other => true,
    }
}

fn statement_covered(statement: &Statement, test: &str) -> bool {
    let content = statement.content.trim().trim_end_matches(';').trim();
    match statement.kind {
        StatementKind::Assignment => {
            let target = content.split('=').next().unwrap_or_default();
            match IDENTIFIER.find_iter(target).last() {
                Some(variable) => matches_around(test, "assert.*", variable.as_str(), ""),
                None => false,
            }
        }
        StatementKind::MethodCall => {
            let callee = content.split('(').next().unwrap_or_default();
            match IDENTIFIER.find_iter(callee).last() {
                Some(name) => test.contains(name.as_str()),
                None => false,
            }
        }
        StatementKind::Return => {
            let value = content.trim_start_matches("return").trim();
            !value.is_empty()
                && (matches_around(test, "assertEquals.*", value, "")
                    || matches_around(test, "assertThat.*", value, ""))
        }
        StatementKind::Other => test.contains(content),
    }
}

/// Share of non-empty branch subsets whose branches are all mentioned.
///
/// With `n` branches of which `k` are mentioned, the covered subsets are
/// exactly the non-empty subsets of those `k`, giving
/// `(2^k - 1) / (2^n - 1)`.
fn path_coverage(branches: &[Branch], test: &str) -> f64 {
    let n = branches.len();
    if n == 0 {
        return 1.0;
    }
    let k = branches
        .iter()
        .filter(|b| {
            test.contains(b.content.as_str()) && matches_around(test, "test.*", &b.condition, "")
        })
        .count();
    subset_ratio(k, n)
}

fn subset_ratio(k: usize, n: usize) -> f64 {
    if k == 0 {
        return 0.0;
    }
    if k >= n {
        return 1.0;
    }
    // 2^(k-n) * (1 - 2^-k) / (1 - 2^-n), stable for large n
    let kf = k as f64;
    let nf = n as f64;
    (kf - nf).exp2() * (1.0 - (-kf).exp2()) / (1.0 - (-nf).exp2())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze(code: &str, test: &str) -> CoverageMetrics {
        CoverageAnalyzer::default().analyze(code, test)
    }

    #[test]
    fn test_methods_covered() {
        let code = "fun push(x: Int) {}\nfun pop(): Int = 0\nfun peek(): Int = 0\n";
        let test = "stack.push(1)\nassertEquals(1, stack.pop())\n";

        let metrics = analyze(code, test);
        assert_eq!(metrics.methods_total, 3);
        assert_eq!(
            metrics.methods_covered,
            BTreeSet::from(["pop".to_string(), "push".to_string()])
        );
    }

    #[test]
    fn test_edge_cases_are_case_insensitive() {
        let test = "@Test\nfun `Test with NEGATIVE input`() {}\nfun `test null key`() {}\n";
        let metrics = analyze("", test);

        let covered: Vec<&str> = metrics
            .edge_cases
            .iter()
            .filter(|e| e.covered)
            .map(|e| e.kind.as_str())
            .collect();
        assert_eq!(covered, vec!["negative", "null"]);
        assert_eq!(metrics.edge_cases.len(), 5);
        assert_eq!(metrics.edge_cases_covered(), 2);
    }

    #[test]
    fn test_boundary_tests() {
        let test = "fun `test MAX size`() {}\nfun `test limit reached`() {}\nfun other() {}\n";
        let metrics = analyze("", test);
        assert_eq!(metrics.boundary_tests.len(), 2);
    }

    #[test]
    fn test_empty_source_is_fully_covered() {
        let metrics = analyze("", "anything");
        assert_eq!(metrics.ratios(), [1.0; 5]);
        assert_eq!(metrics.score(), 100.0);
    }

    #[test]
    fn test_regex_metacharacters_in_source_do_not_panic() {
        let code = "if (a[0] == (b + c)*) { x = y.*z; }\nval r = \"(\" + \"[\";\n";
        let test = "test something (( [ *+? \nassertEquals(x, 1)\n";
        let metrics = analyze(code, test);
        for r in metrics.ratios() {
            assert!((0.0..=1.0).contains(&r));
        }
    }

    #[test]
    fn test_branch_coverage_needs_both_outcomes() {
        let code = "if (n > 10) { big() }\n";
        let half = "test when n > 10 is true\n";
        let full = "test when n > 10 is true\ntest when n > 10 is false\n";

        assert_eq!(analyze(code, half).branch_coverage, 0.0);
        assert_eq!(analyze(code, full).branch_coverage, 1.0);
    }

    #[test]
    fn test_line_coverage_via_method_call() {
        let code = "fun area(r: Double): Double {\n    return compute(r)\n}\n";
        let test = "assertEquals(3.14, area(1.0), 0.01)\n";
        let metrics = analyze(code, test);
        // `fun area(` is covered via `area`; `return compute(r)` is not.
        assert_eq!(metrics.line_coverage, 0.5);
    }

    #[test]
    fn test_line_coverage_by_bare_method_name() {
        let code = "fun area(r: Double): Double {\n    return compute(r)\n}\n";
        let test = "@Test\nfun `compute is used by area`() {\n    check(::area)\n}\n";
        assert_eq!(analyze(code, test).line_coverage, 1.0);

        // Keywords followed by `(` are not method names
        let branchy = "if (ready) {\n    go()\n}\n";
        assert_eq!(analyze(branchy, "test if ready").line_coverage, 0.0);
    }

    #[test]
    fn test_subset_ratio() {
        assert_eq!(subset_ratio(0, 3), 0.0);
        assert_eq!(subset_ratio(3, 3), 1.0);
        assert!((subset_ratio(1, 2) - 1.0 / 3.0).abs() < 1e-12);
        assert!((subset_ratio(2, 3) - 3.0 / 7.0).abs() < 1e-12);

        let tiny = subset_ratio(1, 2000);
        assert!(tiny.is_finite() && tiny >= 0.0);
    }

    #[test]
    fn test_path_coverage() {
        let code = "if (a > 0) { x() }\nif (b < 0) { y() }\n";
        let test = "// test a > 0 path\nval s = \"if (a > 0)\"\n";
        let metrics = analyze(code, test);
        assert!((metrics.path_coverage - 1.0 / 3.0).abs() < 1e-12);
    }
}
