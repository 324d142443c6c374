//! Naming, documentation and assertion-variety checks on a test suite.

use super::{ASSERTION_KINDS, Metrics, MetricsAnalyzer, test_function_names};
use serde::{Deserialize, Serialize};

const SETUP_ANNOTATIONS: [&str; 6] = [
    "@BeforeEach",
    "@BeforeAll",
    "@AfterEach",
    "@AfterAll",
    "@Nested",
    "@DisplayName",
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityMetrics {
    pub has_descriptive_names: bool,
    pub uses_assertion_variety: bool,
    pub has_test_documentation: bool,
    pub follows_naming_conventions: bool,
    /// Setup, teardown or grouping annotations present. Not scored.
    pub is_well_structured: bool,
}

impl QualityMetrics {
    /// Number of scored flags that are set.
    pub fn flags_set(&self) -> u32 {
        [
            self.has_descriptive_names,
            self.uses_assertion_variety,
            self.has_test_documentation,
            self.follows_naming_conventions,
        ]
        .into_iter()
        .filter(|flag| *flag)
        .count() as u32
    }
}

impl Metrics for QualityMetrics {
    fn score(&self) -> f64 {
        f64::from(self.flags_set() * 25)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct QualityAnalyzer;

impl MetricsAnalyzer for QualityAnalyzer {
    type Output = QualityMetrics;

    fn analyze(&self, _code: &str, test: &str) -> QualityMetrics {
        QualityMetrics {
            has_descriptive_names: has_descriptive_names(test),
            uses_assertion_variety: assertion_kinds_used(test) >= 3,
            has_test_documentation: has_test_documentation(test),
            follows_naming_conventions: follows_naming_conventions(test),
            is_well_structured: SETUP_ANNOTATIONS.iter().any(|a| test.contains(a)),
        }
    }
}

fn has_descriptive_names(test: &str) -> bool {
    let names: Vec<String> = test_function_names(test)
        .into_iter()
        .filter(|n| n.backticked)
        .map(|n| n.name)
        .collect();

    !names.is_empty() && names.iter().all(|name| is_descriptive(name))
}

fn is_descriptive(name: &str) -> bool {
    let words: Vec<&str> = name.split_whitespace().collect();
    words.len() >= 3
        && words.iter().all(|w| w.chars().count() >= 2)
        && !name.to_lowercase().contains("test1")
}

fn assertion_kinds_used(test: &str) -> usize {
    ASSERTION_KINDS
        .iter()
        .filter(|kind| test.contains(*kind))
        .count()
}

fn has_test_documentation(test: &str) -> bool {
    let kdoc = test
        .find("/**")
        .is_some_and(|start| test[start + 3..].contains("*/"));
    kdoc || test.lines().any(|line| line.trim_start().starts_with("//"))
}

fn follows_naming_conventions(test: &str) -> bool {
    let names = test_function_names(test);
    !names.is_empty()
        && names.iter().all(|n| {
            n.backticked && n.name.chars().next().is_some_and(|c| c.is_lowercase())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const WELL_WRITTEN: &str = r#"
class StackTest {
    @BeforeEach
    fun setUp() { stack = Stack() }

    /** Pushing then popping returns the same element. */
    @Test
    fun `pop returns last pushed element`() {
        stack.push(1)
        assertEquals(1, stack.pop())
        assertTrue(stack.isEmpty())
    }

    @Test
    fun `pop on empty stack throws`() {
        assertThrows<NoSuchElementException> { stack.pop() }
    }
}
"#;

    #[test]
    fn test_well_written_suite() {
        let metrics = QualityAnalyzer.analyze("", WELL_WRITTEN);
        assert!(metrics.has_descriptive_names);
        assert!(metrics.uses_assertion_variety);
        assert!(metrics.has_test_documentation);
        assert!(metrics.follows_naming_conventions);
        assert!(metrics.is_well_structured);
        assert_eq!(metrics.score(), 100.0);
    }

    #[test]
    fn test_numbered_and_short_names_are_not_descriptive() {
        assert!(!is_descriptive("test1 adds numbers"));
        assert!(!is_descriptive("adds numbers"));
        assert!(!is_descriptive("a adds numbers"));
        assert!(is_descriptive("sum of two numbers"));
    }

    #[test]
    fn test_plain_names_break_conventions() {
        let test = "@Test\nfun `lower case name`() {}\n@Test\nfun testSomething() {}\n";
        assert!(!follows_naming_conventions(test));

        let test = "@Test\nfun `Upper case name`() {}\n";
        assert!(!follows_naming_conventions(test));

        let test = "@Test\nfun `handles nulls`() {}\n";
        assert!(follows_naming_conventions(test));
    }

    #[test]
    fn test_unterminated_kdoc_is_not_documentation() {
        assert!(!has_test_documentation("/** never closed\n@Test fun a() {}"));
        assert!(has_test_documentation("    // explains the case\n"));
    }
}
