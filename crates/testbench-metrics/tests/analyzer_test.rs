//! End-to-end scoring of realistic generated suites.

use std::collections::BTreeMap;
use testbench_core::{GeneratorKind, WeightsConfig};
use testbench_metrics::{
    GenerationResult, Leaderboard, Metrics, TestGeneratorComparator, TestQualityAnalyzer,
    TimingMetrics,
};

const FIBONACCI: &str = r#"
class FibonacciGenerator {
    private val cache = mutableMapOf<Int, Long>()

    fun fibonacci(n: Int): Long {
        if (n < 0) throw IllegalArgumentException("n must be non-negative")
        if (n <= 1) return n.toLong()
        return cache.getOrPut(n) { fibonacci(n - 1) + fibonacci(n - 2) }
    }

    fun sequence(count: Int): List<Long> = (0 until count).map { fibonacci(it) }

    fun clearCache() {
        cache.clear()
    }
}
"#;

const THOROUGH_SUITE: &str = r#"
import org.junit.jupiter.api.*
import org.junit.jupiter.api.Assertions.*

class FibonacciGeneratorTest {
    private lateinit var generator: FibonacciGenerator

    @BeforeEach
    fun setUp() {
        generator = FibonacciGenerator()
    }

    /**
     * The first two values are fixed by definition.
     */
    @Test
    fun `test zero input returns 0L`() {
        assertEquals(0L, generator.fibonacci(0))
    }

    @Test
    fun `fibonacci rejects negative input`() {
        // negative indices are invalid
        assertThrows<IllegalArgumentException> { generator.fibonacci(-1) }
    }

    @Test
    fun `sequence of zero count is empty`() {
        val result = generator.sequence(0)
        assertTrue(result.isEmpty())
    }

    @Test
    fun `fibonacci handles large index near max long`() {
        val value = generator.fibonacci(90)
        assertTrue(value > 0)
        assertNotNull(value)
    }

    @Test
    fun `clear cache keeps results stable`() {
        val before = generator.fibonacci(20)
        generator.clearCache()
        assertEquals(before, generator.fibonacci(20))
    }
}
"#;

const SLOPPY_SUITE: &str = r#"
class FibTest {
    @Test
    fun test1() {
        val g = FibonacciGenerator()
        assertEquals(1, g.fibonacci(1))
    }
}
"#;

#[test]
fn test_thorough_suite_metrics() {
    let analysis = TestQualityAnalyzer::new().analyze_test(FIBONACCI, THOROUGH_SUITE);

    assert_eq!(analysis.basic.total_tests, 5);
    assert_eq!(analysis.basic.total_assertions, 6);

    assert_eq!(analysis.coverage.methods_total, 3);
    assert_eq!(analysis.coverage.methods_covered.len(), 3);
    let covered: Vec<&str> = analysis
        .coverage
        .edge_cases
        .iter()
        .filter(|e| e.covered)
        .map(|e| e.kind.as_str())
        .collect();
    assert!(covered.contains(&"zero"));

    assert!(analysis.quality.has_descriptive_names);
    assert!(analysis.quality.uses_assertion_variety);
    assert!(analysis.quality.has_test_documentation);
    assert!(analysis.quality.follows_naming_conventions);
    assert!(analysis.quality.is_well_structured);

    assert!(analysis.readability.uses_backticks);
    assert!(analysis.readability.has_comments);
    assert!(analysis.score() >= 70);
}

#[test]
fn test_sloppy_suite_scores_lower() {
    let analyzer = TestQualityAnalyzer::new();
    let thorough = analyzer.analyze_test(FIBONACCI, THOROUGH_SUITE);
    let sloppy = analyzer.analyze_test(FIBONACCI, SLOPPY_SUITE);

    assert_eq!(sloppy.basic.total_tests, 1);
    assert!(!sloppy.quality.has_descriptive_names);
    assert!(!sloppy.quality.follows_naming_conventions);
    assert!(sloppy.score() < thorough.score());
    assert!(sloppy.quality.score() < thorough.quality.score());
}

#[test]
fn test_garbage_input_never_panics() {
    let analyzer = TestQualityAnalyzer::new();
    let inputs = [
        "",
        "@Test",
        "@Test\n@Test\n@Test",
        "fun (",
        "if (((((",
        "`````",
        "/** unterminated",
        "\u{0}\u{feff}тест@Test fun `тест`() {}",
    ];

    for code in inputs {
        for test in inputs {
            let analysis = analyzer.analyze_test(code, test);
            assert!(analysis.score() <= 100);
            for ratio in analysis.coverage.ratios() {
                assert!((0.0..=1.0).contains(&ratio));
            }
        }
    }
}

#[test]
fn test_comparison_and_leaderboard() {
    let comparator = TestGeneratorComparator::new(WeightsConfig::default());
    let fast = TimingMetrics {
        total_generation_time_ms: 2_500,
        api_call_time_ms: 2_000,
        ..Default::default()
    };

    let generated = BTreeMap::from([
        (
            GeneratorKind::Gpt,
            GenerationResult::new(THOROUGH_SUITE).with_timing(fast),
        ),
        (GeneratorKind::CodeLlama, GenerationResult::new(SLOPPY_SUITE)),
    ]);

    let results = comparator.compare_generators(FIBONACCI, &generated);
    assert_eq!(results[0].generator, GeneratorKind::Gpt);
    assert_eq!(results[0].scores.timing, 100.0);
    assert_eq!(results[1].scores.timing, 0.0);
    assert!(results[0].weighted_score > results[1].weighted_score);

    let mut board = Leaderboard::new();
    board.record(&results);
    let standings = board.standings();
    assert_eq!(standings[0].generator, GeneratorKind::Gpt);
    assert_eq!(standings[0].wins, 1);
    assert_eq!(standings[1].wins, 0);
}
