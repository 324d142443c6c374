//! Per-generator standings across all analyzed source files.

use crate::comparison::ComparisonResult;
use crate::scoring::TestScores;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use testbench_core::GeneratorKind;

#[derive(Debug, Clone, Default)]
struct Tally {
    files: usize,
    wins: usize,
    scores: TestScores,
    weighted: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorStanding {
    pub rank: usize,
    pub generator: GeneratorKind,
    /// Source files this generator produced tests for
    pub files: usize,
    /// Files where this generator ranked first
    pub wins: usize,
    pub average: TestScores,
    pub average_weighted: f64,
}

#[derive(Debug, Clone, Default)]
pub struct Leaderboard {
    tallies: BTreeMap<GeneratorKind, Tally>,
}

impl Leaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.tallies.is_empty()
    }

    /// Adds one file's ranked comparison. The first entry counts as a win.
    pub fn record(&mut self, ranked: &[ComparisonResult]) {
        for (position, result) in ranked.iter().enumerate() {
            let tally = self.tallies.entry(result.generator).or_default();
            tally.files += 1;
            tally.scores += result.scores;
            tally.weighted += result.weighted_score;
            if position == 0 {
                tally.wins += 1;
            }
        }
    }

    /// Generators ordered by average fixed score, then weighted score.
    pub fn standings(&self) -> Vec<GeneratorStanding> {
        let mut standings: Vec<GeneratorStanding> = self
            .tallies
            .iter()
            .map(|(generator, tally)| GeneratorStanding {
                rank: 0,
                generator: *generator,
                files: tally.files,
                wins: tally.wins,
                average: tally.scores.divided_by(tally.files),
                average_weighted: if tally.files == 0 {
                    0.0
                } else {
                    tally.weighted / tally.files as f64
                },
            })
            .collect();

        standings.sort_by(|a, b| {
            b.average
                .total
                .partial_cmp(&a.average.total)
                .unwrap_or(Ordering::Equal)
                .then_with(|| {
                    b.average_weighted
                        .partial_cmp(&a.average_weighted)
                        .unwrap_or(Ordering::Equal)
                })
                .then_with(|| a.generator.cmp(&b.generator))
        });
        for (index, standing) in standings.iter_mut().enumerate() {
            standing.rank = index + 1;
        }
        standings
    }
}
