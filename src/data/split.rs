//! Deterministic two-stage train/validation/test splitting.

use std::collections::BTreeMap;

use log::{debug, warn};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use super::model::{CellValue, Table};
use crate::error::SplitError;

/// What to do when a stratum is too small to reach every group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StratifyPolicy {
    /// Log a warning and split that stage without stratification.
    #[default]
    Degrade,
    /// Fail with [`SplitError::Stratification`].
    Strict,
}

/// Split parameters, recorded in the split report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SplitConfig {
    /// Fraction of all rows held out of training, in `(0, 1)`.
    pub test_size: f64,
    /// Fraction of the holdout that becomes validation, in `(0, 1)`.
    pub val_fraction_of_holdout: f64,
    pub random_seed: u64,
    pub shuffle: bool,
    pub stratify_column: Option<String>,
    pub policy: StratifyPolicy,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_size: 0.4,
            val_fraction_of_holdout: 0.5,
            random_seed: 42,
            shuffle: true,
            stratify_column: None,
            policy: StratifyPolicy::Degrade,
        }
    }
}

impl SplitConfig {
    pub fn validate(&self) -> Result<(), SplitError> {
        check_fraction("test_size", self.test_size)?;
        check_fraction("val_fraction_of_holdout", self.val_fraction_of_holdout)
    }
}

fn check_fraction(name: &'static str, value: f64) -> Result<(), SplitError> {
    if value > 0.0 && value < 1.0 {
        Ok(())
    } else {
        Err(SplitError::InvalidFraction { name, value })
    }
}

/// How stratification went for a split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stratification {
    /// No stratify column was requested, or it is not in the table.
    NotRequested,
    /// Both stages were stratified.
    Applied,
    /// At least one stage fell back to an unstratified split.
    Degraded,
}

/// Original row indices of each group, in output order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub val: Vec<usize>,
    pub test: Vec<usize>,
}

/// The three owned subsets of a split.
#[derive(Debug, Clone)]
pub struct SplitResult {
    pub train: Table,
    pub val: Table,
    pub test: Table,
    pub indices: SplitIndices,
    pub stratification: Stratification,
}

/// Split `table` into train, validation and test subsets.
///
/// Stage one holds out `test_size` of the rows; stage two splits the holdout
/// into validation (`val_fraction_of_holdout`) and test. Each stage seeds its
/// own generator from `random_seed`, so identical inputs give identical
/// subsets in identical order.
pub fn split(table: &Table, config: &SplitConfig) -> Result<SplitResult, SplitError> {
    config.validate()?;

    let strat_idx = match config.stratify_column.as_deref() {
        Some(name) => {
            let idx = table.column_index(name);
            if idx.is_none() {
                warn!("stratify column '{name}' not found, splitting unstratified");
            }
            idx
        }
        None => None,
    };

    let all: Vec<usize> = (0..table.len()).collect();
    let (train, holdout, first) =
        run_stage(table, &all, config.test_size, strat_idx, config)?;
    let (val, test, second) =
        run_stage(table, &holdout, 1.0 - config.val_fraction_of_holdout, strat_idx, config)?;

    let stratification = match (strat_idx, first && second) {
        (None, _) => Stratification::NotRequested,
        (Some(_), true) => Stratification::Applied,
        (Some(_), false) => Stratification::Degraded,
    };

    debug!(
        "split {} rows into {} train / {} val / {} test ({stratification:?})",
        table.len(),
        train.len(),
        val.len(),
        test.len()
    );

    Ok(SplitResult {
        train: table.select_rows(&train),
        val: table.select_rows(&val),
        test: table.select_rows(&test),
        indices: SplitIndices { train, val, test },
        stratification,
    })
}

/// One partition stage over `rows` (original indices). Returns the kept and
/// held-out original indices and whether the stage was stratified.
fn run_stage(
    table: &Table,
    rows: &[usize],
    holdout_fraction: f64,
    strat_idx: Option<usize>,
    config: &SplitConfig,
) -> Result<(Vec<usize>, Vec<usize>, bool), SplitError> {
    let n_holdout = holdout_count(rows.len(), holdout_fraction);
    let seed = config.random_seed;

    let (keep, held, stratified) = match strat_idx {
        Some(col) => {
            let labels: Vec<&CellValue> = rows.iter().map(|&i| &table.rows()[i][col]).collect();
            match stratified_partition(&labels, n_holdout, seed, config.shuffle) {
                Ok((keep, held)) => (keep, held, true),
                Err(reason) => {
                    let column = table.columns()[col].clone();
                    if config.policy == StratifyPolicy::Strict {
                        return Err(SplitError::Stratification { column, reason });
                    }
                    warn!("cannot stratify on '{column}' ({reason}), splitting unstratified");
                    let (keep, held) = random_partition(rows.len(), n_holdout, seed, config.shuffle);
                    (keep, held, false)
                }
            }
        }
        None => {
            let (keep, held) = random_partition(rows.len(), n_holdout, seed, config.shuffle);
            (keep, held, false)
        }
    };

    let to_rows =
        |positions: Vec<usize>| -> Vec<usize> { positions.into_iter().map(|p| rows[p]).collect() };
    Ok((to_rows(keep), to_rows(held), stratified))
}

/// Rows held out of `n` for a fraction, rounded up.
fn holdout_count(n: usize, fraction: f64) -> usize {
    // The epsilon keeps products like 0.4 * 100 from rounding up to 41.
    let exact = fraction * n as f64 - 1e-9;
    (exact.ceil().max(0.0) as usize).min(n)
}

/// Positions `0..n` split into (keep, held). Shuffled splits hold out the
/// head of a seeded permutation; unshuffled splits hold out the tail.
fn random_partition(n: usize, n_holdout: usize, seed: u64, shuffle: bool) -> (Vec<usize>, Vec<usize>) {
    let mut positions: Vec<usize> = (0..n).collect();
    if shuffle {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        positions.shuffle(&mut rng);
        let keep = positions.split_off(n_holdout);
        (keep, positions)
    } else {
        let held = positions.split_off(n - n_holdout);
        (positions, held)
    }
}

/// Proportional stratified partition of positions `0..labels.len()`.
///
/// Each stratum's held-out share is its proportional part of `n_holdout`,
/// with leftover rows handed out by largest remainder. Fails when a stratum
/// would end up with no row on one side.
fn stratified_partition(
    labels: &[&CellValue],
    n_holdout: usize,
    seed: u64,
    shuffle: bool,
) -> Result<(Vec<usize>, Vec<usize>), String> {
    let n = labels.len();
    let mut strata: BTreeMap<&CellValue, Vec<usize>> = BTreeMap::new();
    for (pos, label) in labels.iter().enumerate() {
        strata.entry(*label).or_default().push(pos);
    }

    let allocation = allocate(&strata, n, n_holdout);
    for ((label, members), &held) in strata.iter().zip(&allocation) {
        if held == 0 || held == members.len() {
            return Err(format!(
                "stratum '{label}' has {} row(s), too few to appear in both groups",
                members.len()
            ));
        }
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut keep = Vec::with_capacity(n - n_holdout);
    let mut held = Vec::with_capacity(n_holdout);
    for (mut members, &n_held) in strata.into_values().zip(&allocation) {
        if shuffle {
            members.shuffle(&mut rng);
            held.extend_from_slice(&members[..n_held]);
            keep.extend_from_slice(&members[n_held..]);
        } else {
            let cut = members.len() - n_held;
            keep.extend_from_slice(&members[..cut]);
            held.extend_from_slice(&members[cut..]);
        }
    }

    if shuffle {
        keep.shuffle(&mut rng);
        held.shuffle(&mut rng);
    } else {
        keep.sort_unstable();
        held.sort_unstable();
    }
    Ok((keep, held))
}

/// Largest-remainder apportionment of `n_holdout` across strata.
/// Ties in the remainder go to the earlier stratum.
fn allocate(strata: &BTreeMap<&CellValue, Vec<usize>>, n: usize, n_holdout: usize) -> Vec<usize> {
    if n == 0 {
        return vec![0; strata.len()];
    }
    let mut counts = Vec::with_capacity(strata.len());
    let mut remainders = Vec::with_capacity(strata.len());
    for members in strata.values() {
        let exact = n_holdout as f64 * members.len() as f64 / n as f64;
        let floor = exact.floor() as usize;
        counts.push(floor);
        remainders.push(exact - floor as f64);
    }

    let mut leftover = n_holdout - counts.iter().sum::<usize>();
    let mut order: Vec<usize> = (0..counts.len()).collect();
    order.sort_by(|&a, &b| remainders[b].total_cmp(&remainders[a]).then(a.cmp(&b)));
    for i in order {
        if leftover == 0 {
            break;
        }
        counts[i] += 1;
        leftover -= 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn labelled_table(counts: &[(&str, usize)]) -> Table {
        let mut rows = Vec::new();
        for (label, count) in counts {
            for _ in 0..*count {
                let id = rows.len() as i64;
                rows.push(vec![CellValue::Integer(id), CellValue::Text(label.to_string())]);
            }
        }
        Table::new(vec!["id".into(), "class".into()], rows)
    }

    fn count_label(table: &Table, label: &str) -> usize {
        table
            .column_values(1)
            .filter(|v| **v == CellValue::Text(label.to_string()))
            .count()
    }

    fn stratified(column: &str) -> SplitConfig {
        SplitConfig {
            stratify_column: Some(column.to_string()),
            ..SplitConfig::default()
        }
    }

    #[test]
    fn sizes_follow_default_fractions() {
        let table = labelled_table(&[("a", 100)]);
        let result = split(&table, &SplitConfig::default()).unwrap();
        assert_eq!(result.train.len(), 60);
        assert_eq!(result.val.len(), 20);
        assert_eq!(result.test.len(), 20);
        assert_eq!(result.stratification, Stratification::NotRequested);
    }

    #[test]
    fn groups_are_disjoint_and_exhaustive() {
        let table = labelled_table(&[("a", 37), ("b", 20)]);
        let result = split(&table, &stratified("class")).unwrap();
        let idx = &result.indices;
        assert_eq!(idx.train.len() + idx.val.len() + idx.test.len(), table.len());
        let all: HashSet<usize> = idx.train.iter().chain(&idx.val).chain(&idx.test).copied().collect();
        assert_eq!(all.len(), table.len());
        // Tables hold exactly the indexed rows.
        for (pos, &orig) in idx.val.iter().enumerate() {
            assert_eq!(result.val.rows()[pos], table.rows()[orig]);
        }
    }

    #[test]
    fn same_seed_gives_identical_split() {
        let table = labelled_table(&[("a", 60), ("b", 40)]);
        let first = split(&table, &stratified("class")).unwrap();
        let second = split(&table, &stratified("class")).unwrap();
        assert_eq!(first.indices, second.indices);
        assert_eq!(first.train, second.train);
        assert_eq!(first.test, second.test);

        let other_seed = SplitConfig {
            random_seed: 7,
            ..stratified("class")
        };
        let third = split(&table, &other_seed).unwrap();
        assert_ne!(first.indices, third.indices);
    }

    #[test]
    fn stratified_split_preserves_proportions() {
        let table = labelled_table(&[("A", 60), ("B", 40)]);
        let result = split(&table, &stratified("class")).unwrap();
        assert_eq!(result.stratification, Stratification::Applied);
        assert_eq!((count_label(&result.train, "A"), count_label(&result.train, "B")), (36, 24));
        assert_eq!((count_label(&result.val, "A"), count_label(&result.val, "B")), (12, 8));
        assert_eq!((count_label(&result.test, "A"), count_label(&result.test, "B")), (12, 8));
    }

    #[test]
    fn rare_stratum_degrades_by_default() {
        let table = labelled_table(&[("common", 20), ("rare", 1)]);
        let result = split(&table, &stratified("class")).unwrap();
        assert_eq!(result.stratification, Stratification::Degraded);
        assert_eq!(result.train.len() + result.val.len() + result.test.len(), 21);
    }

    #[test]
    fn rare_stratum_fails_under_strict_policy() {
        let table = labelled_table(&[("common", 20), ("rare", 1)]);
        let config = SplitConfig {
            policy: StratifyPolicy::Strict,
            ..stratified("class")
        };
        let err = split(&table, &config).unwrap_err();
        assert!(matches!(err, SplitError::Stratification { ref column, .. } if column == "class"));
    }

    #[test]
    fn holdout_stage_degrades_after_stratified_first_stage() {
        // B keeps 2 rows in train and sends 1 to the holdout, which is then
        // too few to reach both validation and test.
        let table = labelled_table(&[("A", 10), ("B", 3)]);
        let result = split(&table, &stratified("class")).unwrap();
        assert_eq!(result.stratification, Stratification::Degraded);
        assert_eq!(count_label(&result.train, "B"), 2);
        assert_eq!(count_label(&result.val, "B") + count_label(&result.test, "B"), 1);
        assert_eq!(result.val.len() + result.test.len(), 6);
    }

    #[test]
    fn holdout_stage_failure_is_reported_under_strict_policy() {
        let table = labelled_table(&[("A", 10), ("B", 3)]);
        let config = SplitConfig {
            policy: StratifyPolicy::Strict,
            ..stratified("class")
        };
        match split(&table, &config) {
            Err(SplitError::Stratification { column, reason }) => {
                assert_eq!(column, "class");
                assert!(reason.contains("'B'"));
            }
            other => panic!("expected stratification error, got {other:?}"),
        }
    }

    #[test]
    fn missing_stratify_column_splits_unstratified() {
        let table = labelled_table(&[("a", 10)]);
        let result = split(&table, &stratified("nope")).unwrap();
        assert_eq!(result.stratification, Stratification::NotRequested);
        let plain = split(&table, &SplitConfig::default()).unwrap();
        assert_eq!(result.indices, plain.indices);
    }

    #[test]
    fn unshuffled_split_keeps_file_order() {
        let table = labelled_table(&[("a", 10)]);
        let config = SplitConfig {
            shuffle: false,
            ..SplitConfig::default()
        };
        let result = split(&table, &config).unwrap();
        assert_eq!(result.indices.train, (0..6).collect::<Vec<_>>());
        assert_eq!(result.indices.val, vec![6, 7]);
        assert_eq!(result.indices.test, vec![8, 9]);
    }

    #[test]
    fn unshuffled_stratified_split_is_ordered_per_group() {
        let table = labelled_table(&[("A", 10), ("B", 10)]);
        let config = SplitConfig {
            shuffle: false,
            ..stratified("class")
        };
        let result = split(&table, &config).unwrap();
        assert_eq!(result.stratification, Stratification::Applied);
        assert!(result.indices.train.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(count_label(&result.train, "A"), 6);
        assert_eq!(count_label(&result.test, "B"), 2);
    }

    #[test]
    fn invalid_fractions_are_rejected() {
        let table = labelled_table(&[("a", 10)]);
        for bad in [0.0, 1.0, -0.2, 1.5] {
            let config = SplitConfig {
                test_size: bad,
                ..SplitConfig::default()
            };
            assert!(matches!(split(&table, &config), Err(SplitError::InvalidFraction { .. })));
        }
    }

    #[test]
    fn empty_table_yields_empty_groups() {
        let table = Table::new(vec!["a".into()], vec![]);
        let result = split(&table, &SplitConfig::default()).unwrap();
        assert!(result.train.is_empty() && result.val.is_empty() && result.test.is_empty());
    }

    #[test]
    fn holdout_count_rounds_up() {
        assert_eq!(holdout_count(100, 0.4), 40);
        assert_eq!(holdout_count(10, 0.25), 3);
        assert_eq!(holdout_count(1, 0.4), 1);
        assert_eq!(holdout_count(0, 0.4), 0);
    }
}
