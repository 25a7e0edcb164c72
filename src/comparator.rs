use std::ops::Range;

use itertools::Itertools;

/// Classification of one position of the reference text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Verdict {
    Untyped,
    Correct,
    Incorrect,
}

/// A maximal stretch of positions sharing the same verdict.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerdictRun {
    pub verdict: Verdict,
    pub range: Range<usize>,
}

/// Classify every position up to `max(|reference|, |typed|)`.
///
/// Comparison is exact `char` equality: case and whitespace both count.
/// Typed characters past the end of the reference are always incorrect.
pub fn compare(reference: &[char], typed: &[char]) -> Vec<Verdict> {
    (0..reference.len().max(typed.len()))
        .map(|idx| verdict_at(reference, typed, idx))
        .collect()
}

pub fn verdict_at(reference: &[char], typed: &[char], idx: usize) -> Verdict {
    match (typed.get(idx), reference.get(idx)) {
        (None, _) => Verdict::Untyped,
        (Some(t), Some(r)) if t == r => Verdict::Correct,
        (Some(_), _) => Verdict::Incorrect,
    }
}

pub fn correct_count(reference: &[char], typed: &[char]) -> usize {
    typed
        .iter()
        .zip(reference.iter())
        .filter(|(t, r)| t == r)
        .count()
}

/// Group consecutive verdicts, which lets renderers emit one styled span
/// per run instead of one per character.
pub fn verdict_runs(verdicts: &[Verdict]) -> Vec<VerdictRun> {
    let chunks = verdicts.iter().enumerate().chunk_by(|(_, v)| **v);

    let mut runs = Vec::new();
    for (verdict, mut group) in &chunks {
        let Some((start, _)) = group.next() else {
            continue;
        };
        let end = group.last().map_or(start, |(idx, _)| idx) + 1;
        runs.push(VerdictRun {
            verdict,
            range: start..end,
        });
    }
    runs
}
