//! Heuristic quality scores for generated compositions.

use crate::composition::Arrangement;
use std::collections::HashSet;

/// Mean pairwise Jaccard distance between the source-id sets of
/// `compositions`, in `[0, 1]`.
///
/// Fewer than two compositions score 0. Pairs where both sets are empty are
/// skipped.
pub fn diversity_score<C: Arrangement>(compositions: &[C]) -> f64 {
    if compositions.len() < 2 {
        return 0.0;
    }

    let sets = compositions
        .iter()
        .map(|c| {
            c.placed_sources()
                .map(|s| s.source_id.as_str())
                .collect::<HashSet<_>>()
        })
        .collect::<Vec<_>>();

    let mut total = 0.0;
    let mut pairs = 0usize;
    for (i, a) in sets.iter().enumerate() {
        for b in &sets[i + 1..] {
            let union = a.union(b).count();
            if union == 0 {
                continue;
            }
            let intersection = a.intersection(b).count();
            total += 1.0 - intersection as f64 / union as f64;
            pairs += 1;
        }
    }

    if pairs == 0 {
        0.0
    } else {
        total / pairs as f64
    }
}

fn source_count_score(avg: f64) -> f64 {
    if (2.0..=6.0).contains(&avg) {
        1.0
    } else {
        (1.0 - (avg - 4.0).abs() / 10.0).max(0.0)
    }
}

fn spread_score(std: f64) -> f64 {
    if (100.0..=300.0).contains(&std) {
        1.0
    } else {
        (1.0 - (std - 200.0).abs() / 500.0).max(0.0)
    }
}

fn volume_score(mean: f64) -> f64 {
    if (0.6..=1.0).contains(&mean) {
        1.0
    } else {
        (1.0 - (mean - 0.8).abs()).max(0.0)
    }
}

/// Population standard deviation.
fn std_dev(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt()
}

/// Heuristic musicality in `[0, 1]`: the mean of a sources-per-scene score, a
/// position-spread score (only with two or more sources) and a volume balance
/// score (only with at least one source).
pub fn musicality_score<C: Arrangement>(composition: &C) -> f64 {
    let scenes = composition.scenes();
    let mut scores = Vec::with_capacity(3);

    let avg_sources = if scenes.is_empty() {
        0.0
    } else {
        scenes.iter().map(|s| s.placed_sources.len()).sum::<usize>() as f64 / scenes.len() as f64
    };
    scores.push(source_count_score(avg_sources));

    let (xs, ys): (Vec<f64>, Vec<f64>) = composition.placed_sources().map(|s| (s.x, s.y)).unzip();
    if xs.len() > 1 {
        let spread = (std_dev(&xs) + std_dev(&ys)) / 2.0;
        scores.push(spread_score(spread));
    }

    let volumes = composition.placed_sources().map(|s| s.volume).collect::<Vec<_>>();
    if !volumes.is_empty() {
        let mean = volumes.iter().sum::<f64>() / volumes.len() as f64;
        scores.push(volume_score(mean));
    }

    scores.iter().sum::<f64>() / scores.len() as f64
}
