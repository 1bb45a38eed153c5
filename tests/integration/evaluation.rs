//! Quality heuristics over generated compositions

use crate::helpers::tolerances::SCORE_EPSILON;
use crate::helpers::*;
use approx::assert_abs_diff_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;
use soundscape::prelude::*;
use soundscape::{diversity_score, musicality_score};

fn rule_based_batch(pack: Pack, count: usize) -> Vec<GeneratedComposition> {
    let dir = tempfile::tempdir().unwrap();
    let engine = test_engine(dir.path());
    let mut rng = StdRng::seed_from_u64(TEST_SEED);
    (0..count)
        .map(|_| engine.generate_with_rng(pack, 1.0, &mut rng))
        .collect()
}

#[test]
fn test_diversity_in_unit_range() {
    let batch = rule_based_batch(Pack::Adventure, 6);
    let score = diversity_score(&batch);
    assert!((0.0..=1.0).contains(&score), "diversity {}", score);
}

#[test]
fn test_identical_compositions_have_zero_diversity() {
    let batch = rule_based_batch(Pack::Combat, 1);
    let copies = vec![batch[0].clone(); 4];
    assert_abs_diff_eq!(diversity_score(&copies), 0.0, epsilon = SCORE_EPSILON);
}

#[test]
fn test_musicality_in_unit_range() {
    for composition in rule_based_batch(Pack::Shelter, 5) {
        let score = musicality_score(&composition);
        assert!((0.0..=1.0).contains(&score), "musicality {}", score);
    }
}

#[test]
fn test_user_compositions_score_like_generated() {
    let compositions = user_compositions(Pack::Adventure, 4);
    let diversity = diversity_score(&compositions);
    assert!((0.0..=1.0).contains(&diversity));
    for composition in &compositions {
        assert!((0.0..=1.0).contains(&musicality_score(composition)));
    }
}
