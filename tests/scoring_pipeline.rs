use admit_fit::institutions::{InstitutionRow, InstitutionTable};
use admit_fit::profile::StudentProfile;
use admit_fit::scoring::{ScoringPipeline, TierClassifier, TierMode, WeightedScorer};
use admit_fit::{recommend, CriterionName};
use rand::{rngs::StdRng, Rng, SeedableRng};

use CriterionName::*;

fn profile(scores: &[(CriterionName, f64)]) -> StudentProfile {
    scores.iter().copied().collect()
}

fn institution(name: &str, rank: Option<u32>, weights: &[(CriterionName, f64)]) -> InstitutionRow {
    let mut row = InstitutionRow::new(name, "UK");
    row.global_rank = rank;
    weights
        .iter()
        .fold(row, |row, (criterion, weight)| row.with_weight(*criterion, *weight))
}

#[test]
fn zero_weight_criterion_is_excluded_from_average() {
    let scorer = WeightedScorer::new();
    let row = institution("Halden", Some(1), &[(Grades, 0.5), (Interview, 0.5)]);
    let fit = scorer.score(&profile(&[(Grades, 0.8), (Interview, 0.0)]), &row);
    assert!((fit - 40.0).abs() < 1e-6);

    let row = institution("Marlow", Some(2), &[(Grades, 0.7), (Lor, 0.0)]);
    let fit = scorer.score(&profile(&[(Grades, 0.9), (Lor, 1.0)]), &row);
    assert!((fit - 90.0).abs() < 1e-6);
}

#[test]
fn institution_without_weights_scores_zero() {
    let scorer = WeightedScorer::new();
    let row = institution("Empty", None, &[]);
    let fit = scorer.score(&profile(&[(Grades, 1.0), (Essay, 1.0)]), &row);
    assert_eq!(fit, 0.0);

    let row = institution("Zeroed", None, &[(Grades, 0.0), (Essay, 0.0)]);
    assert_eq!(scorer.score(&profile(&[(Grades, 1.0)]), &row), 0.0);
}

#[test]
fn weights_need_not_sum_to_one() {
    let scorer = WeightedScorer::new();
    let scaled = institution("Scaled", None, &[(Grades, 3.0), (Essay, 1.0)]);
    let unit = institution("Unit", None, &[(Grades, 0.75), (Essay, 0.25)]);
    let student = profile(&[(Grades, 0.6), (Essay, 0.2)]);

    let a = scorer.score(&student, &scaled);
    let b = scorer.score(&student, &unit);
    assert!((a - b).abs() < 1e-6);
    assert!((a - 50.0).abs() < 1e-6);
}

#[test]
fn criterion_missing_from_profile_is_skipped() {
    let scorer = WeightedScorer::new();
    let row = institution("Partial", None, &[(Grades, 0.5), (Sat, 0.5)]);
    let fit = scorer.score(&profile(&[(Grades, 0.7)]), &row);
    assert!((fit - 70.0).abs() < 1e-6);
}

#[test]
fn fit_stays_in_bounds_and_is_monotonic() {
    let mut rng = StdRng::seed_from_u64(7);
    let scorer = WeightedScorer::new();

    for _ in 0..200 {
        let weights: Vec<(CriterionName, f64)> = CriterionName::ALL
            .iter()
            .map(|criterion| {
                let weight = if rng.gen::<f64>() < 0.3 { 0.0 } else { rng.gen::<f64>() };
                (*criterion, weight)
            })
            .collect();
        let row = institution("Random", None, &weights);
        let scores: Vec<(CriterionName, f64)> = CriterionName::ALL
            .iter()
            .map(|criterion| (*criterion, rng.gen::<f64>()))
            .collect();

        let base = scorer.score(&profile(&scores), &row);
        assert!((0.0..=100.0).contains(&base));

        let bumped_idx = rng.gen_range(0..scores.len());
        let mut bumped = scores.clone();
        bumped[bumped_idx].1 = (bumped[bumped_idx].1 + rng.gen::<f64>()).min(1.0);
        let after = scorer.score(&profile(&bumped), &row);

        if row.weight(bumped[bumped_idx].0) > 0.0 {
            assert!(after >= base, "fit decreased from {} to {}", base, after);
        } else {
            assert_eq!(after, base);
        }
    }
}

#[test]
fn pipeline_orders_by_fit_then_rank() {
    let pipeline = ScoringPipeline::default();
    let rows = vec![
        institution("Low", Some(5), &[(Essay, 1.0)]),
        institution("TiedUnranked", None, &[(Grades, 1.0)]),
        institution("TiedRanked", Some(40), &[(Grades, 1.0)]),
        institution("TiedBest", Some(3), &[(Grades, 1.0)]),
    ];

    let results = pipeline.score(&profile(&[(Grades, 0.9), (Essay, 0.2)]), &rows);
    let names: Vec<&str> = results.iter().map(|result| result.name.as_str()).collect();
    assert_eq!(names, vec!["TiedBest", "TiedRanked", "TiedUnranked", "Low"]);
}

#[test]
fn pipeline_keeps_input_order_for_full_ties() {
    let pipeline = ScoringPipeline::default();
    let student = profile(&[(Grades, 0.5)]);
    let first = institution("First", Some(9), &[(Grades, 1.0)]);
    let second = institution("Second", Some(9), &[(Grades, 1.0)]);

    let forward = pipeline.score(&student, [&first, &second]);
    let swapped = pipeline.score(&student, [&second, &first]);

    assert_eq!(forward[0].name, "First");
    assert_eq!(swapped[0].name, "Second");
}

#[test]
fn results_carry_gap_against_required_score() {
    let pipeline = ScoringPipeline::default();
    let row = institution("Gapped", Some(1), &[(Grades, 1.0)]).with_required_score(85.0);
    let results = pipeline.score(&profile(&[(Grades, 0.78)]), [&row]);

    assert!((results[0].fit_score - 78.0).abs() < 1e-6);
    assert_eq!(results[0].gap, Some(7.0));
}

#[test]
fn recommend_respects_country_selection() {
    let mut uk = institution("Northfield", Some(10), &[(Grades, 1.0)]);
    uk.country = "UK".to_string();
    let mut usa = institution("Lakeside", Some(20), &[(Grades, 1.0)]);
    usa.country = "USA".to_string();
    let table = InstitutionTable::from_rows(vec![uk, usa]);
    let classifier = TierClassifier::new(TierMode::FitDescending, 6);
    let student = profile(&[(Grades, 0.5)]);

    let all = recommend(&table, &student, &[], &classifier);
    assert_eq!(all.results.len(), 2);

    let only_usa = recommend(&table, &student, &["USA".to_string()], &classifier);
    assert_eq!(only_usa.results.len(), 1);
    assert_eq!(only_usa.results[0].name, "Lakeside");
    assert_eq!(only_usa.tiers.ambitious.len(), 1);
}
