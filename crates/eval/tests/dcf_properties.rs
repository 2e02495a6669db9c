//! Invariants of the confusion matrix, DCF and threshold sweep.

use patrec_eval::{
    actual_dcf, binary_confusion, min_dcf, multiclass_risk, normalized_bayes_risk, ConfusionMatrix,
    DcfOptions, RocCurve, ThresholdSweep,
};
use patrec_prob::BinaryApplication;
use patrec_test_fixtures::binary_scores;
use proptest::prelude::*;

/// Scores on a coarse grid so ties are common.
fn scored_labels() -> impl Strategy<Value = (Vec<f64>, Vec<usize>)> {
    prop::collection::vec((-8i32..8, 0usize..2), 1..40).prop_map(|pairs| {
        pairs
            .into_iter()
            .map(|(s, l)| (s as f64 * 0.25, l))
            .unzip()
    })
}

fn application() -> impl Strategy<Value = BinaryApplication> {
    (0.05f64..0.95, 0.5f64..10.0, 0.5f64..10.0)
        .prop_map(|(p, cfn, cfp)| BinaryApplication::new(p, cfn, cfp).unwrap())
}

/// minDCF by rebuilding the confusion matrix at every candidate threshold.
fn brute_force_min_dcf(
    scores: &[f64],
    labels: &[usize],
    app: &BinaryApplication,
    opts: &DcfOptions,
) -> f64 {
    let mut thresholds = vec![f64::NEG_INFINITY, f64::INFINITY];
    thresholds.extend_from_slice(scores);
    thresholds
        .iter()
        .map(|&t| {
            let cm = binary_confusion(scores, labels, t).unwrap();
            normalized_bayes_risk(&cm, app, opts).unwrap()
        })
        .fold(f64::INFINITY, f64::min)
}

// ============================================================================
// Confusion matrix
// ============================================================================

proptest! {
    #[test]
    fn confusion_sums_match_sample_counts(
        pairs in prop::collection::vec((0usize..4, 0usize..4), 0..60),
    ) {
        let (predicted, actual): (Vec<usize>, Vec<usize>) = pairs.into_iter().unzip();
        let cm = ConfusionMatrix::new(&predicted, &actual, 4).unwrap();
        prop_assert_eq!(cm.total(), actual.len());
        let mut per_class = vec![0; 4];
        for &a in &actual {
            per_class[a] += 1;
        }
        prop_assert_eq!(cm.actual_totals(), per_class);
        prop_assert_eq!(cm.predicted_totals().iter().sum::<usize>(), predicted.len());
    }
}

// ============================================================================
// DCF
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn min_dcf_never_exceeds_actual_dcf(
        (scores, labels) in scored_labels(),
        app in application(),
        eps in prop_oneof![Just(0.0), Just(1e-3), Just(1.0)],
    ) {
        let opts = DcfOptions::default().with_pseudocount(eps);
        let act = actual_dcf(&scores, &labels, &app, &opts).unwrap();
        let min = min_dcf(&scores, &labels, &app, &opts).unwrap();
        prop_assert!(min.value <= act + 1e-12);
    }

    #[test]
    fn sweep_matches_brute_force(
        (scores, labels) in scored_labels(),
        app in application(),
    ) {
        let opts = DcfOptions::default();
        let fast = min_dcf(&scores, &labels, &app, &opts).unwrap();
        let slow = brute_force_min_dcf(&scores, &labels, &app, &opts);
        prop_assert!((fast.value - slow).abs() < 1e-12);

        // The reported threshold reproduces the reported value
        let cm = binary_confusion(&scores, &labels, fast.threshold).unwrap();
        let at_threshold = normalized_bayes_risk(&cm, &app, &opts).unwrap();
        prop_assert!((at_threshold - fast.value).abs() < 1e-12);
    }

    #[test]
    fn binary_and_multiclass_risk_agree(
        (scores, labels) in scored_labels(),
        app in application(),
        t in -2.0f64..2.0,
    ) {
        let cm = binary_confusion(&scores, &labels, t).unwrap();
        let binary = normalized_bayes_risk(&cm, &app, &DcfOptions::exact()).unwrap();
        let multi = multiclass_risk(&cm, &app.priors().unwrap(), &app.cost_matrix().unwrap())
            .unwrap();
        prop_assert!((binary - multi.normalized).abs() < 1e-9);
    }

    #[test]
    fn auc_is_pairwise_ordering_probability(
        (scores, labels) in scored_labels(),
    ) {
        let n1 = labels.iter().filter(|&&l| l == 1).count();
        prop_assume!(n1 > 0 && n1 < labels.len());

        let mut wins = 0.0;
        for (i, &li) in labels.iter().enumerate() {
            for (j, &lj) in labels.iter().enumerate() {
                if li == 1 && lj == 0 {
                    if scores[i] > scores[j] {
                        wins += 1.0;
                    } else if scores[i] == scores[j] {
                        wins += 0.5;
                    }
                }
            }
        }
        let pairs = (n1 * (labels.len() - n1)) as f64;
        let auc = RocCurve::new(&scores, &labels).unwrap().auc();
        prop_assert!((auc - wins / pairs).abs() < 1e-9);
    }
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn calibrated_scores_lose_little_to_the_oracle_threshold() {
    // Unit-variance classes at ±1.5 have LLR = 3·s, which is calibrated
    let (raw, labels) = binary_scores(500, 1.5, 11);
    let llr: Vec<f64> = raw.iter().map(|s| 3.0 * s).collect();
    let opts = DcfOptions::default();
    for prior in [0.2, 0.5, 0.8] {
        let app = BinaryApplication::new(prior, 1.0, 1.0).unwrap();
        let act = actual_dcf(&llr, &labels, &app, &opts).unwrap();
        let min = min_dcf(&llr, &labels, &app, &opts).unwrap();
        assert!(min.value <= act);
        assert!(act - min.value < 0.1, "prior {prior}: act {act}, min {}", min.value);
    }
}

#[test]
fn shifted_scores_show_calibration_loss() {
    let (raw, labels) = binary_scores(500, 1.5, 12);
    let llr: Vec<f64> = raw.iter().map(|s| 3.0 * s + 6.0).collect();
    let app = BinaryApplication::default();
    let opts = DcfOptions::default();
    let act = actual_dcf(&llr, &labels, &app, &opts).unwrap();
    let min = min_dcf(&llr, &labels, &app, &opts).unwrap();
    // minDCF ignores the offset, actual DCF pays for it
    let unshifted: Vec<f64> = raw.iter().map(|s| 3.0 * s).collect();
    let reference = min_dcf(&unshifted, &labels, &app, &opts).unwrap();
    assert!((min.value - reference.value).abs() < 1e-12);
    assert!(act > min.value + 0.2);
}

#[test]
fn sweep_counts_are_consistent() {
    let (scores, labels) = binary_scores(50, 0.5, 3);
    let sweep = ThresholdSweep::new(&scores, &labels).unwrap();
    assert_eq!(sweep.n_targets(), 50);
    assert_eq!(sweep.n_non_targets(), 50);
    // No ties in continuous scores: one point per sample plus both ends
    assert_eq!(sweep.points().len(), 102);
    for point in sweep.points() {
        let counts = sweep.counts(point);
        assert_eq!(counts.n_targets() + counts.n_non_targets(), 100);
    }
}
