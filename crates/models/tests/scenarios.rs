//! End-to-end scenarios: train on a split, score the held-out part, evaluate.

use nalgebra::DMatrix;
use patrec_core::Dataset;
use patrec_eval::{DcfOptions, RocCurve};
use patrec_models::{
    calibrate_k_fold, linear_primal_objective, BinaryReport, BinaryScorer, LdaClassifier,
    LogRegConfig, LogisticRegression, Svm, SvmConfig,
};
use patrec_prob::{BinaryApplication, CovarianceModel, GaussianClassifier, GenerativeClassifier};
use patrec_test_fixtures::{binary_scores, gaussian_blobs, two_separated_classes};
use proptest::prelude::*;

fn split(x: DMatrix<f64>, labels: Vec<usize>, seed: u64) -> (Dataset, Dataset) {
    Dataset::new(x, labels).unwrap().split_2to1(seed).unwrap()
}

fn errors(pred: &[usize], labels: &[usize]) -> f64 {
    pred.iter().zip(labels).filter(|(p, l)| p != l).count() as f64 / labels.len() as f64
}

// ============================================================================
// Generative and discriminative classifiers on the same split
// ============================================================================

#[test]
fn gaussian_classifiers_separate_distant_classes() {
    let (x, labels) = two_separated_classes(100, 7);
    let (train, val) = split(x, labels, 0);
    let app = BinaryApplication::default();

    for model in [CovarianceModel::Full, CovarianceModel::Naive, CovarianceModel::Tied] {
        let clf = GaussianClassifier::fit(train.features(), train.labels(), 2, model).unwrap();
        let llr = clf.llr(val.features()).unwrap();
        let report = BinaryReport::evaluate(&llr, val.labels(), &app, &DcfOptions::exact()).unwrap();
        assert!(report.error_rate < 0.05, "{model:?}: {report}");
        assert!(report.min_dcf.value <= report.actual_dcf + 1e-12, "{model:?}: {report}");
    }
}

#[test]
fn discriminative_models_separate_distant_classes() {
    let (x, labels) = two_separated_classes(100, 11);
    let (train, val) = split(x, labels, 1);

    let lr = LogisticRegression::fit(train.features(), train.labels(), &LogRegConfig::default()).unwrap();
    let svm = Svm::fit(train.features(), train.labels(), &SvmConfig::default()).unwrap();
    let lda = LdaClassifier::fit(train.features(), train.labels(), None).unwrap();

    let models: [(&str, &dyn BinaryScorer); 3] = [("lr", &lr), ("svm", &svm), ("lda", &lda)];
    for (name, model) in models {
        let pred = model.predict(val.features(), 0.0).unwrap();
        let err = errors(&pred, val.labels());
        assert!(err < 0.05, "{name}: {err}");
    }
}

#[test]
fn overlapping_classes_rank_well_above_chance() {
    let (x, labels) = gaussian_blobs(&[&[0.0, 0.0], &[1.5, 1.0]], 200, 21);
    let (train, val) = split(x, labels, 2);
    let lr = LogisticRegression::fit(train.features(), train.labels(), &LogRegConfig::default()).unwrap();
    let roc = RocCurve::new(&lr.scores(val.features()).unwrap(), val.labels()).unwrap();
    // Bayes AUC for d' ≈ 1.8 is about 0.9
    assert!(roc.auc() > 0.8, "{}", roc.auc());
    assert!(roc.equal_error_rate() < 0.3);
}

// ============================================================================
// SVM duality
// ============================================================================

#[test]
fn linear_svm_primal_matches_recovered_weights() {
    let (x, labels) = gaussian_blobs(&[&[0.0, 0.0], &[2.0, 1.0]], 60, 5);
    let config = SvmConfig::default().with_c(0.5);
    let svm = Svm::fit(&x, &labels, &config).unwrap();
    let (w, b) = svm.linear_weights().unwrap();
    let direct = linear_primal_objective(w, b, &x, &labels, &config).unwrap();
    let report = svm.duality();
    assert!((direct - report.primal).abs() <= 1e-6 * report.primal.abs().max(1.0));
    assert!(report.gap >= -1e-6);
    assert!(report.relative_gap() < 1e-2, "{report:?}");
}

#[test]
fn separable_svm_closes_duality_gap() {
    let (x, labels) = two_separated_classes(50, 3);
    let config = SvmConfig::default();
    let svm = Svm::fit(&x, &labels, &config).unwrap();
    let report = svm.duality();
    assert!(report.gap >= -1e-6);
    assert!(report.relative_gap() <= config.gap_tolerance, "{report:?}");

    let (w, b) = svm.linear_weights().unwrap();
    let direct = linear_primal_objective(w, b, &x, &labels, &config).unwrap();
    assert!((direct - report.primal).abs() <= 1e-6 * report.primal.abs().max(1.0));
    let pred = svm.predict(&x, 0.0).unwrap();
    assert!(errors(&pred, &labels) <= 0.02);
}

// ============================================================================
// Calibration
// ============================================================================

#[test]
fn calibration_repairs_shifted_scores() {
    let (raw, labels) = binary_scores(300, 1.0, 17);
    // Shifted far to the right: every sample is accepted at the Bayes threshold
    let distorted: Vec<f64> = raw.iter().map(|s| 0.2 * s + 3.0).collect();
    let app = BinaryApplication::default();
    let opts = DcfOptions::default();

    let before = BinaryReport::evaluate(&distorted, &labels, &app, &opts).unwrap();
    assert!(before.actual_dcf > 0.9, "{before}");

    let calibrated = calibrate_k_fold(&patrec_core::vrow(&distorted), &labels, 0.5, 5).unwrap();
    let after = BinaryReport::evaluate(&calibrated, &labels, &app, &opts).unwrap();
    assert!(after.actual_dcf < 0.6, "{after}");
    assert!(after.calibration_loss() < before.calibration_loss());
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn logistic_posteriors_follow_llr_order(shift in 0.5f64..3.0, seed in 0u64..1000) {
        let (x, labels) = gaussian_blobs(&[&[0.0], &[shift]], 30, seed);
        let lr = LogisticRegression::fit(&x, &labels, &LogRegConfig::default()).unwrap();
        let post = lr.posterior(&x).unwrap();
        let llr = lr.llr(&x).unwrap();
        prop_assert!(post.iter().all(|&p| (0.0..=1.0).contains(&p)));
        for i in 0..llr.len() {
            for j in 0..llr.len() {
                if llr[i] < llr[j] {
                    prop_assert!(post[i] <= post[j]);
                }
            }
        }
    }

    #[test]
    fn svm_multipliers_stay_in_the_box(c in 0.05f64..5.0, seed in 0u64..1000) {
        let (x, labels) = gaussian_blobs(&[&[0.0, 0.0], &[1.0, 1.0]], 20, seed);
        let svm = Svm::fit(&x, &labels, &SvmConfig::default().with_c(c)).unwrap();
        prop_assert!(svm.alpha().iter().all(|&a| (0.0..=c).contains(&a)));
        prop_assert!(svm.n_support() > 0);
    }
}
