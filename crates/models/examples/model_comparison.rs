//! Generative vs discriminative classifiers under the same Bayes-risk metrics
//!
//! Run with: RUST_LOG=debug cargo run -p patrec-models --example model_comparison
//!
//! This example demonstrates:
//! - A 2-to-1 split of a synthetic binary task
//! - Gaussian, logistic regression, SVM and PCA+LDA models on the same split
//! - Actual vs minimum DCF for several applications
//! - Out-of-fold calibration of SVM scores and a Bayes error plot

use patrec_core::{vrow, Dataset};
use patrec_eval::{bayes_error_plot, linspace, DcfOptions};
use patrec_models::{
    calibrate_k_fold, BinaryReport, BinaryScorer, FeatureExpansion, Kernel, LdaClassifier,
    LogRegConfig, LogisticRegression, Svm, SvmConfig,
};
use patrec_prob::{BinaryApplication, CovarianceModel, GaussianClassifier, GenerativeClassifier};
use patrec_test_fixtures::gaussian_blobs;
use tracing_subscriber::EnvFilter;

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    println!("=== Model Comparison ===\n");

    // Class 1 is split around class 0 along the first axis
    let (x, raw_labels) = gaussian_blobs(
        &[&[0.0, 0.0, 0.0], &[-3.0, 1.0, 0.5], &[3.0, 1.0, 0.5]],
        200,
        42,
    );
    let labels: Vec<usize> = raw_labels.iter().map(|&l| usize::from(l > 0)).collect();
    let (train, val) = Dataset::new(x, labels)
        .expect("dataset")
        .split_2to1(0)
        .expect("split");

    let apps = [
        BinaryApplication::new(0.5, 1.0, 1.0).expect("app"),
        BinaryApplication::new(0.1, 1.0, 1.0).expect("app"),
        BinaryApplication::new(0.9, 1.0, 1.0).expect("app"),
    ];
    let opts = DcfOptions::default();

    // -------------------------------------------------------------------------
    // 1. Scores from every model
    // -------------------------------------------------------------------------
    println!("1. Held-out scores");
    println!("------------------\n");

    let mut systems: Vec<(&str, Vec<f64>)> = Vec::new();

    for model in [CovarianceModel::Full, CovarianceModel::Naive, CovarianceModel::Tied] {
        let clf = GaussianClassifier::fit(train.features(), train.labels(), 2, model).expect("fit");
        let name = match model {
            CovarianceModel::Full => "MVG",
            CovarianceModel::Naive => "Naive Bayes",
            CovarianceModel::Tied => "Tied MVG",
        };
        systems.push((name, clf.llr(val.features()).expect("llr")));
    }

    let linear = LogisticRegression::fit(train.features(), train.labels(), &LogRegConfig::default())
        .expect("fit");
    systems.push(("LR", linear.scores(val.features()).expect("scores")));

    let quadratic = LogisticRegression::fit(
        train.features(),
        train.labels(),
        &LogRegConfig::default()
            .with_features(FeatureExpansion::Quadratic)
            .with_prior_weighting(0.5),
    )
    .expect("fit");
    systems.push(("Quadratic LR", quadratic.scores(val.features()).expect("scores")));

    let rbf = Svm::fit(
        train.features(),
        train.labels(),
        &SvmConfig::default().with_kernel(Kernel::Rbf { gamma: 0.5 }),
    )
    .expect("fit");
    println!(
        "  RBF SVM: {} support vectors, duality gap {:.2e}",
        rbf.n_support(),
        rbf.duality().gap
    );
    let svm_scores = rbf.scores(val.features()).expect("scores");
    systems.push(("RBF SVM", svm_scores.clone()));

    let lda = LdaClassifier::fit(train.features(), train.labels(), Some(2)).expect("fit");
    systems.push(("PCA+LDA", lda.scores(val.features()).expect("scores")));
    println!();

    // -------------------------------------------------------------------------
    // 2. Bayes risk per application
    // -------------------------------------------------------------------------
    println!("2. Actual and minimum DCF");
    println!("-------------------------\n");

    for (name, scores) in &systems {
        println!("  {name}");
        let reports = BinaryReport::evaluate_many(scores, val.labels(), &apps, &opts).expect("report");
        for report in reports {
            println!("    {report}");
        }
    }
    println!();

    // -------------------------------------------------------------------------
    // 3. Calibration
    // -------------------------------------------------------------------------
    println!("3. Calibrating the SVM");
    println!("----------------------\n");

    let calibrated = calibrate_k_fold(&vrow(&svm_scores), val.labels(), 0.5, 5).expect("calibrate");
    for app in &apps {
        let raw = BinaryReport::evaluate(&svm_scores, val.labels(), app, &opts).expect("report");
        let cal = BinaryReport::evaluate(&calibrated, val.labels(), app, &opts).expect("report");
        println!(
            "  π = {:.1}: actDCF {:.4} -> {:.4} (minDCF {:.4})",
            app.prior, raw.actual_dcf, cal.actual_dcf, cal.min_dcf.value
        );
    }
    println!();

    println!("  Bayes error plot of the calibrated scores:");
    let plot = bayes_error_plot(&calibrated, val.labels(), &linspace(-3.0, 3.0, 13), &opts)
        .expect("plot");
    for point in plot {
        println!(
            "    log-odds {:+.1}: actDCF {:.4}  minDCF {:.4}",
            point.log_odds, point.actual_dcf, point.min_dcf
        );
    }
    println!();

    println!("=== Done ===");
}
