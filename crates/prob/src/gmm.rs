//! Gaussian Mixture Models trained with EM and LBG splitting.
//!
//! A mixture is an ordered list of weighted Gaussian components whose
//! weights sum to one. Its log-density marginalises the per-component log
//! joints with a log-sum-exp:
//!
//! ```text
//! log p(x) = logsumexp_k [ log N(x | μ_k, Σ_k) + log w_k ]
//! ```
//!
//! Training follows the LBG schedule: start from the single ML Gaussian,
//! then repeatedly double the mixture by displacing every mean along its
//! leading eigen-direction and re-converge with EM.
//!
//! Each EM iteration consumes the previous mixture and returns a new one.
//! The unconstrained likelihood of a multi-component mixture is unbounded
//! (a component can collapse onto one sample), so an optional floor `ψ` on
//! covariance eigenvalues is applied after every M-step and to the initial
//! component.
//!
//! # Example
//!
//! ```rust
//! use nalgebra::DMatrix;
//! use patrec_prob::gmm::{train_lbg, GmmConfig};
//!
//! let x = DMatrix::from_row_slice(1, 8, &[-4.1, -3.9, -4.0, -4.2, 3.8, 4.0, 4.1, 4.2]);
//! let config = GmmConfig::default().with_components(2).with_psi(0.01);
//! let report = train_lbg(&x, &config).unwrap();
//!
//! assert_eq!(report.gmm.len(), 2);
//! let total: f64 = report.gmm.components().iter().map(|c| c.weight).sum();
//! assert!((total - 1.0).abs() < 1e-9);
//! ```

use nalgebra::{DMatrix, DVector};
use patrec_core::dataset::{check_labels, partition_by_class};
use patrec_core::gaussian::GaussianDensity;
use patrec_core::matrix::{clamp_eigenvalues, diagonal_only, mean_covariance, symmetric_eigen_desc};
use patrec_core::special::log_sum_exp_columns;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::ProbError;
use crate::inference::GenerativeClassifier;

/// Tolerance on the sum of mixture weights.
pub const WEIGHT_TOLERANCE: f64 = 1e-6;

/// One weighted Gaussian of a mixture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GmmComponent {
    pub weight: f64,
    pub mean: DVector<f64>,
    pub covariance: DMatrix<f64>,
}

/// Covariance structure imposed after each M-step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GmmCovariance {
    /// Unconstrained per-component covariance.
    #[default]
    Full,
    /// Per-component diagonal covariance.
    Diagonal,
    /// One covariance shared by every component.
    Tied,
}

/// A Gaussian mixture.
///
/// Invariants:
/// - at least one component
/// - every component has the same dimension D, with a `D × D` covariance
/// - weights are non-negative and sum to 1 within [`WEIGHT_TOLERANCE`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gmm {
    components: Vec<GmmComponent>,
}

impl Gmm {
    /// Validate and wrap a component list.
    pub fn new(components: Vec<GmmComponent>) -> Result<Self, ProbError> {
        let first = components.first().ok_or(ProbError::EmptyDistribution)?;
        let d = first.mean.len();

        for c in &components {
            if c.mean.len() != d {
                return Err(ProbError::ShapeMismatch {
                    expected: d,
                    got: c.mean.len(),
                });
            }
            if c.covariance.nrows() != d || c.covariance.ncols() != d {
                return Err(ProbError::ShapeMismatch {
                    expected: d,
                    got: c.covariance.nrows().max(c.covariance.ncols()),
                });
            }
            if !(c.weight >= 0.0) || !c.weight.is_finite() {
                return Err(ProbError::NegativeProbability);
            }
        }

        let sum: f64 = components.iter().map(|c| c.weight).sum();
        if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(ProbError::NotNormalized { sum });
        }
        Ok(Self { components })
    }

    /// The one-component ML mixture of the columns of `x`, with the
    /// structural constraint and eigenvalue floor applied.
    pub fn from_samples(
        x: &DMatrix<f64>,
        structure: GmmCovariance,
        psi: Option<f64>,
    ) -> Result<Self, ProbError> {
        let (mean, covariance) = mean_covariance(x)?;
        let covariance = match structure {
            GmmCovariance::Diagonal => diagonal_only(&covariance),
            GmmCovariance::Full | GmmCovariance::Tied => covariance,
        };
        let covariance = apply_floor(covariance, psi)?;
        Ok(Self {
            components: vec![GmmComponent {
                weight: 1.0,
                mean,
                covariance,
            }],
        })
    }

    pub fn components(&self) -> &[GmmComponent] {
        &self.components
    }

    pub fn into_components(self) -> Vec<GmmComponent> {
        self.components
    }

    /// Number of components.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Feature dimension D.
    pub fn dim(&self) -> usize {
        self.components.first().map_or(0, |c| c.mean.len())
    }

    /// `K × N` log joints `log N(x_n | μ_k, Σ_k) + log w_k`.
    pub fn log_joint(&self, x: &DMatrix<f64>) -> Result<DMatrix<f64>, ProbError> {
        let mut joint = DMatrix::zeros(self.components.len(), x.ncols());
        for (k, c) in self.components.iter().enumerate() {
            let density = GaussianDensity::new(c.mean.clone(), c.covariance.clone())?;
            let ll = density.log_pdf(x)?.add_scalar(c.weight.ln());
            joint.row_mut(k).copy_from(&ll.transpose());
        }
        Ok(joint)
    }

    /// Log-density of each column of `x` under the mixture.
    pub fn log_pdf(&self, x: &DMatrix<f64>) -> Result<DVector<f64>, ProbError> {
        Ok(log_sum_exp_columns(&self.log_joint(x)?))
    }

    /// Average per-sample log-likelihood, the quantity EM monitors.
    pub fn mean_log_likelihood(&self, x: &DMatrix<f64>) -> Result<f64, ProbError> {
        if x.ncols() == 0 {
            return Err(patrec_core::CoreError::Empty { what: "samples" }.into());
        }
        Ok(self.log_pdf(x)?.mean())
    }

    /// Double the mixture: every component is replaced by its two LBG children.
    pub fn split(&self, alpha: f64) -> Result<Gmm, ProbError> {
        let mut components = Vec::with_capacity(2 * self.components.len());
        for c in &self.components {
            let (lo, hi) = lbg_split(c, alpha)?;
            components.push(lo);
            components.push(hi);
        }
        Ok(Gmm { components })
    }
}

/// Split one component along the leading eigenvector of its covariance.
///
/// With `Σ = U diag(s) Uᵀ` (eigenvalues descending), the displacement is
/// `d = α · sqrt(s₀) · u₀`. The children are `(w/2, μ - d, Σ)` and
/// `(w/2, μ + d, Σ)`.
pub fn lbg_split(
    component: &GmmComponent,
    alpha: f64,
) -> Result<(GmmComponent, GmmComponent), ProbError> {
    if !(alpha > 0.0) || !alpha.is_finite() {
        return Err(ProbError::invalid("alpha", "displacement factor must be positive"));
    }
    let (values, vectors) = symmetric_eigen_desc(&component.covariance)?;
    let leading = values.get(0).copied().unwrap_or(0.0).max(0.0);
    let displacement = vectors.column(0) * (leading.sqrt() * alpha);

    let weight = component.weight / 2.0;
    Ok((
        GmmComponent {
            weight,
            mean: &component.mean - &displacement,
            covariance: component.covariance.clone(),
        },
        GmmComponent {
            weight,
            mean: &component.mean + &displacement,
            covariance: component.covariance.clone(),
        },
    ))
}

/// Hyperparameters for EM and LBG training.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GmmConfig {
    /// Target number of components: 1 or an even number.
    pub components: usize,
    /// Stop when the mean log-likelihood improves by less than this.
    pub threshold: f64,
    /// Cap on EM iterations per LBG stage.
    pub max_iterations: usize,
    /// LBG displacement factor.
    pub alpha: f64,
    /// Eigenvalue floor ψ for every covariance.
    pub psi: Option<f64>,
    /// Structural constraint on covariances.
    pub covariance: GmmCovariance,
}

impl Default for GmmConfig {
    fn default() -> Self {
        Self {
            components: 1,
            threshold: 1e-6,
            max_iterations: 1000,
            alpha: 0.1,
            psi: None,
            covariance: GmmCovariance::Full,
        }
    }
}

impl GmmConfig {
    pub fn with_components(mut self, components: usize) -> Self {
        self.components = components;
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_psi(mut self, psi: f64) -> Self {
        self.psi = Some(psi);
        self
    }

    pub fn with_covariance(mut self, covariance: GmmCovariance) -> Self {
        self.covariance = covariance;
        self
    }

    /// Check every field; the component count must be 1 or even.
    pub fn validate(&self) -> Result<(), ProbError> {
        let c = self.components;
        if c != 1 && (c < 2 || c % 2 != 0) {
            return Err(ProbError::InvalidComponentCount { requested: c });
        }
        if !(self.threshold >= 0.0) {
            return Err(ProbError::invalid("threshold", "must be non-negative"));
        }
        if self.max_iterations == 0 {
            return Err(ProbError::invalid("max_iterations", "must be at least 1"));
        }
        if !(self.alpha > 0.0) {
            return Err(ProbError::invalid("alpha", "must be positive"));
        }
        if let Some(psi) = self.psi {
            if !(psi > 0.0) {
                return Err(ProbError::invalid("psi", "eigenvalue floor must be positive"));
            }
        }
        Ok(())
    }
}

/// Outcome of an EM run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmReport {
    /// The last mixture produced.
    pub gmm: Gmm,
    /// Mean log-likelihood of the training data under `gmm`.
    pub mean_log_likelihood: f64,
    /// EM iterations performed.
    pub iterations: usize,
    /// Whether the improvement fell below the threshold before the cap.
    pub converged: bool,
    /// Mean log-likelihood of the start state followed by one entry per iteration.
    pub history: Vec<f64>,
    /// Number of iterations whose log-likelihood was lower than the previous one.
    pub likelihood_decreases: usize,
}

/// One EM iteration: E-step responsibilities, then M-step re-estimation.
///
/// Returns an entirely new mixture; `gmm` is left untouched. A component
/// whose responsibilities sum to zero is reported as
/// [`ProbError::DegenerateComponent`].
pub fn em_step(
    x: &DMatrix<f64>,
    gmm: &Gmm,
    structure: GmmCovariance,
    psi: Option<f64>,
) -> Result<Gmm, ProbError> {
    let n = x.ncols();
    if n == 0 {
        return Err(patrec_core::CoreError::Empty { what: "samples" }.into());
    }

    // E-step
    let mut log_post = gmm.log_joint(x)?;
    let marginal = log_sum_exp_columns(&log_post);
    for (i, mut col) in log_post.column_iter_mut().enumerate() {
        col.add_scalar_mut(-marginal[i]);
    }
    let responsibilities = log_post.map(f64::exp);

    // M-step
    let mut zeros = Vec::with_capacity(gmm.len());
    let mut components = Vec::with_capacity(gmm.len());
    for k in 0..gmm.len() {
        let gamma = responsibilities.row(k);
        let z: f64 = gamma.sum();
        if !(z > 0.0) {
            return Err(ProbError::DegenerateComponent { component: k });
        }

        let mut weighted = x.clone();
        for (i, mut col) in weighted.column_iter_mut().enumerate() {
            col *= gamma[i];
        }
        let f = weighted.column_sum();
        let s = &weighted * x.transpose();

        let mean = f / z;
        let covariance = s / z - &mean * mean.transpose();
        zeros.push(z);
        components.push(GmmComponent {
            weight: z / n as f64,
            mean,
            covariance,
        });
    }

    match structure {
        GmmCovariance::Full => {}
        GmmCovariance::Diagonal => {
            for c in &mut components {
                c.covariance = diagonal_only(&c.covariance);
            }
        }
        GmmCovariance::Tied => {
            let d = x.nrows();
            let mut shared = DMatrix::zeros(d, d);
            for (c, &z) in components.iter().zip(&zeros) {
                shared += &c.covariance * z;
            }
            shared /= n as f64;
            for c in &mut components {
                c.covariance = shared.clone();
            }
        }
    }

    if let Some(floor) = psi {
        for c in &mut components {
            c.covariance = clamp_eigenvalues(&c.covariance, floor)?;
        }
    }
    Ok(Gmm { components })
}

/// Iterate EM from `start` until the mean log-likelihood improvement drops
/// below `config.threshold` or `config.max_iterations` is reached.
///
/// A decrease of the log-likelihood is logged at warn level and counted in
/// the report; training carries on.
pub fn train_em(x: &DMatrix<f64>, start: Gmm, config: &GmmConfig) -> Result<EmReport, ProbError> {
    config.validate()?;

    let mut current = start;
    let mut ll_old = current.mean_log_likelihood(x)?;
    let mut history = vec![ll_old];
    let mut iterations = 0;
    let mut decreases = 0;
    let mut converged = false;

    loop {
        let next = em_step(x, &current, config.covariance, config.psi)?;
        let ll_new = next.mean_log_likelihood(x)?;
        iterations += 1;
        history.push(ll_new);
        current = next;

        if ll_new < ll_old {
            decreases += 1;
            warn!(
                iteration = iterations,
                ll_old,
                ll_new,
                "GMM mean log-likelihood decreased"
            );
        }
        debug!(
            iteration = iterations,
            ll = ll_new,
            delta = ll_new - ll_old,
            components = current.len(),
            "EM iteration"
        );

        if ll_new - ll_old < config.threshold {
            converged = true;
            break;
        }
        if iterations >= config.max_iterations {
            warn!(
                max_iterations = config.max_iterations,
                ll = ll_new,
                "EM stopped at iteration cap"
            );
            break;
        }
        ll_old = ll_new;
    }

    let mean_log_likelihood = history.last().copied().unwrap_or(ll_old);
    Ok(EmReport {
        gmm: current,
        mean_log_likelihood,
        iterations,
        converged,
        history,
        likelihood_decreases: decreases,
    })
}

/// Train a mixture of `config.components` components with the LBG schedule.
///
/// Starts from the one-component ML mixture and alternates doubling and
/// EM until the target is reached. For a target of 1 no EM is run, since
/// the ML Gaussian is already the fixed point. The report describes the
/// last EM stage.
///
/// Doubling only reaches powers of two, so other even targets are rounded
/// up (6 trains 8 components).
///
/// # Errors
/// `InvalidComponentCount` unless the target is 1 or an even number.
pub fn train_lbg(x: &DMatrix<f64>, config: &GmmConfig) -> Result<EmReport, ProbError> {
    config.validate()?;

    let start = Gmm::from_samples(x, config.covariance, config.psi)?;
    let ll = start.mean_log_likelihood(x)?;
    let mut report = EmReport {
        gmm: start,
        mean_log_likelihood: ll,
        iterations: 0,
        converged: true,
        history: vec![ll],
        likelihood_decreases: 0,
    };

    while report.gmm.len() < config.components {
        let doubled = report.gmm.split(config.alpha)?;
        debug!(components = doubled.len(), "LBG split");
        report = train_em(x, doubled, config)?;
    }

    info!(
        components = report.gmm.len(),
        ll = report.mean_log_likelihood,
        iterations = report.iterations,
        converged = report.converged,
        "LBG training finished"
    );
    Ok(report)
}

fn apply_floor(covariance: DMatrix<f64>, psi: Option<f64>) -> Result<DMatrix<f64>, ProbError> {
    match psi {
        Some(floor) => Ok(clamp_eigenvalues(&covariance, floor)?),
        None => Ok(covariance),
    }
}

/// One LBG-trained mixture per class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GmmClassifier {
    gmms: Vec<Gmm>,
}

impl GmmClassifier {
    /// Train every class with the same configuration.
    pub fn fit(
        x: &DMatrix<f64>,
        labels: &[usize],
        n_classes: usize,
        config: &GmmConfig,
    ) -> Result<Self, ProbError> {
        let configs = vec![config.clone(); n_classes];
        Self::fit_per_class(x, labels, &configs)
    }

    /// Train class `k` with `configs[k]`, e.g. a different component count
    /// per class.
    pub fn fit_per_class(
        x: &DMatrix<f64>,
        labels: &[usize],
        configs: &[GmmConfig],
    ) -> Result<Self, ProbError> {
        let n_classes = configs.len();
        check_labels(labels, x.ncols(), n_classes)?;
        let parts = partition_by_class(x, labels, n_classes)?;

        let gmms = parts
            .iter()
            .zip(configs)
            .enumerate()
            .map(|(class, (part, config))| {
                let report = train_lbg(part, config)?;
                debug!(class, components = report.gmm.len(), "class mixture trained");
                Ok(report.gmm)
            })
            .collect::<Result<Vec<_>, ProbError>>()?;
        Ok(Self { gmms })
    }

    pub fn from_mixtures(gmms: Vec<Gmm>) -> Result<Self, ProbError> {
        if gmms.is_empty() {
            return Err(ProbError::EmptyDistribution);
        }
        Ok(Self { gmms })
    }

    pub fn mixtures(&self) -> &[Gmm] {
        &self.gmms
    }
}

impl GenerativeClassifier for GmmClassifier {
    fn n_classes(&self) -> usize {
        self.gmms.len()
    }

    fn log_likelihoods(&self, x: &DMatrix<f64>) -> Result<DMatrix<f64>, ProbError> {
        let mut scores = DMatrix::zeros(self.gmms.len(), x.ncols());
        for (k, gmm) in self.gmms.iter().enumerate() {
            scores.row_mut(k).copy_from(&gmm.log_pdf(x)?.transpose());
        }
        Ok(scores)
    }
}
