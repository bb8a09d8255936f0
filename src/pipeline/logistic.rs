//! L2-regularised binary logistic regression

use super::transformer::EncodedRow;
use super::PipelineError;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Armijo sufficient-decrease constant
const ARMIJO_C: f64 = 1e-4;
/// Smallest step tried before the line search gives up
const MIN_STEP: f64 = 1e-12;

/// Per-class sample weighting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ClassWeight {
    /// Weight each class inversely to its frequency: n / (2 * n_class)
    #[default]
    Balanced,
    /// Every sample weighs 1
    Uniform,
}

/// Solver parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticParams {
    pub max_iter: usize,
    /// Stop once the largest gradient component falls below this
    pub tolerance: f64,
    /// Inverse regularisation strength
    pub c: f64,
    pub class_weight: ClassWeight,
}

impl LogisticParams {
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.max_iter == 0 {
            return Err(PipelineError::InvalidParameter("max_iter must be positive".into()));
        }
        if !(self.tolerance > 0.0) {
            return Err(PipelineError::InvalidParameter("tolerance must be positive".into()));
        }
        if !(self.c > 0.0) {
            return Err(PipelineError::InvalidParameter("c must be positive".into()));
        }
        Ok(())
    }
}

impl Default for LogisticParams {
    fn default() -> Self {
        Self {
            max_iter: 500,
            tolerance: 1e-4,
            c: 1.0,
            class_weight: ClassWeight::Balanced,
        }
    }
}

/// Fitted logistic regression over transformer output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    coefficients: Vec<f64>,
    intercept: f64,
    iterations: usize,
    converged: bool,
}

impl LogisticRegression {
    /// Fit on encoded rows of `width` outputs.
    ///
    /// Numeric inputs are standardised internally; the stored coefficients
    /// are mapped back to the raw input scale.
    pub fn fit(
        rows: &[EncodedRow],
        width: usize,
        labels: &[u8],
        params: &LogisticParams,
    ) -> Result<Self, PipelineError> {
        params.validate()?;
        if rows.is_empty() {
            return Err(PipelineError::EmptyTrainingSet);
        }
        if rows.len() != labels.len() {
            return Err(PipelineError::LabelCount {
                rows: rows.len(),
                labels: labels.len(),
            });
        }
        if let Some(bad) = labels.iter().find(|&&y| y > 1) {
            return Err(PipelineError::InvalidLabel(bad.to_string()));
        }

        let n = rows.len();
        let positives = labels.iter().filter(|&&y| y == 1).count();
        if positives == 0 || positives == n {
            return Err(PipelineError::SingleClass);
        }

        let sample_weights: Vec<f64> = match params.class_weight {
            ClassWeight::Balanced => {
                let w_pos = n as f64 / (2.0 * positives as f64);
                let w_neg = n as f64 / (2.0 * (n - positives) as f64);
                labels
                    .iter()
                    .map(|&y| if y == 1 { w_pos } else { w_neg })
                    .collect()
            }
            ClassWeight::Uniform => vec![1.0; n],
        };

        let problem = Problem::new(rows, width, labels, sample_weights, params.c);
        let (theta, intercept, iterations, converged) = problem.solve(params);

        if converged {
            debug!(iterations, "Logistic regression converged");
        } else {
            warn!(
                iterations,
                max_iter = params.max_iter,
                "Logistic regression did not converge; consider raising max_iter"
            );
        }

        // Undo standardisation of the numeric block
        let mut coefficients = theta;
        let mut intercept = intercept;
        for (j, (mean, std)) in problem.scaling.iter().enumerate() {
            coefficients[j] /= std;
            intercept -= coefficients[j] * mean;
        }

        Ok(Self {
            coefficients,
            intercept,
            iterations,
            converged,
        })
    }

    pub fn decision_function(&self, row: &EncodedRow) -> f64 {
        row.dot(&self.coefficients) + self.intercept
    }

    /// Class-1 probability
    pub fn predict_proba(&self, row: &EncodedRow) -> f64 {
        sigmoid(self.decision_function(row))
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn converged(&self) -> bool {
        self.converged
    }

    pub fn n_features(&self) -> usize {
        self.coefficients.len()
    }
}

/// Training problem in standardised space
struct Problem<'a> {
    rows: &'a [EncodedRow],
    labels: &'a [u8],
    /// Standardised numeric block, row-major
    scaled: Vec<Vec<f64>>,
    /// (mean, std) per numeric input
    scaling: Vec<(f64, f64)>,
    sample_weights: Vec<f64>,
    weight_sum: f64,
    width: usize,
    c: f64,
}

impl<'a> Problem<'a> {
    fn new(
        rows: &'a [EncodedRow],
        width: usize,
        labels: &'a [u8],
        sample_weights: Vec<f64>,
        c: f64,
    ) -> Self {
        let n = rows.len() as f64;
        let numeric_width = rows[0].numeric.len();

        let scaling: Vec<(f64, f64)> = (0..numeric_width)
            .map(|j| {
                let mean = rows.iter().map(|r| r.numeric[j]).sum::<f64>() / n;
                let var = rows
                    .iter()
                    .map(|r| (r.numeric[j] - mean).powi(2))
                    .sum::<f64>()
                    / n;
                let std = var.sqrt();
                (mean, if std > 0.0 { std } else { 1.0 })
            })
            .collect();

        let scaled = rows
            .iter()
            .map(|r| {
                r.numeric
                    .iter()
                    .zip(&scaling)
                    .map(|(x, (mean, std))| (x - mean) / std)
                    .collect()
            })
            .collect();

        let weight_sum = sample_weights.iter().sum();

        Self {
            rows,
            labels,
            scaled,
            scaling,
            sample_weights,
            weight_sum,
            width,
            c,
        }
    }

    fn margin(&self, i: usize, theta: &[f64], intercept: f64) -> f64 {
        let numeric: f64 = self.scaled[i].iter().zip(theta).map(|(z, w)| z * w).sum();
        let one_hot: f64 = self.rows[i].active.iter().map(|&a| theta[a]).sum();
        numeric + one_hot + intercept
    }

    fn penalty(&self, theta: &[f64]) -> f64 {
        theta.iter().map(|w| w * w).sum::<f64>() / (2.0 * self.c * self.weight_sum)
    }

    fn objective(&self, theta: &[f64], intercept: f64) -> f64 {
        let loss: f64 = (0..self.rows.len())
            .map(|i| {
                let m = self.margin(i, theta, intercept);
                self.sample_weights[i] * (softplus(m) - f64::from(self.labels[i]) * m)
            })
            .sum();
        loss / self.weight_sum + self.penalty(theta)
    }

    /// Objective value and gradient (coefficients, intercept)
    fn objective_and_gradient(&self, theta: &[f64], intercept: f64) -> (f64, Vec<f64>, f64) {
        let mut loss = 0.0;
        let mut grad = vec![0.0; self.width];
        let mut grad_intercept = 0.0;

        for i in 0..self.rows.len() {
            let m = self.margin(i, theta, intercept);
            let y = f64::from(self.labels[i]);
            let s = self.sample_weights[i];
            loss += s * (softplus(m) - y * m);

            let residual = s * (sigmoid(m) - y) / self.weight_sum;
            for (g, z) in grad.iter_mut().zip(&self.scaled[i]) {
                *g += residual * z;
            }
            for &a in &self.rows[i].active {
                grad[a] += residual;
            }
            grad_intercept += residual;
        }

        let reg = 1.0 / (self.c * self.weight_sum);
        for (g, w) in grad.iter_mut().zip(theta) {
            *g += reg * w;
        }

        (loss / self.weight_sum + self.penalty(theta), grad, grad_intercept)
    }

    /// Gradient descent with Armijo backtracking
    fn solve(&self, params: &LogisticParams) -> (Vec<f64>, f64, usize, bool) {
        let mut theta = vec![0.0; self.width];
        let mut intercept = 0.0;
        let mut step: f64 = 1.0;

        for iteration in 0..params.max_iter {
            let (value, grad, grad_intercept) = self.objective_and_gradient(&theta, intercept);

            let max_grad = grad
                .iter()
                .chain(std::iter::once(&grad_intercept))
                .fold(0.0_f64, |acc, g| acc.max(g.abs()));
            if max_grad <= params.tolerance {
                return (theta, intercept, iteration, true);
            }

            let grad_norm_sq =
                grad.iter().map(|g| g * g).sum::<f64>() + grad_intercept * grad_intercept;

            step = (step * 2.0).min(1e3);
            loop {
                let candidate: Vec<f64> = theta
                    .iter()
                    .zip(&grad)
                    .map(|(w, g)| w - step * g)
                    .collect();
                let candidate_intercept = intercept - step * grad_intercept;
                let candidate_value = self.objective(&candidate, candidate_intercept);

                if candidate_value <= value - ARMIJO_C * step * grad_norm_sq {
                    theta = candidate;
                    intercept = candidate_intercept;
                    break;
                }
                step /= 2.0;
                if step < MIN_STEP {
                    debug!(iteration, "Line search stalled");
                    return (theta, intercept, iteration, false);
                }
            }
        }

        (theta, intercept, params.max_iter, false)
    }
}

fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// ln(1 + e^x) without overflow
fn softplus(x: f64) -> f64 {
    x.max(0.0) + (-x.abs()).exp().ln_1p()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numeric_rows(xs: &[f64]) -> Vec<EncodedRow> {
        xs.iter()
            .map(|&x| EncodedRow {
                numeric: vec![x],
                active: Vec::new(),
            })
            .collect()
    }

    #[test]
    fn test_sigmoid_and_softplus_are_stable() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-12);
        assert!(sigmoid(-800.0) >= 0.0);
        assert!(sigmoid(800.0) <= 1.0);
        assert!((softplus(0.0) - 2f64.ln()).abs() < 1e-12);
        assert!((softplus(800.0) - 800.0).abs() < 1e-9);
        assert!(softplus(-800.0) >= 0.0);
    }

    #[test]
    fn test_fit_learns_direction() {
        let xs = [1.0, 2.0, 3.0, 4.0, 6.0, 7.0, 8.0, 9.0, 4.5, 5.5];
        let ys = [0, 0, 0, 0, 1, 1, 1, 1, 1, 0];
        let rows = numeric_rows(&xs);

        let model = LogisticRegression::fit(&rows, 1, &ys, &LogisticParams::default()).unwrap();

        assert!(model.coefficients()[0] > 0.0);
        let low = model.predict_proba(&numeric_rows(&[1.0])[0]);
        let high = model.predict_proba(&numeric_rows(&[9.0])[0]);
        assert!(low < 0.5, "low = {}", low);
        assert!(high > 0.5, "high = {}", high);
    }

    #[test]
    fn test_balanced_weights_shift_intercept() {
        // Constant feature: only the intercept can move
        let rows = numeric_rows(&[1.0; 10]);
        let ys = [0, 0, 0, 0, 0, 0, 0, 0, 1, 1];

        let balanced = LogisticRegression::fit(&rows, 1, &ys, &LogisticParams::default()).unwrap();
        let uniform = LogisticRegression::fit(
            &rows,
            1,
            &ys,
            &LogisticParams {
                class_weight: ClassWeight::Uniform,
                ..LogisticParams::default()
            },
        )
        .unwrap();

        assert!(balanced.converged());
        assert!((balanced.predict_proba(&rows[0]) - 0.5).abs() < 1e-3);
        assert!((uniform.predict_proba(&rows[0]) - 0.2).abs() < 1e-3);
    }

    #[test]
    fn test_one_hot_inputs() {
        // width 2: no numeric inputs, two one-hot positions
        let rows: Vec<EncodedRow> = (0..20)
            .map(|i| EncodedRow {
                numeric: Vec::new(),
                active: vec![i % 2],
            })
            .collect();
        let ys: Vec<u8> = (0..20).map(|i| u8::from(i % 2 == 1 && i != 19)).collect();

        let model = LogisticRegression::fit(&rows, 2, &ys, &LogisticParams::default()).unwrap();
        assert!(model.predict_proba(&rows[1]) > model.predict_proba(&rows[0]));
        assert_eq!(model.n_features(), 2);
    }

    #[test]
    fn test_fit_rejects_bad_input() {
        let rows = numeric_rows(&[1.0, 2.0]);
        let params = LogisticParams::default();

        assert_eq!(
            LogisticRegression::fit(&[], 1, &[], &params),
            Err(PipelineError::EmptyTrainingSet)
        );
        assert_eq!(
            LogisticRegression::fit(&rows, 1, &[1, 1], &params),
            Err(PipelineError::SingleClass)
        );
        assert_eq!(
            LogisticRegression::fit(&rows, 1, &[0], &params),
            Err(PipelineError::LabelCount { rows: 2, labels: 1 })
        );
        assert_eq!(
            LogisticRegression::fit(&rows, 1, &[0, 2], &params),
            Err(PipelineError::InvalidLabel("2".to_string()))
        );
        let bad_params = LogisticParams {
            c: 0.0,
            ..LogisticParams::default()
        };
        assert!(matches!(
            LogisticRegression::fit(&rows, 1, &[0, 1], &bad_params),
            Err(PipelineError::InvalidParameter(_))
        ));
    }
}
