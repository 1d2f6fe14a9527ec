use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// L2-regularized least squares with an unpenalized intercept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RidgeRegression {
    pub alpha: f64,
    pub coefficients: Array1<f64>,
    pub intercept: f64,
}

impl RidgeRegression {
    /// Closed-form fit: centres `x` and `y`, then solves
    /// `(XᵀX + αI) w = Xᵀy`.
    pub fn fit(x: &Array2<f64>, y: &Array1<f64>, alpha: f64) -> Result<Self> {
        if x.nrows() != y.len() {
            return Err(Error::InvalidInput(format!(
                "{} feature rows but {} targets",
                x.nrows(),
                y.len()
            )));
        }
        if alpha < 0.0 {
            return Err(Error::InvalidInput("ridge alpha must be non-negative".into()));
        }
        let x_mean = x
            .mean_axis(Axis(0))
            .ok_or_else(|| Error::InsufficientData("cannot fit ridge on zero rows".into()))?;
        let y_mean = y.mean().unwrap_or(0.0);

        let xc = x - &x_mean.view().insert_axis(Axis(0));
        let yc = y - y_mean;

        let mut gram = xc.t().dot(&xc);
        for i in 0..gram.nrows() {
            gram[[i, i]] += alpha;
        }
        let rhs = xc.t().dot(&yc);
        let coefficients = solve(gram, rhs)?;
        let intercept = y_mean - x_mean.dot(&coefficients);

        Ok(Self {
            alpha,
            coefficients,
            intercept,
        })
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if x.ncols() != self.coefficients.len() {
            return Err(Error::InvalidInput(format!(
                "model expects {} features, got {}",
                self.coefficients.len(),
                x.ncols()
            )));
        }
        Ok(x.dot(&self.coefficients) + self.intercept)
    }
}

/// Gaussian elimination with partial pivoting.
fn solve(mut a: Array2<f64>, mut b: Array1<f64>) -> Result<Array1<f64>> {
    let n = b.len();
    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&i, &j| a[[i, col]].abs().total_cmp(&a[[j, col]].abs()))
            .unwrap_or(col);
        if a[[pivot, col]].abs() < 1e-12 {
            return Err(Error::InvalidInput(
                "singular system, increase alpha or remove constant features".into(),
            ));
        }
        if pivot != col {
            for k in 0..n {
                a.swap([col, k], [pivot, k]);
            }
            b.swap(col, pivot);
        }
        for row in col + 1..n {
            let factor = a[[row, col]] / a[[col, col]];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[[row, k]] -= factor * a[[col, k]];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = Array1::zeros(n);
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[[row, k]] * x[k]).sum();
        x[row] = (b[row] - tail) / a[[row, row]];
    }
    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn recovers_exact_linear_relationship_without_penalty() {
        // y = 3 + 2a - b
        let x = array![[0.0, 1.0], [1.0, 0.0], [2.0, 3.0], [3.0, 1.0], [4.0, 5.0]];
        let y = x.map_axis(Axis(1), |r| 3.0 + 2.0 * r[0] - r[1]);

        let model = RidgeRegression::fit(&x, &y, 0.0).unwrap();
        assert!((model.coefficients[0] - 2.0).abs() < 1e-9);
        assert!((model.coefficients[1] + 1.0).abs() < 1e-9);
        assert!((model.intercept - 3.0).abs() < 1e-9);

        let pred = model.predict(&array![[10.0, 2.0]]).unwrap();
        assert!((pred[0] - 21.0).abs() < 1e-9);
    }

    #[test]
    fn penalty_shrinks_coefficients() {
        let x = array![[-1.0], [0.0], [1.0]];
        let y = array![-2.0, 0.0, 2.0];
        // xᵀx = 2, xᵀy = 4 → w = 4 / (2 + α)
        let model = RidgeRegression::fit(&x, &y, 2.0).unwrap();
        assert!((model.coefficients[0] - 1.0).abs() < 1e-12);
        assert!(model.intercept.abs() < 1e-12);
    }

    #[test]
    fn collinear_features_need_a_penalty() {
        let x = array![[1.0, 2.0], [2.0, 4.0], [3.0, 6.0]];
        let y = array![1.0, 2.0, 3.0];
        assert!(RidgeRegression::fit(&x, &y, 0.0).is_err());
        assert!(RidgeRegression::fit(&x, &y, 0.1).is_ok());
    }

    #[test]
    fn shape_mismatches_are_errors() {
        let x = array![[1.0], [2.0]];
        assert!(RidgeRegression::fit(&x, &array![1.0], 0.1).is_err());
        let model = RidgeRegression::fit(&x, &array![1.0, 2.0], 0.1).unwrap();
        assert!(model.predict(&array![[1.0, 2.0]]).is_err());
    }
}
