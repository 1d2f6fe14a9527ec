use ndarray::{Array2, Zip};

/// Adam with bias-corrected moment estimates.
#[derive(Debug, Clone)]
pub struct Adam {
    pub learning_rate: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub epsilon: f64,
    step: i32,
    moments: Vec<(Array2<f64>, Array2<f64>)>,
}

impl Adam {
    pub fn new(learning_rate: f64) -> Self {
        Self {
            learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-7,
            step: 0,
            moments: Vec::new(),
        }
    }

    /// Applies one update. `params` and `grads` must be passed in the same
    /// order on every call.
    pub fn update(&mut self, params: &mut [&mut Array2<f64>], grads: &[&Array2<f64>]) {
        debug_assert_eq!(params.len(), grads.len());
        if self.moments.len() != params.len() {
            self.moments = params
                .iter()
                .map(|p| (Array2::zeros(p.raw_dim()), Array2::zeros(p.raw_dim())))
                .collect();
        }

        self.step += 1;
        let (b1, b2, eps) = (self.beta1, self.beta2, self.epsilon);
        let correction1 = 1.0 - b1.powi(self.step);
        let correction2 = 1.0 - b2.powi(self.step);
        let lr = self.learning_rate;

        for ((param, grad), (m, v)) in params.iter_mut().zip(grads).zip(self.moments.iter_mut()) {
            Zip::from(&mut **param)
                .and(m)
                .and(v)
                .and(*grad)
                .for_each(|p, m, v, &g| {
                    *m = b1 * *m + (1.0 - b1) * g;
                    *v = b2 * *v + (1.0 - b2) * g * g;
                    let m_hat = *m / correction1;
                    let v_hat = *v / correction2;
                    *p -= lr * m_hat / (v_hat.sqrt() + eps);
                });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn first_step_moves_by_learning_rate() {
        let mut adam = Adam::new(0.1);
        let mut w = array![[1.0, -1.0]];
        let g = array![[0.5, -2.0]];
        adam.update(&mut [&mut w], &[&g]);
        // bias-corrected first step is lr * sign(g)
        assert!((w[[0, 0]] - 0.9).abs() < 1e-6);
        assert!((w[[0, 1]] + 0.9).abs() < 1e-6);
    }

    #[test]
    fn minimizes_a_quadratic() {
        let mut adam = Adam::new(0.05);
        let mut w = array![[3.0]];
        for _ in 0..500 {
            let g = w.mapv(|x| 2.0 * (x - 1.0));
            adam.update(&mut [&mut w], &[&g]);
        }
        assert!((w[[0, 0]] - 1.0).abs() < 5e-2);
    }
}
