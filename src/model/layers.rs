use ndarray::Array2;
use ndarray_rand::rand_distr::{StandardNormal, Uniform};
use ndarray_rand::RandomExt;
use rand::Rng;

pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Derivative of the sigmoid, in terms of its output
pub fn sigmoid_derivative(s: f64) -> f64 {
    s * (1.0 - s)
}

/// Derivative of tanh, in terms of its output
pub fn tanh_derivative(t: f64) -> f64 {
    1.0 - t * t
}

/// Sub-gradient of |x|
pub fn abs_derivative(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Glorot/Xavier uniform initialization for a `fan_in × fan_out` matrix
pub fn glorot_uniform<R: Rng + ?Sized>(fan_in: usize, fan_out: usize, rng: &mut R) -> Array2<f64> {
    let limit = (6.0 / (fan_in + fan_out) as f64).sqrt();
    Array2::random_using((fan_in, fan_out), Uniform::new_inclusive(-limit, limit), rng)
}

/// Orthogonal initialization for a `rows × cols` matrix with `rows <= cols`,
/// as used for recurrent kernels: the rows are orthonormal. Gram-Schmidt on
/// a Gaussian matrix, equivalent to QR with a positive `R` diagonal.
pub fn orthogonal<R: Rng + ?Sized>(rows: usize, cols: usize, rng: &mut R) -> Array2<f64> {
    let (short, long) = (rows.min(cols), rows.max(cols));
    // columns of `basis` become the orthonormal vectors
    let mut basis: Array2<f64> = Array2::random_using((long, short), StandardNormal, rng);
    for j in 0..short {
        for k in 0..j {
            let projection = basis.column(j).dot(&basis.column(k));
            let previous = basis.column(k).to_owned();
            basis.column_mut(j).scaled_add(-projection, &previous);
        }
        let norm = basis.column(j).dot(&basis.column(j)).sqrt().max(f64::EPSILON);
        basis.column_mut(j).mapv_inplace(|v| v / norm);
    }
    if rows <= cols {
        basis.reversed_axes().as_standard_layout().into_owned()
    } else {
        basis
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn activations() {
        assert_eq!(sigmoid(0.0), 0.5);
        assert!(sigmoid(40.0) > 0.999_999);
        assert_eq!(sigmoid_derivative(0.5), 0.25);
        assert_eq!(tanh_derivative(0.0), 1.0);
        assert_eq!(abs_derivative(-3.0), -1.0);
        assert_eq!(abs_derivative(0.0), 0.0);
    }

    #[test]
    fn glorot_respects_limit_and_seed() {
        let limit = (6.0 / 10.0_f64).sqrt();
        let a = glorot_uniform(6, 4, &mut StdRng::seed_from_u64(7));
        let b = glorot_uniform(6, 4, &mut StdRng::seed_from_u64(7));
        assert_eq!(a.dim(), (6, 4));
        assert!(a.iter().all(|w| w.abs() <= limit));
        assert_eq!(a, b);
    }

    #[test]
    fn orthogonal_rows_are_orthonormal() {
        let q = orthogonal(5, 20, &mut StdRng::seed_from_u64(3));
        assert_eq!(q.dim(), (5, 20));
        let gram = q.dot(&q.t());
        for ((i, j), v) in gram.indexed_iter() {
            let expected = if i == j { 1.0 } else { 0.0 };
            assert!((v - expected).abs() < 1e-10, "gram[{i}][{j}] = {v}");
        }
    }
}
