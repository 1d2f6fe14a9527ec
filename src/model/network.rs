use ndarray::{s, Array1, Array2, Array3, ArrayView2, Axis};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::layers::{
    abs_derivative, glorot_uniform, orthogonal, sigmoid, sigmoid_derivative, tanh_derivative,
};
use crate::model::optimizer::Adam;

/// Single LSTM layer followed by a dense layer with one output.
///
/// Gate blocks in `kernel`, `recurrent` and `bias` are laid out as
/// input | forget | cell | output, each `hidden_size` wide.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LstmNetwork {
    pub input_size: usize,
    pub hidden_size: usize,
    pub sequence_length: usize,
    pub kernel: Array2<f64>,
    pub recurrent: Array2<f64>,
    pub bias: Array2<f64>,
    pub dense_weights: Array2<f64>,
    pub dense_bias: Array2<f64>,
}

/// Activations of one timestep kept for backpropagation
struct StepCache {
    x: Array2<f64>,
    h_prev: Array2<f64>,
    c_prev: Array2<f64>,
    input: Array2<f64>,
    forget: Array2<f64>,
    cell: Array2<f64>,
    output: Array2<f64>,
    tanh_c: Array2<f64>,
}

struct Gradients {
    kernel: Array2<f64>,
    recurrent: Array2<f64>,
    bias: Array2<f64>,
    dense_weights: Array2<f64>,
    dense_bias: Array2<f64>,
}

impl LstmNetwork {
    pub fn new<R: Rng + ?Sized>(
        input_size: usize,
        hidden_size: usize,
        sequence_length: usize,
        rng: &mut R,
    ) -> Self {
        let gates = 4 * hidden_size;
        let mut bias = Array2::zeros((1, gates));
        // unit forget bias
        bias.slice_mut(s![.., hidden_size..2 * hidden_size]).fill(1.0);

        LstmNetwork {
            input_size,
            hidden_size,
            sequence_length: sequence_length.max(1),
            kernel: glorot_uniform(input_size, gates, rng),
            recurrent: orthogonal(hidden_size, gates, rng),
            bias,
            dense_weights: glorot_uniform(hidden_size, 1, rng),
            dense_bias: Array2::zeros((1, 1)),
        }
    }

    fn check_input(&self, x: &Array3<f64>) -> Result<()> {
        let (_, steps, features) = x.dim();
        if steps != self.sequence_length || features != self.input_size {
            return Err(Error::InvalidInput(format!(
                "network expects [samples, {}, {}], got {:?}",
                self.sequence_length,
                self.input_size,
                x.shape()
            )));
        }
        Ok(())
    }

    fn forward_cached(&self, x: &Array3<f64>) -> (Array2<f64>, Array2<f64>, Vec<StepCache>) {
        let (batch, steps, _) = x.dim();
        let hs = self.hidden_size;
        let mut h = Array2::zeros((batch, hs));
        let mut c = Array2::zeros((batch, hs));
        let mut caches = Vec::with_capacity(steps);

        for t in 0..steps {
            let x_t = x.index_axis(Axis(1), t).to_owned();
            let z = x_t.dot(&self.kernel) + h.dot(&self.recurrent) + &self.bias;

            let input = z.slice(s![.., 0..hs]).mapv(sigmoid);
            let forget = z.slice(s![.., hs..2 * hs]).mapv(sigmoid);
            let cell = z.slice(s![.., 2 * hs..3 * hs]).mapv(f64::tanh);
            let output = z.slice(s![.., 3 * hs..]).mapv(sigmoid);

            let c_next = &forget * &c + &input * &cell;
            let tanh_c = c_next.mapv(f64::tanh);
            let h_next = &output * &tanh_c;

            caches.push(StepCache {
                x: x_t,
                h_prev: std::mem::replace(&mut h, h_next),
                c_prev: std::mem::replace(&mut c, c_next),
                input,
                forget,
                cell,
                output,
                tanh_c,
            });
        }

        let y = h.dot(&self.dense_weights) + &self.dense_bias;
        (y, h, caches)
    }

    /// One forecast per input window.
    pub fn forward(&self, x: &Array3<f64>) -> Result<Array1<f64>> {
        self.check_input(x)?;
        let (y, _, _) = self.forward_cached(x);
        Ok(y.column(0).to_owned())
    }

    /// Mean absolute error of the current weights on `(x, y)`
    pub fn loss(&self, x: &Array3<f64>, y: &Array1<f64>) -> Result<f64> {
        let pred = self.forward(x)?;
        Ok((&pred - y).mapv(f64::abs).mean().unwrap_or(0.0))
    }

    fn backward(&self, x: &Array3<f64>, y: &Array1<f64>) -> (f64, Gradients) {
        let batch = x.dim().0;
        let hs = self.hidden_size;
        let (pred, h_last, caches) = self.forward_cached(x);

        let diff = &pred.column(0) - y;
        let loss = diff.mapv(f64::abs).mean().unwrap_or(0.0);
        let d_pred = diff
            .mapv(|d| abs_derivative(d) / batch as f64)
            .insert_axis(Axis(1));

        let mut grads = Gradients {
            kernel: Array2::zeros(self.kernel.raw_dim()),
            recurrent: Array2::zeros(self.recurrent.raw_dim()),
            bias: Array2::zeros(self.bias.raw_dim()),
            dense_weights: h_last.t().dot(&d_pred),
            dense_bias: d_pred.sum_axis(Axis(0)).insert_axis(Axis(0)),
        };

        let mut dh = d_pred.dot(&self.dense_weights.t());
        let mut dc = Array2::<f64>::zeros((batch, hs));
        let mut dz = Array2::<f64>::zeros((batch, 4 * hs));

        for step in caches.iter().rev() {
            let d_output = &dh * &step.tanh_c;
            dc = dc + &dh * &step.output * &step.tanh_c.mapv(tanh_derivative);

            let d_input = &dc * &step.cell;
            let d_cell = &dc * &step.input;
            let d_forget = &dc * &step.c_prev;

            dz.slice_mut(s![.., 0..hs])
                .assign(&(d_input * &step.input.mapv(sigmoid_derivative)));
            dz.slice_mut(s![.., hs..2 * hs])
                .assign(&(d_forget * &step.forget.mapv(sigmoid_derivative)));
            dz.slice_mut(s![.., 2 * hs..3 * hs])
                .assign(&(d_cell * &step.cell.mapv(tanh_derivative)));
            dz.slice_mut(s![.., 3 * hs..])
                .assign(&(d_output * &step.output.mapv(sigmoid_derivative)));

            grads.kernel += &step.x.t().dot(&dz);
            grads.recurrent += &step.h_prev.t().dot(&dz);
            grads.bias += &dz.sum_axis(Axis(0)).insert_axis(Axis(0));

            dh = dz.dot(&self.recurrent.t());
            dc = &dc * &step.forget;
        }

        (loss, grads)
    }

    /// Backpropagates one batch through time and applies an Adam step.
    /// Returns the batch loss before the update.
    pub fn train_batch(&mut self, x: &Array3<f64>, y: &Array1<f64>, optimizer: &mut Adam) -> Result<f64> {
        self.check_input(x)?;
        if x.dim().0 != y.len() {
            return Err(Error::InvalidInput(format!(
                "{} windows but {} targets",
                x.dim().0,
                y.len()
            )));
        }
        let (loss, grads) = self.backward(x, y);
        optimizer.update(
            &mut [
                &mut self.kernel,
                &mut self.recurrent,
                &mut self.bias,
                &mut self.dense_weights,
                &mut self.dense_bias,
            ],
            &[
                &grads.kernel,
                &grads.recurrent,
                &grads.bias,
                &grads.dense_weights,
                &grads.dense_bias,
            ],
        );
        Ok(loss)
    }
}

/// Stacks `sequence_length` consecutive rows into one window per position:
/// `[rows - sequence_length + 1, sequence_length, features]`.
pub fn to_sequences(x: ArrayView2<f64>, sequence_length: usize) -> Result<Array3<f64>> {
    let (rows, features) = x.dim();
    let steps = sequence_length.max(1);
    if rows < steps {
        return Err(Error::InsufficientData(format!(
            "{rows} rows cannot form a window of {steps}"
        )));
    }
    let windows = rows - steps + 1;
    Ok(Array3::from_shape_fn((windows, steps, features), |(w, t, f)| {
        x[[w + t, f]]
    }))
}
