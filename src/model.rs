use burn::{
    nn::{Linear, LinearConfig},
    prelude::*,
    tensor::activation::sigmoid,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("input has {actual} features, model expects {expected}")]
    ShapeMismatch { expected: usize, actual: usize },
}

#[derive(Config, Debug)]
pub struct LogisticRegressionConfig {
    /// Width of the dense feature vector fed to the model
    pub input_dim: usize,
}

impl LogisticRegressionConfig {
    /// Returns an initialized model with the given configuration.
    pub fn init<B: Backend>(&self, device: &B::Device) -> LogisticRegression<B> {
        LogisticRegression {
            fc1: LinearConfig::new(self.input_dim, 1).init(device),
        }
    }
}

/// Single affine layer followed by a sigmoid: `p = σ(x·W + b)`.
#[derive(Module, Debug)]
pub struct LogisticRegression<B: Backend> {
    fc1: Linear<B>, // [input_dim, 1] + bias
}

impl<B: Backend> LogisticRegression<B> {
    pub fn input_dim(&self) -> usize {
        self.fc1.weight.val().dims()[0]
    }

    // Input x: [B, input_dim]
    // Output:  [B, 1], each value in (0, 1)
    pub fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        sigmoid(self.fc1.forward(x))
    }

    /// Like [`LogisticRegression::forward`], but reports a width mismatch as an
    /// error instead of leaving it to the backend.
    pub fn try_forward(&self, x: Tensor<B, 2>) -> Result<Tensor<B, 2>, ModelError> {
        let expected = self.input_dim();
        let actual = x.dims()[1];
        if actual != expected {
            return Err(ModelError::ShapeMismatch { expected, actual });
        }
        Ok(self.forward(x))
    }
}
