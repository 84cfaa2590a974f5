use burn::config::Config;
use burn::module::AutodiffModule;
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::prelude::*;
use burn::tensor::ElementConversion;
use burn::tensor::backend::AutodiffBackend;
use tracing::info;

use crate::model::{LogisticRegression, LogisticRegressionConfig, ModelError};

/// Probabilities are clamped to `[EPS, 1 - EPS]` before taking logs.
const EPS: f64 = 1e-7;

#[derive(Config, Debug)]
pub struct TrainingConfig {
    /// The model configuration
    pub model_config: LogisticRegressionConfig,

    /// The Adam optimizer configuration
    pub optimizer_config: AdamConfig,

    /// The learning rate to use
    #[config(default = 1e-2)]
    pub learning_rate: f64,

    /// Full-batch gradient steps to take, total.
    #[config(default = 1000)]
    pub num_steps: usize,

    /// How often (in steps) to read the loss back and report it.
    #[config(default = 100)]
    pub log_interval: usize,
}

/// Reported every `log_interval` steps, and on the final step.
#[derive(Debug, Clone, Copy)]
pub struct TrainingStep {
    pub step: usize,
    pub loss: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvalMetrics {
    pub log_loss: f64,
    pub accuracy: f64,
    pub num_examples: usize,
}

/// Mean binary cross-entropy between predicted probabilities and 0/1 targets.
///
/// Both inputs: [B, 1]. Output: [1]
pub fn binary_cross_entropy<B: Backend>(probs: Tensor<B, 2>, targets: Tensor<B, 2>) -> Tensor<B, 1> {
    let probs = probs.clamp(EPS, 1.0 - EPS);
    let pos = targets.clone() * probs.clone().log();
    let neg = targets.neg().add_scalar(1.0) * probs.neg().add_scalar(1.0).log();
    (pos + neg).neg().mean()
}

/// Fit a fresh model on one batch with full-batch Adam.
///
/// `inputs`: [B, input_dim], `targets`: [B, 1].
pub fn train<B: AutodiffBackend>(
    config: &TrainingConfig,
    inputs: Tensor<B, 2>,
    targets: Tensor<B, 2>,
    device: &B::Device,
    mut on_step: impl FnMut(TrainingStep),
) -> LogisticRegression<B> {
    let mut model = config.model_config.init::<B>(device);
    let mut optim = config.optimizer_config.init();
    let log_interval = config.log_interval.max(1);

    for step in 0..config.num_steps {
        let probs = model.forward(inputs.clone());
        let loss = binary_cross_entropy(probs, targets.clone());

        if step % log_interval == 0 || step + 1 == config.num_steps {
            let loss: f32 = loss.clone().into_scalar().elem();
            info!("step {step:>5}: loss = {loss:.6}");
            on_step(TrainingStep { step, loss });
        }

        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &model);
        model = optim.step(config.learning_rate, model, grads);
    }
    model
}

/// Log-loss and 0.5-threshold accuracy of `model` on one batch.
pub fn evaluate<B: Backend>(
    model: &LogisticRegression<B>,
    inputs: Tensor<B, 2>,
    targets: Tensor<B, 2>,
) -> Result<EvalMetrics, ModelError> {
    let probs: Vec<f32> = model.try_forward(inputs)?.into_data().iter::<f32>().collect();
    let targets: Vec<f32> = targets.into_data().iter::<f32>().collect();

    let num_examples = probs.len();
    let mut log_loss = 0.0f64;
    let mut correct = 0usize;
    for (&p, &y) in probs.iter().zip(&targets) {
        let p = (p as f64).clamp(EPS, 1.0 - EPS);
        let y = y as f64;
        log_loss -= y * p.ln() + (1.0 - y) * (1.0 - p).ln();
        if (p >= 0.5) == (y >= 0.5) {
            correct += 1;
        }
    }

    let n = num_examples.max(1) as f64;
    Ok(EvalMetrics {
        log_loss: log_loss / n,
        accuracy: correct as f64 / n,
        num_examples,
    })
}

/// Train, then return the inference copy of the model.
pub fn fit<B: AutodiffBackend>(
    config: &TrainingConfig,
    inputs: Tensor<B, 2>,
    targets: Tensor<B, 2>,
    device: &B::Device,
    on_step: impl FnMut(TrainingStep),
) -> LogisticRegression<B::InnerBackend> {
    train(config, inputs, targets, device, on_step).valid()
}
