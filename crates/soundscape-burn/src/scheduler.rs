//! Reduce-on-plateau learning-rate schedule.

/// Lowers the learning rate by `factor` once the monitored loss has failed to
/// improve for more than `patience` consecutive epochs.
///
/// An epoch improves when `loss < best * (1 - threshold)`.
#[derive(Debug, Clone)]
pub struct PlateauScheduler {
    lr: f64,
    factor: f64,
    patience: usize,
    threshold: f64,
    min_lr: f64,
    best: f64,
    bad_epochs: usize,
}

impl PlateauScheduler {
    pub const DEFAULT_THRESHOLD: f64 = 1e-4;

    pub fn new(lr: f64, factor: f64, patience: usize) -> Self {
        Self {
            lr,
            factor,
            patience,
            threshold: Self::DEFAULT_THRESHOLD,
            min_lr: 0.0,
            best: f64::INFINITY,
            bad_epochs: 0,
        }
    }

    pub fn with_min_lr(mut self, min_lr: f64) -> Self {
        self.min_lr = min_lr;
        self
    }

    pub fn lr(&self) -> f64 {
        self.lr
    }

    /// Record one epoch's loss and return the learning rate for the next.
    pub fn step(&mut self, loss: f64) -> f64 {
        if loss < self.best * (1.0 - self.threshold) {
            self.best = loss;
            self.bad_epochs = 0;
        } else {
            self.bad_epochs += 1;
        }

        if self.bad_epochs > self.patience {
            let reduced = (self.lr * self.factor).max(self.min_lr);
            if self.lr - reduced > 1e-8 {
                tracing::info!("Reducing learning rate {:.2e} -> {:.2e}", self.lr, reduced);
                self.lr = reduced;
            }
            self.bad_epochs = 0;
        }
        self.lr
    }
}
