use serde::{Deserialize, Serialize};

/// Mean training loss of the sequence model after each epoch
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainingHistory {
    pub epochs: Vec<usize>,
    pub losses: Vec<f64>,
}

impl TrainingHistory {
    pub fn record(&mut self, epoch: usize, loss: f64) {
        self.epochs.push(epoch);
        self.losses.push(loss);
    }

    pub fn final_loss(&self) -> Option<f64> {
        self.losses.last().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.epochs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_losses_in_epoch_order() {
        let mut history = TrainingHistory::default();
        assert!(history.is_empty());
        assert_eq!(history.final_loss(), None);

        history.record(1, 4.0);
        history.record(2, 2.5);
        assert_eq!(history.epochs, vec![1, 2]);
        assert_eq!(history.final_loss(), Some(2.5));
    }
}
