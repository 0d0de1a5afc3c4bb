use convo_core::enhanced::EnhancedStage;
use serde::Serialize;
use tokio::sync::watch;

/// What the progress indicator currently shows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProgressState {
    /// Stages reached so far, in order.
    pub steps: Vec<EnhancedStage>,
    pub current: Option<EnhancedStage>,
    pub is_processing: bool,
}

/// Decorative stage indicator for enhanced processing.
///
/// Backed by a `watch` channel so front-ends can render stages as they are
/// reached. Nothing here influences the request itself.
#[derive(Debug)]
pub struct ProgressIndicator {
    tx: watch::Sender<ProgressState>,
}

impl Default for ProgressIndicator {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressIndicator {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ProgressState::default());
        Self { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<ProgressState> {
        self.tx.subscribe()
    }

    pub fn state(&self) -> ProgressState {
        self.tx.borrow().clone()
    }

    /// Starts a new cycle at `Initializing`, dropping the previous steps.
    pub fn start(&self) {
        self.tx.send_replace(ProgressState {
            steps: vec![EnhancedStage::Initializing],
            current: Some(EnhancedStage::Initializing),
            is_processing: true,
        });
    }

    pub fn advance(&self, stage: EnhancedStage) {
        self.tx.send_modify(|state| {
            state.steps.push(stage);
            state.current = Some(stage);
        });
    }

    /// Ends the cycle. Steps stay visible until the next `start` or `clear`.
    pub fn finish(&self) {
        self.tx.send_modify(|state| {
            state.is_processing = false;
        });
    }

    pub fn clear(&self) {
        self.tx.send_replace(ProgressState::default());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_resets_previous_cycle() {
        let progress = ProgressIndicator::new();
        progress.start();
        progress.advance(EnhancedStage::SearchingFiles);
        progress.finish();

        progress.start();
        let state = progress.state();
        assert_eq!(state.steps, vec![EnhancedStage::Initializing]);
        assert!(state.is_processing);
    }

    #[test]
    fn finish_keeps_steps() {
        let progress = ProgressIndicator::new();
        progress.start();
        progress.advance(EnhancedStage::Completed);
        progress.finish();

        let state = progress.state();
        assert!(!state.is_processing);
        assert_eq!(state.current, Some(EnhancedStage::Completed));
        assert_eq!(state.steps.len(), 2);

        progress.clear();
        assert_eq!(progress.state(), ProgressState::default());
    }

    #[tokio::test]
    async fn subscribers_see_updates() {
        let progress = ProgressIndicator::new();
        let mut rx = progress.subscribe();
        progress.start();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().current, Some(EnhancedStage::Initializing));
    }
}
