//! Legacy and New halves of one step, run side by side

use crate::activity::{Activity, SharedActivity};
use crate::outcome::Outcome;
use tracing::info;

/// Runs a Legacy activity and its New counterpart concurrently
pub struct ParallelActivity {
    name: String,
    legacy: SharedActivity,
    new: SharedActivity,
}

impl ParallelActivity {
    /// Pair two activities under `name`
    #[must_use]
    pub fn new(name: impl Into<String>, legacy: SharedActivity, new: SharedActivity) -> Self {
        Self {
            name: name.into(),
            legacy,
            new,
        }
    }

    /// Legacy half
    #[must_use]
    pub fn legacy(&self) -> &SharedActivity {
        &self.legacy
    }

    /// New half
    #[must_use]
    pub fn new_side(&self) -> &SharedActivity {
        &self.new
    }
}

#[async_trait::async_trait]
impl Activity for ParallelActivity {
    fn name(&self) -> &str {
        &self.name
    }

    fn uses_new_system(&self) -> bool {
        self.legacy.uses_new_system() || self.new.uses_new_system()
    }

    /// Both children always run to completion, even when one fails early
    async fn execute(&self) -> Outcome {
        let (legacy, new) = tokio::join!(self.legacy.execute(), self.new.execute());
        info!(
            activity = %self.name,
            legacy = %legacy.status,
            new = %new.status,
            "parallel pair finished"
        );
        let mut merged = legacy.merge(new);
        merged.activity_name.clone_from(&self.name);
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::Status;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    struct Fixed {
        name: &'static str,
        outcome: Outcome,
        delay: Duration,
        finished: AtomicBool,
    }

    impl Fixed {
        fn new(name: &'static str, outcome: Outcome, delay_ms: u64) -> Arc<Self> {
            Arc::new(Self {
                name,
                outcome,
                delay: Duration::from_millis(delay_ms),
                finished: AtomicBool::new(false),
            })
        }
    }

    #[async_trait::async_trait]
    impl Activity for Fixed {
        fn name(&self) -> &str {
            self.name
        }

        async fn execute(&self) -> Outcome {
            tokio::time::sleep(self.delay).await;
            self.finished.store(true, Ordering::SeqCst);
            self.outcome.clone()
        }
    }

    #[tokio::test]
    async fn error_on_one_side_still_awaits_the_other() {
        let legacy = Fixed::new("R20", Outcome::error("R20", "ProfitForfeit", "exit status 8"), 0);
        let new = Fixed::new("S20", Outcome::ok("S20", "ProfitForfeit", "Records Loaded = 12"), 50);
        let pair = ParallelActivity::new("P20", legacy.clone(), new.clone());

        let outcome = pair.execute().await;
        assert!(new.finished.load(Ordering::SeqCst));
        assert_eq!(outcome.activity_name, "P20");
        assert_eq!(outcome.status, Status::Error);
        assert!(outcome.message.contains("[legacy] exit status 8"));
        assert!(outcome.message.contains("[new] Records Loaded = 12"));
    }

    #[tokio::test]
    async fn children_run_concurrently() {
        let legacy = Fixed::new("R11", Outcome::ok("R11", "x", ""), 200);
        let new = Fixed::new("S11", Outcome::ok("S11", "x", ""), 200);
        let pair = ParallelActivity::new("P11", legacy, new);

        let started = std::time::Instant::now();
        let outcome = pair.execute().await;
        assert_eq!(outcome.status, Status::Ok);
        assert!(started.elapsed() < Duration::from_millis(390));
    }
}
