//! Publish cadence control
//!
//! The interval between ticks is owned by the parameter store, not the
//! binary, so an operator can slow a misbehaving fleet down without a
//! redeploy. The fetch is best effort: any failure falls back to the
//! configured default and must never abort the loop.

use crate::sources::ParameterStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

pub struct CadenceController {
    store: Arc<dyn ParameterStore>,
    parameter: String,
    fallback_secs: u64,
}

impl CadenceController {
    pub fn new(
        store: Arc<dyn ParameterStore>,
        parameter: impl Into<String>,
        fallback_secs: u64,
    ) -> Self {
        Self {
            store,
            parameter: parameter.into(),
            fallback_secs,
        }
    }

    /// Current publish interval in seconds, re-read from the parameter store.
    pub async fn current_interval(&self) -> u64 {
        match self.store.get_parameter(&self.parameter).await {
            Ok(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) => secs,
                Err(_) => {
                    warn!(
                        parameter = %self.parameter,
                        value = %raw,
                        fallback = self.fallback_secs,
                        "publish interval not an integer, using fallback"
                    );
                    self.fallback_secs
                }
            },
            Err(e) => {
                warn!(
                    parameter = %self.parameter,
                    error = %e,
                    fallback = self.fallback_secs,
                    "publish interval fetch failed, using fallback"
                );
                self.fallback_secs
            }
        }
    }

    /// Convenience wrapper for sleeping callers.
    pub async fn current_interval_duration(&self) -> Duration {
        Duration::from_secs(self.current_interval().await)
    }
}
