//! Waiting for provisioned hosts to accept remote logins.
//!
//! One probe task is spawned per instance; a semaphore caps how many run at
//! once. Every task is joined before [`ReadinessWaiter::wait_all`] returns, and
//! each instance ends up with its own [`Readiness`] outcome.

mod probe;

pub use probe::{DEFAULT_SSH_PORT, Probe, SshProbe};

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;

use crate::config::DEFAULT_MAX_CONCURRENT_PROBES;
use crate::instance::Instances;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    Reachable { elapsed: Duration },
    TimedOut { elapsed: Duration },
    /// The probe task itself died (panic or abort).
    Failed { reason: String },
}

impl Readiness {
    pub fn is_reachable(&self) -> bool {
        matches!(self, Readiness::Reachable { .. })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadinessReport {
    pub outcomes: BTreeMap<String, Readiness>,
}

impl ReadinessReport {
    pub fn all_reachable(&self) -> bool {
        self.outcomes.values().all(Readiness::is_reachable)
    }

    /// Addresses whose probe did not succeed, in address order.
    pub fn unreachable(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| !outcome.is_reachable())
            .map(|(address, _)| address.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

pub struct ReadinessWaiter {
    probe: Arc<dyn Probe>,
    max_concurrent: usize,
}

impl ReadinessWaiter {
    pub fn new(probe: Arc<dyn Probe>) -> Self {
        Self {
            probe,
            max_concurrent: DEFAULT_MAX_CONCURRENT_PROBES,
        }
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    /// Probes every instance and blocks until all probes have resolved.
    pub async fn wait_all(
        &self,
        instances: &Instances,
        per_host_timeout: Duration,
    ) -> ReadinessReport {
        tracing::info!(
            count = instances.len(),
            timeout_secs = per_host_timeout.as_secs(),
            "waiting for ssh on provisioned instances"
        );

        let permits = Arc::new(Semaphore::new(self.max_concurrent));
        let mut tasks = JoinSet::new();
        let mut task_addresses = HashMap::new();

        for (address, instance) in instances {
            let probe = Arc::clone(&self.probe);
            let permits = Arc::clone(&permits);
            let host = instance.probe_host().to_string();
            let task_address = address.clone();

            let handle = tasks.spawn(async move {
                let _permit = permits.acquire_owned().await.ok();
                let started = Instant::now();

                // Also bounds probes that overrun their own deadline.
                let reachable =
                    tokio::time::timeout(per_host_timeout, probe.probe(&host, per_host_timeout))
                        .await
                        .unwrap_or(false);

                let elapsed = started.elapsed();
                let outcome = if reachable {
                    tracing::info!(address = %task_address, host = %host, ?elapsed, "instance reachable");
                    Readiness::Reachable { elapsed }
                } else {
                    tracing::warn!(address = %task_address, host = %host, ?elapsed, "instance never became reachable");
                    Readiness::TimedOut { elapsed }
                };
                (task_address, outcome)
            });
            task_addresses.insert(handle.id(), address.clone());
        }

        let mut report = ReadinessReport::default();
        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((_, (address, outcome))) => {
                    report.outcomes.insert(address, outcome);
                }
                Err(err) => {
                    if let Some(address) = task_addresses.remove(&err.id()) {
                        tracing::error!(address = %address, error = %err, "readiness probe task failed");
                        report.outcomes.insert(
                            address,
                            Readiness::Failed {
                                reason: err.to_string(),
                            },
                        );
                    }
                }
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_unreachable_lists_failures_in_order() {
        let mut report = ReadinessReport::default();
        report.outcomes.insert(
            "b".to_string(),
            Readiness::TimedOut {
                elapsed: Duration::from_secs(120),
            },
        );
        report.outcomes.insert(
            "a".to_string(),
            Readiness::Reachable {
                elapsed: Duration::from_secs(3),
            },
        );
        report.outcomes.insert(
            "c".to_string(),
            Readiness::Failed {
                reason: "panicked".to_string(),
            },
        );

        assert!(!report.all_reachable());
        assert_eq!(report.unreachable(), vec!["b".to_string(), "c".to_string()]);
        assert_eq!(report.len(), 3);
    }

    #[test]
    fn test_empty_report_is_all_reachable() {
        let report = ReadinessReport::default();
        assert!(report.is_empty());
        assert!(report.all_reachable());
        assert!(report.unreachable().is_empty());
    }
}
