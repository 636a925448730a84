//! Drives `fire` across every active network, in configured order, for the life of the
//! process. After a pass that issued something the loop only yields to the runtime. A pass
//! that issued nothing parks until an in-flight slot frees up or the soonest rate gate opens.

use crate::dispatch::{FireOutcome, NetworkDispatcher};
use crate::transport::SubmissionTransport;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time::Instant;

/// Minimum spacing between fires on one network. `None` means unbounded.
#[derive(Debug, Clone, Copy)]
pub struct RateGate {
    min_interval: Option<Duration>,
    next_at: Option<Instant>,
}

impl RateGate {
    pub fn per_second(max_fires_per_sec: u32) -> Self {
        let min_interval = (max_fires_per_sec > 0)
            .then(|| Duration::from_secs(1) / max_fires_per_sec);
        Self {
            min_interval,
            next_at: None,
        }
    }

    pub fn unbounded() -> Self {
        Self::per_second(0)
    }

    /// Consumes a slot if one is open at `now`.
    pub fn try_pass(&mut self, now: Instant) -> bool {
        let Some(interval) = self.min_interval else {
            return true;
        };
        match self.next_at {
            Some(at) if now < at => false,
            _ => {
                self.next_at = Some(now + interval);
                true
            }
        }
    }

    pub fn opens_at(&self) -> Option<Instant> {
        self.next_at
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerReport {
    pub iterations: u64,
    pub issued: u64,
    pub saturated: u64,
    pub inactive: u64,
}

impl SchedulerReport {
    fn tally(&mut self, outcome: FireOutcome) {
        match outcome {
            FireOutcome::Issued { .. } => self.issued += 1,
            FireOutcome::Saturated => self.saturated += 1,
            FireOutcome::Inactive => self.inactive += 1,
        }
    }
}

pub struct Scheduler<T> {
    networks: Vec<Arc<NetworkDispatcher<T>>>,
    gates: Vec<RateGate>,
}

impl<T: SubmissionTransport> Scheduler<T> {
    pub fn new(networks: Vec<Arc<NetworkDispatcher<T>>>) -> Self {
        let gates = networks
            .iter()
            .map(|n| RateGate::per_second(n.profile().max_fires_per_sec))
            .collect();
        Self { networks, gates }
    }

    pub fn networks(&self) -> &[Arc<NetworkDispatcher<T>>] {
        &self.networks
    }

    /// One pass over the networks, in configured order. Inactive or rate-gated networks are
    /// skipped. A network already at its in-flight cap is listed as `Saturated` without
    /// calling `fire` or consuming its rate slot, and is not tallied.
    pub async fn run_once(
        &mut self,
        report: &mut SchedulerReport,
    ) -> Vec<(usize, FireOutcome)> {
        let now = Instant::now();
        let mut fired = Vec::with_capacity(self.networks.len());
        let networks = self.networks.iter().zip(self.gates.iter_mut());
        for (index, (dispatcher, gate)) in networks.enumerate() {
            if !dispatcher.is_active() {
                continue;
            }
            if !dispatcher.has_capacity() {
                fired.push((index, FireOutcome::Saturated));
                continue;
            }
            if !gate.try_pass(now) {
                continue;
            }
            let outcome = dispatcher.fire().await;
            report.tally(outcome);
            fired.push((index, outcome));
        }
        report.iterations += 1;
        fired
    }

    fn soonest_gate(&self) -> Option<Instant> {
        self.networks
            .iter()
            .zip(self.gates.iter())
            .filter(|(d, _)| d.is_active())
            .filter_map(|(_, g)| g.opens_at())
            .min()
    }

    /// Parks until a saturated network frees a slot, a rate gate opens, or shutdown.
    /// Returns false once the shutdown sender is gone.
    async fn idle(&self, saturated: &[usize], shutdown: &mut watch::Receiver<bool>) -> bool {
        let mut capacity = JoinSet::new();
        for &index in saturated {
            let dispatcher = self.networks[index].clone();
            capacity.spawn(async move { dispatcher.wait_for_capacity().await });
        }
        let gate = self.soonest_gate();
        let gate_open = async move {
            match gate {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::select! {
            Some(_) = capacity.join_next() => true,
            _ = gate_open => true,
            changed = shutdown.changed() => changed.is_ok(),
        }
    }

    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> SchedulerReport {
        let mut report = SchedulerReport::default();
        let active = self.networks.iter().filter(|n| n.is_active()).count();
        if active == 0 {
            tracing::error!("[SCHED] no active networks; idling until shutdown");
            while !*shutdown.borrow() {
                if shutdown.changed().await.is_err() {
                    break;
                }
            }
            return report;
        }
        tracing::info!(
            "[SCHED] dispatch loop started: {}/{} network(s) active",
            active,
            self.networks.len()
        );

        while !*shutdown.borrow() {
            let fired = self.run_once(&mut report).await;
            if fired
                .iter()
                .any(|(_, outcome)| matches!(outcome, FireOutcome::Issued { .. }))
            {
                tokio::task::yield_now().await;
                continue;
            }
            let saturated: Vec<usize> = fired
                .iter()
                .filter(|(_, outcome)| *outcome == FireOutcome::Saturated)
                .map(|(index, _)| *index)
                .collect();
            if saturated.is_empty() && self.soonest_gate().is_none() {
                tokio::task::yield_now().await;
                continue;
            }
            if !self.idle(&saturated, &mut shutdown).await {
                break;
            }
        }

        tracing::info!(
            "[SCHED] dispatch loop stopped after {} iteration(s): issued={} saturated={}",
            report.iterations,
            report.issued,
            report.saturated
        );
        report
    }
}
