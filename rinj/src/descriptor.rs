// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The run descriptor: parameters, counters and timing of the current run.

use crate::client::{RouteBatch, RouteCompletion};
use crate::routeset::RouteSet;
use crate::types::{
    NexthopSpec, Phase, Prefix, RouteOutcome, RunId, RunState,
};
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::time::{Duration, Instant};

/// State of one benchmark run. A descriptor is created quiescent and then
/// overwritten by every install or remove command; it is never torn down.
///
/// Counters only move through [`RunDescriptor::apply`], which enforces that
/// they never pass the size of the route set.
#[derive(Debug, Default)]
pub struct RunDescriptor {
    id: RunId,
    state: RunState,
    routes: Option<RouteSet>,
    nexthop: Option<NexthopSpec>,
    installed: u32,
    removed: u32,
    failed: u32,
    repeat_budget: u32,
    phase_started: Option<Instant>,
    phase_started_at: Option<DateTime<Utc>>,
    last_elapsed: Option<Duration>,
}

/// What applying a completion did to the descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    /// The completion belongs to a run or phase that is no longer pending.
    Stale,
    /// The completion names a prefix outside the route set.
    Foreign,
    /// A successful completion was counted; the phase is still pending.
    Counted,
    /// A failed completion was counted; the phase is still pending.
    Failed(String),
    /// The last outstanding route of the phase completed.
    PhaseComplete {
        phase: Phase,
        elapsed: Duration,
        /// The batch for the following step of a repeated run, already
        /// marked pending in the descriptor.
        next: Option<RouteBatch>,
    },
}

impl RunDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(&self) -> RunId {
        self.id
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn routes(&self) -> Option<&RouteSet> {
        self.routes.as_ref()
    }

    pub fn installed(&self) -> u32 {
        self.installed
    }

    pub fn removed(&self) -> u32 {
        self.removed
    }

    pub fn failed(&self) -> u32 {
        self.failed
    }

    pub fn repeat_budget(&self) -> u32 {
        self.repeat_budget
    }

    fn total(&self) -> u32 {
        self.routes.as_ref().map(|r| r.count()).unwrap_or(0)
    }

    /// Reinitialize the descriptor for a new run and put its first phase in
    /// flight. Returns the batch to hand to the routing daemon.
    pub fn begin(
        &mut self,
        id: RunId,
        first: Phase,
        routes: RouteSet,
        nexthop: Option<NexthopSpec>,
        repeat_budget: u32,
    ) -> RouteBatch {
        *self = Self {
            id,
            routes: Some(routes.clone()),
            nexthop,
            repeat_budget,
            ..Default::default()
        };
        self.start_phase(first, routes)
    }

    fn start_phase(&mut self, phase: Phase, routes: RouteSet) -> RouteBatch {
        match phase {
            Phase::Install => self.installed = 0,
            Phase::Remove => self.removed = 0,
        }
        self.failed = 0;
        self.state = phase.pending();
        self.phase_started = Some(Instant::now());
        self.phase_started_at = Some(Utc::now());
        RouteBatch {
            run: self.id,
            phase,
            routes,
        }
    }

    /// Return to idle, abandoning whatever was pending. Late completions for
    /// the abandoned phase are treated as stale from here on.
    pub fn abort(&mut self) -> RunId {
        self.state = RunState::Idle;
        self.id
    }

    /// Fold one completion from the routing daemon into the descriptor.
    pub fn apply(&mut self, c: &RouteCompletion) -> Applied {
        if c.run != self.id || self.state.pending_phase() != Some(c.phase) {
            return Applied::Stale;
        }
        let in_set = self
            .routes
            .as_ref()
            .map(|r| r.contains(&c.prefix))
            .unwrap_or(false);
        if !in_set {
            return Applied::Foreign;
        }

        if let RouteOutcome::Failure(reason) = &c.outcome {
            self.failed = (self.failed + 1).min(self.total());
            return Applied::Failed(reason.clone());
        }

        let total = self.total();
        let counter = match c.phase {
            Phase::Install => &mut self.installed,
            Phase::Remove => &mut self.removed,
        };
        *counter += 1;
        if *counter < total {
            return Applied::Counted;
        }

        let elapsed = self
            .phase_started
            .map(|t| t.elapsed())
            .unwrap_or_default();
        self.last_elapsed = Some(elapsed);
        self.state = c.phase.complete();

        let mut next = None;
        if self.repeat_budget > 0 {
            self.repeat_budget -= 1;
            match (self.repeat_budget, self.routes.clone()) {
                (0, _) | (_, None) => self.state = RunState::Idle,
                (_, Some(routes)) => {
                    next = Some(self.start_phase(c.phase.opposite(), routes));
                }
            }
        }

        Applied::PhaseComplete {
            phase: c.phase,
            elapsed,
            next,
        }
    }

    pub fn report(&self) -> RunReport {
        let elapsed = self.last_elapsed.unwrap_or_default();
        RunReport {
            run: self.id,
            state: self.state,
            prefix: self.routes.as_ref().map(|r| r.start()),
            total: self.total(),
            installed: self.installed,
            removed: self.removed,
            failed: self.failed,
            instance: self.routes.as_ref().and_then(|r| r.instance()),
            nexthop: self.nexthop.clone(),
            repeat_remaining: self.repeat_budget,
            phase_started_at: self.phase_started_at,
            elapsed_secs: elapsed.as_secs(),
            elapsed_usecs: elapsed.subsec_micros(),
        }
    }
}

/// Snapshot of the run descriptor as shown to the operator.
///
/// The elapsed time is that of the most recently completed phase. It reads
/// zero until a phase has completed.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct RunReport {
    pub run: RunId,
    pub state: RunState,
    /// First prefix of the run.
    pub prefix: Option<Prefix>,
    pub total: u32,
    pub installed: u32,
    pub removed: u32,
    pub failed: u32,
    pub instance: Option<u8>,
    /// Absent for standalone removal runs.
    pub nexthop: Option<NexthopSpec>,
    /// Install and remove steps left in a repeated run.
    pub repeat_remaining: u32,
    /// Wall clock start of the current phase.
    pub phase_started_at: Option<DateTime<Utc>>,
    pub elapsed_secs: u64,
    pub elapsed_usecs: u32,
}

impl RunReport {
    pub fn elapsed(&self) -> Duration {
        Duration::from_secs(self.elapsed_secs)
            + Duration::from_micros(u64::from(self.elapsed_usecs))
    }
}

impl Display for RunReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.prefix {
            Some(p) => write!(f, "Prefix: {p}")?,
            None => write!(f, "Prefix: none")?,
        }
        write!(
            f,
            " Total: {} {} {} Time: {}.{:06}",
            self.total,
            self.installed,
            self.removed,
            self.elapsed_secs,
            self.elapsed_usecs,
        )
    }
}
