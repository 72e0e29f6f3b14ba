// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The run controller drives a run through its phases.
//!
//! ```text
//!            install               last install ack
//!   Idle ---------------> InstallPending ---------------> InstallComplete
//!    |                        ^      |                          (repeat)
//!    | remove                 |      | last install ack, budget left
//!    v                        |      v
//!   RemovePending <-----------+-- RemovePending ----> RemoveComplete
//!                   last remove ack,      last remove ack, no repeat
//!                   budget left
//! ```
//!
//! Commands validate everything up front, overwrite the run descriptor and
//! hand a batch to the routing daemon. Per route completions come back over
//! a channel and are folded into the descriptor by a single worker thread,
//! which also issues the next batch of a repeated run.

use crate::api::{InstallRequest, RemoveRequest};
use crate::client::{CompletionSink, RouteBatch, RouteCompletion, RoutingClient};
use crate::descriptor::{Applied, RunDescriptor, RunReport};
use crate::error::Error;
use crate::log::ctl_log;
use crate::routeset::{resolve_nexthops, RouteSet};
use crate::types::{Phase, RunId, RunState};
use rinj_common::lock;
use rinj_common::thread::{ManagedThread, WORKER_POLL_INTERVAL};
use slog::Logger;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};

pub struct RunController {
    inner: Arc<Inner>,
    _worker: ManagedThread,
}

struct Inner {
    session: Mutex<RunDescriptor>,
    client: Arc<dyn RoutingClient>,
    completions: Sender<RouteCompletion>,
    log: Logger,
}

impl RunController {
    /// Create a controller in the idle state and start its completion
    /// worker.
    pub fn new(
        client: Arc<dyn RoutingClient>,
        log: Logger,
    ) -> Result<Self, Error> {
        let (tx, rx) = channel();
        let inner = Arc::new(Inner {
            session: Mutex::new(RunDescriptor::new()),
            client,
            completions: tx,
            log,
        });
        let worker_inner = inner.clone();
        let worker = ManagedThread::spawn("run-controller", move |stop| {
            worker_inner.run(rx, stop)
        })?;
        Ok(Self {
            inner,
            _worker: worker,
        })
    }

    /// Start an install run. Any run in flight is overwritten; its late
    /// completions are ignored.
    pub fn install(&self, req: &InstallRequest) -> Result<RunId, Error> {
        let spec = req.nexthop_spec()?;
        let budget = req.repeat_budget()?;
        let nexthops = resolve_nexthops(&spec, self.inner.client.as_ref())?;
        let routes =
            RouteSet::new(req.start, req.count, Some(nexthops), req.instance)?;

        let batch = {
            let mut session = lock!(self.inner.session);
            let id = session.id().next();
            session.begin(id, Phase::Install, routes, Some(spec), budget)
        };
        ctl_log!(self.inner.log, info, "starting install run";
            "run" => batch.run.0,
            "start" => batch.routes.start().to_string(),
            "count" => batch.routes.count(),
            "repeat_budget" => budget
        );
        let run = batch.run;
        self.inner.issue(batch)?;
        Ok(run)
    }

    /// Start a standalone removal run.
    pub fn remove(&self, req: &RemoveRequest) -> Result<RunId, Error> {
        let routes = RouteSet::new(req.start, req.count, None, req.instance)?;

        let batch = {
            let mut session = lock!(self.inner.session);
            let id = session.id().next();
            session.begin(id, Phase::Remove, routes, None, 0)
        };
        ctl_log!(self.inner.log, info, "starting remove run";
            "run" => batch.run.0,
            "start" => batch.routes.start().to_string(),
            "count" => batch.routes.count()
        );
        let run = batch.run;
        self.inner.issue(batch)?;
        Ok(run)
    }

    /// Abandon the run in flight, if any. Routes already programmed stay
    /// programmed.
    pub fn cancel(&self) -> Option<RunId> {
        let mut session = lock!(self.inner.session);
        if session.state().pending_phase().is_none() {
            return None;
        }
        let run = session.abort();
        ctl_log!(self.inner.log, info, "cancelled run";
            "run" => run.0,
            "installed" => session.installed(),
            "removed" => session.removed()
        );
        Some(run)
    }

    pub fn status(&self) -> RunReport {
        lock!(self.inner.session).report()
    }

    pub fn state(&self) -> RunState {
        lock!(self.inner.session).state()
    }
}

impl Inner {
    /// Hand a batch to the routing daemon. If the daemon refuses it the run
    /// is abandoned. A batch whose run or phase is no longer pending is
    /// dropped instead, so a repeat step of an overwritten run never reaches
    /// the daemon.
    fn issue(&self, batch: RouteBatch) -> Result<(), Error> {
        let run = batch.run;
        let phase = batch.phase;

        // Held across the hand-off so no other run can start in between.
        // Clients must not block, so this is short.
        let mut session = lock!(self.session);
        if session.id() != run || session.state().pending_phase() != Some(phase)
        {
            ctl_log!(self.log, debug, "dropping superseded {} batch", phase;
                "run" => run.0,
                "current" => session.id().0
            );
            return Ok(());
        }

        let sink = CompletionSink::new(run, phase, self.completions.clone());
        let result = match phase {
            Phase::Install => self.client.install_route_batch(batch, sink),
            Phase::Remove => self.client.remove_route_batch(batch, sink),
        };
        if let Err(e) = &result {
            session.abort();
            ctl_log!(self.log, error, "routing daemon refused {} batch: {}", phase, e;
                "run" => run.0
            );
        }
        result
    }

    fn run(&self, rx: Receiver<RouteCompletion>, stop: Arc<AtomicBool>) {
        loop {
            if stop.load(Ordering::Relaxed) {
                break;
            }
            match rx.recv_timeout(WORKER_POLL_INTERVAL) {
                Ok(c) => self.handle(c),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        ctl_log!(self.log, debug, "completion worker exiting");
    }

    fn handle(&self, c: RouteCompletion) {
        let applied = lock!(self.session).apply(&c);
        match applied {
            Applied::Counted => {}
            Applied::Stale => {
                ctl_log!(self.log, debug, "dropping stale completion";
                    "run" => c.run.0,
                    "phase" => c.phase.to_string(),
                    "prefix" => c.prefix.to_string()
                );
            }
            Applied::Foreign => {
                ctl_log!(self.log, warn, "completion for prefix outside the run";
                    "run" => c.run.0,
                    "prefix" => c.prefix.to_string()
                );
            }
            Applied::Failed(reason) => {
                ctl_log!(self.log, warn, "route {} failed: {}", c.phase, reason;
                    "run" => c.run.0,
                    "prefix" => c.prefix.to_string()
                );
            }
            Applied::PhaseComplete {
                phase,
                elapsed,
                next,
            } => {
                ctl_log!(self.log, info, "{} phase complete", phase;
                    "run" => c.run.0,
                    "elapsed_us" => elapsed.as_micros() as u64
                );
                if let Some(batch) = next {
                    ctl_log!(self.log, info, "repeating with {} phase", batch.phase;
                        "run" => batch.run.0
                    );
                    // failure is logged and the run abandoned by issue
                    let _ = self.issue(batch);
                }
            }
        }
    }
}
