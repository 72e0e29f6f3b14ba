// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The interface between the harness and the routing daemon it drives.
//!
//! Route programming and next hop tracking are asynchronous. Requests return
//! as soon as they have been handed off, and results come back through the
//! sinks passed along with each request.

use crate::error::Error;
use crate::routeset::RouteSet;
use crate::types::{
    AddressFamily, NexthopGroup, NexthopStatus, Phase, Prefix, RouteOutcome,
    RunId, VrfId,
};
use std::sync::mpsc::Sender;

/// A batch of routes to install or remove on behalf of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteBatch {
    pub run: RunId,
    pub phase: Phase,
    pub routes: RouteSet,
}

/// Per route result of a batch, tagged with the run and phase that asked for
/// it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteCompletion {
    pub run: RunId,
    pub phase: Phase,
    pub prefix: Prefix,
    pub outcome: RouteOutcome,
}

/// Where a routing daemon delivers the per route results for a batch.
#[derive(Debug, Clone)]
pub struct CompletionSink {
    run: RunId,
    phase: Phase,
    tx: Sender<RouteCompletion>,
}

impl CompletionSink {
    pub(crate) fn new(
        run: RunId,
        phase: Phase,
        tx: Sender<RouteCompletion>,
    ) -> Self {
        Self { run, phase, tx }
    }

    /// Report the result for one route. Returns false if the controller is
    /// no longer listening.
    pub fn complete(&self, prefix: Prefix, outcome: RouteOutcome) -> bool {
        self.tx
            .send(RouteCompletion {
                run: self.run,
                phase: self.phase,
                prefix,
                outcome,
            })
            .is_ok()
    }

    pub fn success(&self, prefix: Prefix) -> bool {
        self.complete(prefix, RouteOutcome::Success)
    }

    pub fn failure(&self, prefix: Prefix, reason: impl Into<String>) -> bool {
        self.complete(prefix, RouteOutcome::Failure(reason.into()))
    }
}

/// A change in reachability of a watched next hop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NexthopUpdate {
    pub prefix: Prefix,
    pub status: NexthopStatus,
}

/// Where a routing daemon delivers next hop tracking updates.
#[derive(Debug, Clone)]
pub struct NexthopSink {
    tx: Sender<NexthopUpdate>,
}

impl NexthopSink {
    pub(crate) fn new(tx: Sender<NexthopUpdate>) -> Self {
        Self { tx }
    }

    /// Report a new status for `prefix`. Returns false if the registry is no
    /// longer listening.
    pub fn notify(&self, prefix: Prefix, status: NexthopStatus) -> bool {
        self.tx.send(NexthopUpdate { prefix, status }).is_ok()
    }
}

/// Operations the harness needs from the routing daemon.
///
/// Implementations must not block on the work they are asked to do. Results
/// for route batches and next hop subscriptions are delivered later through
/// the supplied sink, possibly from another thread.
pub trait RoutingClient: Send + Sync {
    /// Install every route of the batch. One completion per route is
    /// expected on `sink`.
    fn install_route_batch(
        &self,
        batch: RouteBatch,
        sink: CompletionSink,
    ) -> Result<(), Error>;

    /// Remove every route of the batch. One completion per route is expected
    /// on `sink`.
    fn remove_route_batch(
        &self,
        batch: RouteBatch,
        sink: CompletionSink,
    ) -> Result<(), Error>;

    /// Find a nexthop group by name.
    fn lookup_nexthop_group(&self, name: &str) -> Option<NexthopGroup>;

    /// Ask to be told about reachability changes of `prefix`. When
    /// `connected` is set only directly attached reachability counts.
    fn subscribe_nexthop_change(
        &self,
        prefix: Prefix,
        connected: bool,
        sink: NexthopSink,
    ) -> Result<(), Error>;

    /// Find a VRF by name.
    fn lookup_vrf(&self, name: &str) -> Option<VrfId>;

    /// Attach a pop-and-forward label to a VRF for one address family.
    /// `None` withdraws whatever label was there.
    fn vrf_label_add(
        &self,
        vrf: VrfId,
        family: AddressFamily,
        label: Option<u32>,
    ) -> Result<(), Error>;
}
