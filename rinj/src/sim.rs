// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! An in-process stand-in for the routing daemon.
//!
//! Batches are acknowledged from a background thread one route at a time,
//! next hop subscriptions are answered once from configured reachability,
//! and VRF labels are only recorded. This is enough to exercise the harness
//! end to end and to measure its own overhead.

use crate::client::{CompletionSink, NexthopSink, RouteBatch, RoutingClient};
use crate::error::Error;
use crate::log::sim_log;
use crate::types::{
    AddressFamily, NexthopGroup, NexthopStatus, Phase, Prefix, VrfId,
};
use rinj_common::lock;
use slog::Logger;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;
use std::thread::Builder;
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct SimConfig {
    /// Nexthop groups the simulated daemon knows about.
    pub groups: Vec<NexthopGroup>,
    /// Named VRFs. The default VRF always exists.
    pub vrfs: BTreeMap<String, VrfId>,
    /// Networks whose addresses resolve as reachable.
    pub reachable: Vec<Prefix>,
    /// Networks whose addresses are directly attached.
    pub connected: Vec<Prefix>,
    /// Routes that always fail to install or remove.
    pub fail: BTreeSet<Prefix>,
    /// Delay before each acknowledgement.
    pub ack_delay: Duration,
}

pub struct SimClient {
    config: SimConfig,
    labels: Mutex<BTreeMap<(VrfId, AddressFamily), u32>>,
    log: Logger,
}

impl SimClient {
    pub fn new(config: SimConfig, log: Logger) -> Self {
        Self {
            config,
            labels: Mutex::new(BTreeMap::new()),
            log,
        }
    }

    /// Label currently attached to a VRF for a family.
    pub fn label(&self, vrf: VrfId, family: AddressFamily) -> Option<u32> {
        lock!(self.labels).get(&(vrf, family)).copied()
    }

    fn ack(&self, batch: RouteBatch, sink: CompletionSink) -> Result<(), Error> {
        let fail = self.config.fail.clone();
        let delay = self.config.ack_delay;
        let log = self.log.clone();
        let name = format!("sim-{}-{}", batch.phase, batch.run.0);
        sim_log!(self.log, debug, "accepted {} batch", batch.phase;
            "run" => batch.run.0,
            "count" => batch.routes.count()
        );
        Builder::new()
            .name(name)
            .spawn(move || {
                for prefix in batch.routes.prefixes() {
                    if !delay.is_zero() {
                        std::thread::sleep(delay);
                    }
                    let sent = if fail.contains(&prefix) {
                        sink.failure(prefix, format!("{} rejected", prefix))
                    } else {
                        sink.success(prefix)
                    };
                    if !sent {
                        sim_log!(log, warn, "harness went away mid batch";
                            "run" => batch.run.0
                        );
                        return;
                    }
                }
            })
            .map_err(|e| Error::Collaborator(e.to_string()))?;
        Ok(())
    }

    fn resolve(&self, prefix: Prefix, connected: bool) -> NexthopStatus {
        let within = |nets: &[Prefix]| nets.iter().any(|n| prefix.within(n));
        let reachable = if connected {
            within(&self.config.connected)
        } else {
            within(&self.config.reachable) || within(&self.config.connected)
        };
        if reachable {
            NexthopStatus::Reachable {
                nexthops: vec![prefix.addr()],
            }
        } else {
            NexthopStatus::Unreachable
        }
    }
}

impl RoutingClient for SimClient {
    fn install_route_batch(
        &self,
        batch: RouteBatch,
        sink: CompletionSink,
    ) -> Result<(), Error> {
        debug_assert_eq!(batch.phase, Phase::Install);
        self.ack(batch, sink)
    }

    fn remove_route_batch(
        &self,
        batch: RouteBatch,
        sink: CompletionSink,
    ) -> Result<(), Error> {
        debug_assert_eq!(batch.phase, Phase::Remove);
        self.ack(batch, sink)
    }

    fn lookup_nexthop_group(&self, name: &str) -> Option<NexthopGroup> {
        self.config.groups.iter().find(|g| g.name == name).cloned()
    }

    fn subscribe_nexthop_change(
        &self,
        prefix: Prefix,
        connected: bool,
        sink: NexthopSink,
    ) -> Result<(), Error> {
        let status = self.resolve(prefix, connected);
        sim_log!(self.log, debug, "nexthop subscription";
            "prefix" => prefix.to_string(),
            "status" => status.to_string()
        );
        Builder::new()
            .name("sim-nht".into())
            .spawn(move || {
                sink.notify(prefix, status);
            })
            .map_err(|e| Error::Collaborator(e.to_string()))?;
        Ok(())
    }

    fn lookup_vrf(&self, name: &str) -> Option<VrfId> {
        self.config.vrfs.get(name).copied()
    }

    fn vrf_label_add(
        &self,
        vrf: VrfId,
        family: AddressFamily,
        label: Option<u32>,
    ) -> Result<(), Error> {
        let mut labels = lock!(self.labels);
        match label {
            Some(l) => {
                labels.insert((vrf, family), l);
            }
            None => {
                labels.remove(&(vrf, family));
            }
        }
        sim_log!(self.log, info, "vrf label";
            "vrf" => vrf.0,
            "family" => family.to_string(),
            "label" => label.map(|l| l.to_string()).unwrap_or("none".into())
        );
        Ok(())
    }
}
