// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Nexthop tracking. Watches are registered with the routing daemon, which
//! reports reachability changes back through a channel. The registry keeps
//! the last status it heard for every watched prefix.

use crate::client::{NexthopSink, NexthopUpdate, RoutingClient};
use crate::error::Error;
use crate::log::nht_log;
use crate::types::{NexthopStatus, Prefix};
use rinj_common::lock;
use rinj_common::thread::{ManagedThread, WORKER_POLL_INTERVAL};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use slog::Logger;
use std::collections::BTreeMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct NexthopWatchEntry {
    pub prefix: Prefix,
    /// Only directly attached reachability counts.
    pub connected: bool,
    pub status: NexthopStatus,
    /// Notifications received since the watch was registered.
    pub updates: u64,
}

pub struct NexthopWatchRegistry {
    inner: Arc<Inner>,
    _worker: ManagedThread,
}

struct Inner {
    entries: Mutex<BTreeMap<Prefix, NexthopWatchEntry>>,
    client: Arc<dyn RoutingClient>,
    updates: Sender<NexthopUpdate>,
    log: Logger,
}

impl NexthopWatchRegistry {
    pub fn new(
        client: Arc<dyn RoutingClient>,
        log: Logger,
    ) -> Result<Self, Error> {
        let (tx, rx) = channel();
        let inner = Arc::new(Inner {
            entries: Mutex::new(BTreeMap::new()),
            client,
            updates: tx,
            log,
        });
        let worker_inner = inner.clone();
        let worker = ManagedThread::spawn("nexthop-tracker", move |stop| {
            worker_inner.run(rx, stop)
        })?;
        Ok(Self {
            inner,
            _worker: worker,
        })
    }

    /// Watch `addr` for reachability changes. The watched prefix is the host
    /// prefix of `addr`. Watching an address again replaces its entry and
    /// subscribes again.
    pub fn watch(&self, addr: IpAddr, connected: bool) -> Result<Prefix, Error> {
        let prefix = Prefix::host(addr);
        // The entry has to exist before subscribing so that an immediate
        // answer is not dropped as unwatched.
        let previous = lock!(self.inner.entries).insert(
            prefix,
            NexthopWatchEntry {
                prefix,
                connected,
                status: NexthopStatus::Unknown,
                updates: 0,
            },
        );
        let sink = NexthopSink::new(self.inner.updates.clone());
        if let Err(e) =
            self.inner.client.subscribe_nexthop_change(prefix, connected, sink)
        {
            let mut entries = lock!(self.inner.entries);
            match previous {
                Some(entry) => entries.insert(prefix, entry),
                None => entries.remove(&prefix),
            };
            nht_log!(self.inner.log, error, "subscribe failed: {}", e;
                "prefix" => prefix.to_string()
            );
            return Err(e);
        }
        nht_log!(self.inner.log, info, "watching nexthop";
            "prefix" => prefix.to_string(),
            "connected" => connected
        );
        Ok(prefix)
    }

    /// Record a new status for a watched prefix. Returns false if the prefix
    /// is not being watched.
    pub fn on_notify(&self, prefix: Prefix, status: NexthopStatus) -> bool {
        self.inner.on_notify(prefix, status)
    }

    /// Snapshot of every watch, ordered by prefix.
    pub fn dump(&self) -> Vec<NexthopWatchEntry> {
        lock!(self.inner.entries).values().cloned().collect()
    }

    pub fn get(&self, prefix: &Prefix) -> Option<NexthopWatchEntry> {
        lock!(self.inner.entries).get(prefix).cloned()
    }
}

impl Inner {
    fn on_notify(&self, prefix: Prefix, status: NexthopStatus) -> bool {
        let mut entries = lock!(self.entries);
        let Some(entry) = entries.get_mut(&prefix) else {
            nht_log!(self.log, debug, "update for unwatched prefix";
                "prefix" => prefix.to_string()
            );
            return false;
        };
        nht_log!(self.log, info, "nexthop update";
            "prefix" => prefix.to_string(),
            "status" => status.to_string()
        );
        entry.status = status;
        entry.updates += 1;
        true
    }

    fn run(&self, rx: Receiver<NexthopUpdate>, stop: Arc<AtomicBool>) {
        loop {
            if stop.load(Ordering::Relaxed) {
                break;
            }
            match rx.recv_timeout(WORKER_POLL_INTERVAL) {
                Ok(u) => {
                    self.on_notify(u.prefix, u.status);
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::sim::{SimClient, SimConfig};
    use pretty_assertions::assert_eq;
    use rinj_common::log::discard_logger;
    use rinj_common::wait_for_eq;

    fn registry() -> NexthopWatchRegistry {
        let client = SimClient::new(
            SimConfig {
                reachable: vec!["10.0.0.0/8".parse().unwrap()],
                connected: vec!["10.0.0.0/24".parse().unwrap()],
                ..Default::default()
            },
            discard_logger(),
        );
        NexthopWatchRegistry::new(Arc::new(client), discard_logger())
            .expect("registry")
    }

    #[test]
    fn watch_uses_host_prefix_of_each_family() {
        let r = registry();
        let p4 = r.watch("10.0.0.1".parse().unwrap(), false).unwrap();
        let p6 = r.watch("fd00::1".parse().unwrap(), true).unwrap();
        assert_eq!(p4.to_string(), "10.0.0.1/32");
        assert_eq!(p6.to_string(), "fd00::1/128");
        assert_eq!(r.dump().len(), 2);
    }

    #[test]
    fn watching_twice_keeps_one_entry() {
        let r = registry();
        let addr: IpAddr = "10.0.0.1".parse().unwrap();
        r.watch(addr, false).unwrap();
        r.watch(addr, true).unwrap();
        let dump = r.dump();
        assert_eq!(dump.len(), 1);
        assert!(dump[0].connected);
    }

    #[test]
    fn subscription_results_land_in_registry() {
        let r = registry();
        let near = r.watch("10.0.0.7".parse().unwrap(), true).unwrap();
        let far = r.watch("10.9.0.7".parse().unwrap(), true).unwrap();
        let loose = r.watch("10.9.0.8".parse().unwrap(), false).unwrap();
        let gone = r.watch("192.0.2.1".parse().unwrap(), false).unwrap();

        wait_for_eq!(r.dump().iter().all(|e| e.updates == 1), true);
        assert_eq!(
            r.get(&near).unwrap().status,
            NexthopStatus::Reachable {
                nexthops: vec!["10.0.0.7".parse().unwrap()]
            }
        );
        assert_eq!(r.get(&far).unwrap().status, NexthopStatus::Unreachable);
        assert!(matches!(
            r.get(&loose).unwrap().status,
            NexthopStatus::Reachable { .. }
        ));
        assert_eq!(r.get(&gone).unwrap().status, NexthopStatus::Unreachable);
    }

    #[test]
    fn notifications_overwrite_in_arrival_order() {
        let r = registry();
        let p = r.watch("192.0.2.1".parse().unwrap(), false).unwrap();
        wait_for_eq!(r.get(&p).unwrap().updates, 1);

        let up = NexthopStatus::Reachable {
            nexthops: vec!["192.0.2.254".parse().unwrap()],
        };
        assert!(r.on_notify(p, up.clone()));
        assert!(r.on_notify(p, NexthopStatus::Unreachable));
        assert!(r.on_notify(p, up.clone()));
        let e = r.get(&p).unwrap();
        assert_eq!(e.status, up);
        assert_eq!(e.updates, 4);
    }

    #[test]
    fn unwatched_notifications_are_ignored() {
        let r = registry();
        let p = Prefix::host("198.51.100.1".parse().unwrap());
        assert!(!r.on_notify(p, NexthopStatus::Unreachable));
        assert!(r.dump().is_empty());
    }

    #[test]
    fn dump_is_ordered_and_repeatable() {
        let r = registry();
        for a in ["10.0.0.3", "10.0.0.1", "10.0.0.2"] {
            r.watch(a.parse().unwrap(), false).unwrap();
        }
        let first: Vec<String> =
            r.dump().iter().map(|e| e.prefix.to_string()).collect();
        let second: Vec<String> =
            r.dump().iter().map(|e| e.prefix.to_string()).collect();
        assert_eq!(first, vec!["10.0.0.1/32", "10.0.0.2/32", "10.0.0.3/32"]);
        assert_eq!(first, second);
    }

    #[test]
    fn rewatch_replaces_the_entry() {
        let r = registry();
        let addr: IpAddr = "10.9.0.7".parse().unwrap();
        let p = r.watch(addr, false).unwrap();
        wait_for_eq!(r.get(&p).unwrap().updates, 1);
        assert!(matches!(
            r.get(&p).unwrap().status,
            NexthopStatus::Reachable { .. }
        ));

        // outside the connected network, so only the new watch can make it
        // unreachable
        r.watch(addr, true).unwrap();
        assert!(r.get(&p).unwrap().connected);
        wait_for_eq!(r.get(&p).unwrap().status, NexthopStatus::Unreachable);
        assert_eq!(r.dump().len(), 1);
    }

    /// Accepts subscriptions without ever answering them, or refuses them
    /// once told to.
    #[derive(Default)]
    struct SilentClient {
        refuse: AtomicBool,
    }

    impl RoutingClient for SilentClient {
        fn install_route_batch(
            &self,
            _batch: crate::client::RouteBatch,
            _sink: crate::client::CompletionSink,
        ) -> Result<(), Error> {
            Ok(())
        }

        fn remove_route_batch(
            &self,
            _batch: crate::client::RouteBatch,
            _sink: crate::client::CompletionSink,
        ) -> Result<(), Error> {
            Ok(())
        }

        fn lookup_nexthop_group(
            &self,
            _name: &str,
        ) -> Option<crate::types::NexthopGroup> {
            None
        }

        fn subscribe_nexthop_change(
            &self,
            _prefix: Prefix,
            _connected: bool,
            _sink: NexthopSink,
        ) -> Result<(), Error> {
            if self.refuse.load(Ordering::Relaxed) {
                return Err(Error::Collaborator("not connected".into()));
            }
            Ok(())
        }

        fn lookup_vrf(&self, _name: &str) -> Option<crate::types::VrfId> {
            None
        }

        fn vrf_label_add(
            &self,
            _vrf: crate::types::VrfId,
            _family: crate::types::AddressFamily,
            _label: Option<u32>,
        ) -> Result<(), Error> {
            Ok(())
        }
    }

    #[test]
    fn refused_subscription_leaves_registry_unchanged() {
        let client = Arc::new(SilentClient::default());
        let r = NexthopWatchRegistry::new(client.clone(), discard_logger())
            .expect("registry");
        let kept = r.watch("10.0.0.1".parse().unwrap(), false).unwrap();
        let before = r.dump();

        client.refuse.store(true, Ordering::Relaxed);
        let err = r.watch("10.0.0.2".parse().unwrap(), false).unwrap_err();
        assert!(matches!(err, Error::Collaborator(_)));
        assert!(r.watch("10.0.0.1".parse().unwrap(), true).is_err());

        assert_eq!(r.dump(), before);
        assert!(!r.get(&kept).unwrap().connected);
    }
}
