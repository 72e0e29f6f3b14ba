// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Worker thread lifecycle handling.

use crate::lock;
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    thread::{Builder, JoinHandle},
    time::Duration,
};

/// How often a worker blocked on a channel should wake up to check whether it
/// has been asked to stop.
pub const WORKER_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A named worker thread that is told to stop and joined when dropped.
///
/// The closure handed to [`ManagedThread::spawn`] receives the stop flag and
/// is expected to return promptly once it reads `true`. Workers that block on
/// a channel should use a receive timeout of [`WORKER_POLL_INTERVAL`] so they
/// notice the flag.
///
/// ManagedThread is not Clone. Wrap it in an Arc if it needs to be shared so
/// the join in Drop happens exactly once.
#[derive(Debug)]
pub struct ManagedThread {
    name: String,
    handle: Mutex<Option<JoinHandle<()>>>,
    stop: Arc<AtomicBool>,
}

impl ManagedThread {
    /// Spawn `f` on a new thread called `name`.
    pub fn spawn<F>(name: &str, f: F) -> std::io::Result<Self>
    where
        F: FnOnce(Arc<AtomicBool>) + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = stop.clone();
        let handle = Builder::new()
            .name(name.to_string())
            .spawn(move || f(flag))?;
        Ok(Self {
            name: name.to_string(),
            handle: Mutex::new(Some(handle)),
            stop,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// True until the worker closure has returned.
    pub fn is_running(&self) -> bool {
        match lock!(self.handle).as_ref() {
            Some(h) => !h.is_finished(),
            None => false,
        }
    }

    /// Ask the worker to stop without waiting for it.
    pub fn signal_stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

impl Drop for ManagedThread {
    fn drop(&mut self) {
        self.signal_stop();
        if let Some(handle) = lock!(self.handle).take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::mpsc::{channel, RecvTimeoutError};

    #[test]
    fn worker_stops_on_drop() {
        let (tx, rx) = channel::<u32>();
        let (seen_tx, seen_rx) = channel::<u32>();
        let t = ManagedThread::spawn("test-worker", move |stop| loop {
            if stop.load(Ordering::Relaxed) {
                break;
            }
            match rx.recv_timeout(WORKER_POLL_INTERVAL) {
                Ok(v) => seen_tx.send(v * 2).expect("send"),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        })
        .expect("spawn worker");

        assert_eq!(t.name(), "test-worker");
        tx.send(21).expect("send");
        assert_eq!(seen_rx.recv().expect("recv"), 42);
        assert!(t.is_running());

        drop(t);
        // the worker held the only receiver, so the channel is now closed
        assert!(tx.send(1).is_err());
    }
}
