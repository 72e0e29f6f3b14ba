// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Core of the route injection harness.
//!
//! The harness programs large, synthetic sets of host routes through a
//! routing daemon and measures how long the daemon takes to acknowledge
//! them. It also watches next hops for reachability changes. The routing
//! daemon itself sits behind the [`client::RoutingClient`] trait.

pub mod api;
pub mod client;
pub mod controller;
pub mod descriptor;
pub mod error;
pub mod nht;
pub mod routeset;
pub mod sim;
pub mod types;
pub mod vrf;

mod log;

#[cfg(test)]
mod proptest;

pub use controller::RunController;
pub use nht::NexthopWatchRegistry;
pub use types::*;

/// Smallest number of routes a run may request.
pub const MIN_ROUTE_COUNT: u32 = 1;

/// Largest number of routes a run may request.
pub const MAX_ROUTE_COUNT: u32 = 1_000_000;

/// Smallest accepted repeat count. Anything below this means "run once" and
/// is expressed by leaving the repeat out entirely.
pub const MIN_REPEAT: u16 = 2;

/// Largest accepted repeat count.
pub const MAX_REPEAT: u16 = 1000;

/// Largest MPLS label the VRF label command accepts.
pub const MAX_LABEL: u32 = 100_000;

/// TCP port the harness daemon serves its admin interface on by default.
pub const DEFAULT_ADMIN_PORT: u16 = 4711;

pub const COMPONENT_RINJ: &str = "rinj";
pub const MOD_CONTROLLER: &str = "controller";
pub const MOD_NHT: &str = "nexthop tracking";
pub const MOD_SIM: &str = "simulated routing daemon";
