// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Operator command bodies, shared by the admin server and the admin CLI.

use crate::error::Error;
use crate::types::{AddressFamily, NexthopSpec};
use crate::{MAX_REPEAT, MIN_REPEAT};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

pub use crate::descriptor::RunReport;
pub use crate::nht::NexthopWatchEntry;

/// Install a block of host routes.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct InstallRequest {
    /// First address of the block. The block is /32 or /128 host routes
    /// depending on its family.
    pub start: IpAddr,
    /// Single next hop for every route. Mutually exclusive with
    /// `nexthop_group`.
    pub nexthop: Option<IpAddr>,
    /// Name of a nexthop group known to the routing daemon. Mutually
    /// exclusive with `nexthop`.
    pub nexthop_group: Option<String>,
    /// Number of routes, 1 through 1000000.
    pub count: u32,
    /// Route table instance.
    pub instance: Option<u8>,
    /// Install and remove the block this many times, 2 through 1000.
    pub repeat: Option<u16>,
}

impl InstallRequest {
    /// The nexthop spec this request carries. Exactly one of `nexthop` and
    /// `nexthop_group` has to be present.
    pub fn nexthop_spec(&self) -> Result<NexthopSpec, Error> {
        match (&self.nexthop, &self.nexthop_group) {
            (Some(addr), None) => Ok(NexthopSpec::Single(*addr)),
            (None, Some(name)) => Ok(NexthopSpec::Group(name.clone())),
            (Some(_), Some(_)) => Err(Error::Validation(
                "a nexthop and a nexthop group are mutually exclusive".into(),
            )),
            (None, None) => Err(Error::Validation(
                "either a nexthop or a nexthop group is required".into(),
            )),
        }
    }

    /// The repeat budget of the run: two steps, one install and one remove,
    /// for every requested repetition. Zero means run once.
    pub fn repeat_budget(&self) -> Result<u32, Error> {
        match self.repeat {
            None => Ok(0),
            Some(r) if (MIN_REPEAT..=MAX_REPEAT).contains(&r) => {
                Ok(u32::from(r) * 2)
            }
            Some(r) => Err(Error::Validation(format!(
                "repeat {r} outside of {MIN_REPEAT}-{MAX_REPEAT}"
            ))),
        }
    }
}

/// Remove a block of host routes.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct RemoveRequest {
    pub start: IpAddr,
    pub count: u32,
    pub instance: Option<u8>,
}

/// Start watching a next hop.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct WatchNexthopRequest {
    pub addr: IpAddr,
    /// Only count directly attached reachability.
    #[serde(default)]
    pub connected: bool,
}

/// Give a VRF a pop-and-forward label.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct VrfLabelRequest {
    pub family: AddressFamily,
    /// VRF name, `default` for the default VRF.
    pub vrf: String,
    /// Label to use, 0 through 100000. Zero removes a previously installed
    /// label.
    pub label: u32,
}

/// Acknowledgement of a run command.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct RunStarted {
    pub run: crate::types::RunId,
}

/// Acknowledgement of a cancel command. `run` is absent if nothing was in
/// flight.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct RunCancelled {
    pub run: Option<crate::types::RunId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct DebuggingStatus {
    pub status: String,
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn request() -> InstallRequest {
        InstallRequest {
            start: "10.0.0.1".parse().unwrap(),
            nexthop: Some("10.0.0.2".parse().unwrap()),
            nexthop_group: None,
            count: 5,
            instance: None,
            repeat: None,
        }
    }

    #[test]
    fn nexthop_spec_requires_exactly_one() {
        let r = request();
        assert_eq!(
            r.nexthop_spec().unwrap(),
            NexthopSpec::Single("10.0.0.2".parse().unwrap())
        );

        let r = InstallRequest {
            nexthop_group: Some("g".into()),
            ..request()
        };
        assert!(matches!(r.nexthop_spec(), Err(Error::Validation(_))));

        let r = InstallRequest {
            nexthop: None,
            ..request()
        };
        assert!(matches!(r.nexthop_spec(), Err(Error::Validation(_))));

        let r = InstallRequest {
            nexthop: None,
            nexthop_group: Some("g".into()),
            ..request()
        };
        assert_eq!(r.nexthop_spec().unwrap(), NexthopSpec::Group("g".into()));
    }

    #[test]
    fn repeat_budget_doubles_repetitions() {
        assert_eq!(request().repeat_budget().unwrap(), 0);
        let r = InstallRequest {
            repeat: Some(2),
            ..request()
        };
        assert_eq!(r.repeat_budget().unwrap(), 4);
        let r = InstallRequest {
            repeat: Some(1000),
            ..request()
        };
        assert_eq!(r.repeat_budget().unwrap(), 2000);
        for bad in [0, 1, 1001] {
            let r = InstallRequest {
                repeat: Some(bad),
                ..request()
            };
            assert!(matches!(r.repeat_budget(), Err(Error::Validation(_))));
        }
    }

    #[test]
    fn watch_request_defaults_to_unconnected() {
        let r: WatchNexthopRequest =
            serde_json::from_str(r#"{"addr":"10.0.0.1"}"#).unwrap();
        assert!(!r.connected);
        assert_eq!(r.addr, "10.0.0.1".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn out_of_range_instance_fails_to_decode() {
        let r = serde_json::from_str::<RemoveRequest>(
            r#"{"start":"10.0.0.1","count":1,"instance":256}"#,
        );
        assert!(r.is_err());
    }
}
