// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Enumeration of the host routes that make up a run.

use crate::client::RoutingClient;
use crate::error::{ConfigurationError, Error};
use crate::types::{NexthopSpec, Prefix, ResolvedNexthops};
use crate::{MAX_ROUTE_COUNT, MIN_ROUTE_COUNT};
use std::net::IpAddr;

/// A contiguous block of host routes: `count` prefixes starting at `start`
/// and advancing one address at a time. Every route shares the same next
/// hops and instance.
///
/// A `RouteSet` can only be built through [`RouteSet::new`], so holding one
/// means the block fits in its address family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteSet {
    start: Prefix,
    count: u32,
    nexthops: Option<ResolvedNexthops>,
    instance: Option<u8>,
}

/// One route of a [`RouteSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route<'a> {
    pub prefix: Prefix,
    pub nexthops: Option<&'a ResolvedNexthops>,
    pub instance: Option<u8>,
}

impl RouteSet {
    /// Validate and build a route set.
    ///
    /// `nexthops` is `None` for removal runs, which only need the prefixes.
    pub fn new(
        start: IpAddr,
        count: u32,
        nexthops: Option<ResolvedNexthops>,
        instance: Option<u8>,
    ) -> Result<Self, Error> {
        check_count(count)?;
        if start.is_unspecified() {
            return Err(Error::Validation(format!(
                "{start} is not a usable start address"
            )));
        }

        let start = Prefix::host(start);
        let fits = match start {
            Prefix::V4(p4) => u32::from(p4.value)
                .checked_add(count - 1)
                .is_some(),
            Prefix::V6(p6) => u128::from(p6.value)
                .checked_add(u128::from(count - 1))
                .is_some(),
        };
        if !fits {
            return Err(Error::AddressSpaceExhausted {
                start,
                count,
                family: start.family(),
            });
        }

        Ok(Self {
            start,
            count,
            nexthops,
            instance,
        })
    }

    pub fn start(&self) -> Prefix {
        self.start
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn nexthops(&self) -> Option<&ResolvedNexthops> {
        self.nexthops.as_ref()
    }

    pub fn instance(&self) -> Option<u8> {
        self.instance
    }

    /// The last prefix of the block.
    pub fn last(&self) -> Prefix {
        self.prefixes().last().unwrap_or(self.start)
    }

    /// True if `prefix` is one of the routes of this set.
    pub fn contains(&self, prefix: &Prefix) -> bool {
        match (self.start, prefix) {
            (Prefix::V4(s), Prefix::V4(p)) if p.length == s.length => {
                let (s, p) = (u32::from(s.value), u32::from(p.value));
                p >= s && p - s < self.count
            }
            (Prefix::V6(s), Prefix::V6(p)) if p.length == s.length => {
                let (s, p) = (u128::from(s.value), u128::from(p.value));
                p >= s && p - s < u128::from(self.count)
            }
            _ => false,
        }
    }

    /// Lazily walk the prefixes of the set in ascending order. The iterator
    /// can be recreated any number of times and always yields the same
    /// sequence.
    pub fn prefixes(&self) -> Prefixes {
        Prefixes {
            next: Some(self.start),
            remaining: self.count,
        }
    }

    /// Lazily walk the routes of the set.
    pub fn routes(&self) -> impl Iterator<Item = Route<'_>> + '_ {
        self.prefixes().map(move |prefix| Route {
            prefix,
            nexthops: self.nexthops.as_ref(),
            instance: self.instance,
        })
    }
}

/// Iterator over the prefixes of a [`RouteSet`].
#[derive(Debug, Clone)]
pub struct Prefixes {
    next: Option<Prefix>,
    remaining: u32,
}

impl Iterator for Prefixes {
    type Item = Prefix;

    fn next(&mut self) -> Option<Prefix> {
        if self.remaining == 0 {
            return None;
        }
        let current = self.next?;
        self.remaining -= 1;
        self.next = current.successor();
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for Prefixes {}

pub(crate) fn check_count(count: u32) -> Result<(), Error> {
    if !(MIN_ROUTE_COUNT..=MAX_ROUTE_COUNT).contains(&count) {
        return Err(Error::Validation(format!(
            "route count {count} outside of {MIN_ROUTE_COUNT}-{MAX_ROUTE_COUNT}"
        )));
    }
    Ok(())
}

/// Turn a nexthop spec into concrete next hops. Group references must name a
/// group the routing daemon already knows about. The family of a single next
/// hop is not checked against the family of the routes it serves.
pub fn resolve_nexthops(
    spec: &NexthopSpec,
    client: &dyn RoutingClient,
) -> Result<ResolvedNexthops, Error> {
    match spec {
        NexthopSpec::Single(addr) => {
            if addr.is_unspecified() {
                return Err(Error::Validation(format!(
                    "{addr} is not a usable nexthop"
                )));
            }
            Ok(ResolvedNexthops::Single(*addr))
        }
        NexthopSpec::Group(name) => client
            .lookup_nexthop_group(name)
            .map(ResolvedNexthops::Group)
            .ok_or_else(|| {
                ConfigurationError::UnknownNexthopGroup(name.clone()).into()
            }),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::sim::{SimClient, SimConfig};
    use crate::types::{AddressFamily, NexthopGroup};
    use pretty_assertions::assert_eq;
    use rinj_common::log::discard_logger;
    use std::net::{Ipv4Addr, Ipv6Addr};

    fn nh() -> Option<ResolvedNexthops> {
        Some(ResolvedNexthops::Single("10.0.0.2".parse().unwrap()))
    }

    #[test]
    fn enumerates_consecutive_v4_hosts() {
        let rs = RouteSet::new("10.0.0.254".parse().unwrap(), 4, nh(), Some(3))
            .unwrap();
        let got: Vec<String> =
            rs.prefixes().map(|p| p.to_string()).collect();
        assert_eq!(
            got,
            vec!["10.0.0.254/32", "10.0.0.255/32", "10.0.1.0/32", "10.0.1.1/32"]
        );
        assert_eq!(rs.last().to_string(), "10.0.1.1/32");
        assert!(rs.routes().all(|r| r.instance == Some(3)
            && r.nexthops == rs.nexthops()));
    }

    #[test]
    fn enumerates_v6_hosts() {
        let rs = RouteSet::new("2001:db8::fffe".parse().unwrap(), 3, None, None)
            .unwrap();
        let got: Vec<String> =
            rs.prefixes().map(|p| p.to_string()).collect();
        assert_eq!(
            got,
            vec!["2001:db8::fffe/128", "2001:db8::ffff/128", "2001:db8::1:0/128"]
        );
        assert!(rs.prefixes().all(|p| p.family() == AddressFamily::Ipv6));
    }

    #[test]
    fn prefixes_are_restartable() {
        let rs =
            RouteSet::new("10.1.0.1".parse().unwrap(), 10, nh(), None).unwrap();
        let a: Vec<Prefix> = rs.prefixes().collect();
        let b: Vec<Prefix> = rs.prefixes().collect();
        assert_eq!(a, b);
        assert_eq!(rs.prefixes().len(), 10);
    }

    #[test]
    fn rejects_bad_counts() {
        for count in [0, MAX_ROUTE_COUNT + 1] {
            let err = RouteSet::new("10.0.0.1".parse().unwrap(), count, nh(), None)
                .unwrap_err();
            assert!(matches!(err, Error::Validation(_)), "{err}");
        }
        assert!(
            RouteSet::new("10.0.0.1".parse().unwrap(), MAX_ROUTE_COUNT, nh(), None)
                .is_ok()
        );
    }

    #[test]
    fn rejects_unspecified_start() {
        let err = RouteSet::new(Ipv4Addr::UNSPECIFIED.into(), 1, nh(), None)
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn rejects_wrapping_past_top_of_space() {
        let err = RouteSet::new("255.255.255.250".parse().unwrap(), 7, nh(), None)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::AddressSpaceExhausted {
                count: 7,
                family: AddressFamily::Ipv4,
                ..
            }
        ));

        // exactly reaching the last address is fine
        let rs = RouteSet::new("255.255.255.250".parse().unwrap(), 6, nh(), None)
            .unwrap();
        assert_eq!(rs.last(), Prefix::host(Ipv4Addr::BROADCAST.into()));

        let top = Ipv6Addr::from(u128::MAX - 1);
        let err = RouteSet::new(top.into(), 3, None, None).unwrap_err();
        assert!(matches!(
            err,
            Error::AddressSpaceExhausted {
                family: AddressFamily::Ipv6,
                ..
            }
        ));
    }

    #[test]
    fn contains_matches_block_only() {
        let rs =
            RouteSet::new("10.0.0.10".parse().unwrap(), 5, nh(), None).unwrap();
        assert!(rs.contains(&Prefix::host("10.0.0.10".parse().unwrap())));
        assert!(rs.contains(&Prefix::host("10.0.0.14".parse().unwrap())));
        assert!(!rs.contains(&Prefix::host("10.0.0.15".parse().unwrap())));
        assert!(!rs.contains(&Prefix::host("10.0.0.9".parse().unwrap())));
        assert!(!rs.contains(&"10.0.0.10/31".parse().unwrap()));
    }

    #[test]
    fn resolves_known_group_and_rejects_unknown() {
        let group = NexthopGroup {
            name: "spine".into(),
            nexthops: vec!["10.0.0.1".parse().unwrap(), "fd00::1".parse().unwrap()],
        };
        let client = SimClient::new(
            SimConfig {
                groups: vec![group.clone()],
                ..Default::default()
            },
            discard_logger(),
        );

        let resolved =
            resolve_nexthops(&NexthopSpec::Group("spine".into()), &client)
                .unwrap();
        assert_eq!(resolved, ResolvedNexthops::Group(group));

        let err = resolve_nexthops(&NexthopSpec::Group("leaf".into()), &client)
            .unwrap_err();
        assert_eq!(
            err,
            Error::Configuration(ConfigurationError::UnknownNexthopGroup(
                "leaf".into()
            ))
        );
    }

    #[test]
    fn single_nexthop_may_cross_families() {
        let client = SimClient::new(SimConfig::default(), discard_logger());
        let resolved = resolve_nexthops(
            &NexthopSpec::Single("10.0.0.1".parse().unwrap()),
            &client,
        )
        .unwrap();
        let rs = RouteSet::new(
            "2001:db8::1".parse().unwrap(),
            2,
            Some(resolved),
            None,
        )
        .unwrap();
        assert_eq!(
            rs.nexthops().map(|n| n.addrs()),
            Some(vec!["10.0.0.1".parse::<IpAddr>().unwrap()])
        );

        let err = resolve_nexthops(
            &NexthopSpec::Single(Ipv6Addr::UNSPECIFIED.into()),
            &client,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
}
