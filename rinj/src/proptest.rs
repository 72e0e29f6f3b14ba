// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Property-based tests for route set enumeration.

use crate::error::Error;
use crate::routeset::RouteSet;
use crate::types::{AddressFamily, Prefix};
use proptest::prelude::*;
use std::collections::BTreeSet;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

// Kept small so every case enumerates quickly.
const MAX_TEST_COUNT: u32 = 2048;

fn start_strategy() -> impl Strategy<Value = IpAddr> {
    prop_oneof![
        any::<u32>().prop_map(|bits| IpAddr::V4(Ipv4Addr::from(bits))),
        any::<u128>().prop_map(|bits| IpAddr::V6(Ipv6Addr::from(bits))),
    ]
}

fn as_int(p: &Prefix) -> u128 {
    match p {
        Prefix::V4(p4) => u128::from(u32::from(p4.value)),
        Prefix::V6(p6) => u128::from(p6.value),
    }
}

proptest! {
    /// Property: a route set yields exactly `count` distinct host prefixes,
    /// each one address above the last, all in the start's family.
    #[test]
    fn prop_route_set_is_contiguous(
        start in start_strategy(),
        count in 1u32..=MAX_TEST_COUNT,
    ) {
        let set = match RouteSet::new(start, count, None, None) {
            Ok(set) => set,
            Err(Error::AddressSpaceExhausted { .. }) | Err(Error::Validation(_)) => {
                return Ok(());
            }
            Err(e) => return Err(TestCaseError::fail(e.to_string())),
        };

        let family = AddressFamily::of(start);
        let prefixes: Vec<Prefix> = set.prefixes().collect();
        prop_assert_eq!(prefixes.len(), count as usize);
        prop_assert_eq!(prefixes[0], Prefix::host(start));
        prop_assert_eq!(*prefixes.last().unwrap(), set.last());

        for pair in prefixes.windows(2) {
            prop_assert_eq!(as_int(&pair[1]), as_int(&pair[0]) + 1);
        }
        for p in &prefixes {
            prop_assert_eq!(p.family(), family);
            prop_assert!(set.contains(p), "{} should be in the set", p);
        }

        let distinct: BTreeSet<Prefix> = prefixes.iter().copied().collect();
        prop_assert_eq!(distinct.len(), prefixes.len());
    }

    /// Property: a start too close to the top of its family is rejected
    /// rather than wrapped.
    #[test]
    fn prop_route_set_never_wraps(
        offset in 0u32..MAX_TEST_COUNT,
        count in 1u32..=MAX_TEST_COUNT,
    ) {
        let start = IpAddr::V4(Ipv4Addr::from(u32::MAX - offset));
        let result = RouteSet::new(start, count, None, None);
        if count - 1 > offset {
            let exhausted = matches!(result, Err(Error::AddressSpaceExhausted { .. }));
            prop_assert!(exhausted);
        } else {
            prop_assert!(result.is_ok());
        }
    }
}
