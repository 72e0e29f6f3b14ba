// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::{self, Display, Formatter};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

#[derive(
    Debug, Copy, Clone, Serialize, Deserialize, Eq, Hash, PartialEq, JsonSchema,
)]
pub struct Prefix4 {
    pub value: Ipv4Addr,
    pub length: u8,
}

impl PartialOrd for Prefix4 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Prefix4 {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.value != other.value {
            return self.value.cmp(&other.value);
        }
        self.length.cmp(&other.length)
    }
}

impl Prefix4 {
    pub const HOST_MASK: u8 = 32;

    /// Create a new `Prefix4` with its host bits zeroed.
    pub fn new(ip: Ipv4Addr, length: u8) -> Self {
        let length = length.min(Self::HOST_MASK);
        Self {
            value: Ipv4Addr::from(u32::from(ip) & Self::mask(length)),
            length,
        }
    }

    /// The /32 host prefix for `ip`.
    pub fn host(ip: Ipv4Addr) -> Self {
        Self {
            value: ip,
            length: Self::HOST_MASK,
        }
    }

    fn mask(length: u8) -> u32 {
        match length {
            0 => 0,
            _ => (!0u32) << (32 - u32::from(length)),
        }
    }

    /// Check if this prefix is contained within another prefix.
    /// Returns true if this prefix is equal to or more specific than the other.
    pub fn within(&self, other: &Prefix4) -> bool {
        if self.length < other.length {
            return false;
        }
        let mask = Self::mask(other.length);
        u32::from(self.value) & mask == u32::from(other.value) & mask
    }

    /// The host prefix one address above this one, if there is one.
    pub fn successor(&self) -> Option<Self> {
        u32::from(self.value)
            .checked_add(1)
            .map(|v| Self::host(Ipv4Addr::from(v)))
    }
}

impl Display for Prefix4 {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.value, self.length)
    }
}

impl FromStr for Prefix4 {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (value, length) =
            s.split_once('/').ok_or("malformed prefix".to_string())?;

        let length: u8 =
            length.parse().map_err(|_| "malformed length".to_string())?;
        if length > Self::HOST_MASK {
            return Err(format!("prefix length {length} exceeds 32"));
        }

        let value = value
            .parse()
            .map_err(|_| "malformed ip addr".to_string())?;
        Ok(Self::new(value, length))
    }
}

#[derive(
    Debug, Copy, Clone, Serialize, Deserialize, Hash, Eq, PartialEq, JsonSchema,
)]
pub struct Prefix6 {
    pub value: Ipv6Addr,
    pub length: u8,
}

impl PartialOrd for Prefix6 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Prefix6 {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.value != other.value {
            return self.value.cmp(&other.value);
        }
        self.length.cmp(&other.length)
    }
}

impl Prefix6 {
    pub const HOST_MASK: u8 = 128;

    /// Create a new `Prefix6` with its host bits zeroed.
    pub fn new(ip: Ipv6Addr, length: u8) -> Self {
        let length = length.min(Self::HOST_MASK);
        Self {
            value: Ipv6Addr::from(u128::from(ip) & Self::mask(length)),
            length,
        }
    }

    /// The /128 host prefix for `ip`.
    pub fn host(ip: Ipv6Addr) -> Self {
        Self {
            value: ip,
            length: Self::HOST_MASK,
        }
    }

    fn mask(length: u8) -> u128 {
        match length {
            0 => 0,
            _ => (!0u128) << (128 - u32::from(length)),
        }
    }

    /// Check if this prefix is contained within another prefix.
    /// Returns true if this prefix is equal to or more specific than the other.
    pub fn within(&self, other: &Prefix6) -> bool {
        if self.length < other.length {
            return false;
        }
        let mask = Self::mask(other.length);
        u128::from(self.value) & mask == u128::from(other.value) & mask
    }

    /// The host prefix one address above this one, if there is one.
    pub fn successor(&self) -> Option<Self> {
        u128::from(self.value)
            .checked_add(1)
            .map(|v| Self::host(Ipv6Addr::from(v)))
    }
}

impl Display for Prefix6 {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.value, self.length)
    }
}

impl FromStr for Prefix6 {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (value, length) =
            s.split_once('/').ok_or("malformed prefix".to_string())?;

        let length: u8 =
            length.parse().map_err(|_| "malformed length".to_string())?;
        if length > Self::HOST_MASK {
            return Err(format!("prefix length {length} exceeds 128"));
        }

        let value = value
            .parse()
            .map_err(|_| "malformed ip addr".to_string())?;
        Ok(Self::new(value, length))
    }
}

#[derive(
    Debug,
    Copy,
    Clone,
    Serialize,
    Deserialize,
    Eq,
    Hash,
    PartialEq,
    JsonSchema,
    PartialOrd,
    Ord,
)]
pub enum Prefix {
    V4(Prefix4),
    V6(Prefix6),
}

impl Display for Prefix {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Prefix::V4(p) => p.fmt(f),
            Prefix::V6(p) => p.fmt(f),
        }
    }
}

impl From<Prefix4> for Prefix {
    fn from(value: Prefix4) -> Self {
        Self::V4(value)
    }
}

impl From<Prefix6> for Prefix {
    fn from(value: Prefix6) -> Self {
        Self::V6(value)
    }
}

impl FromStr for Prefix {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(prefix4) = s.parse::<Prefix4>() {
            Ok(Self::V4(prefix4))
        } else if let Ok(prefix6) = s.parse::<Prefix6>() {
            Ok(Self::V6(prefix6))
        } else {
            Err("malformed prefix".to_string())
        }
    }
}

impl Prefix {
    /// The host prefix for `ip`: /32 for IPv4, /128 for IPv6.
    pub fn host(ip: IpAddr) -> Self {
        match ip {
            IpAddr::V4(ip4) => Self::V4(Prefix4::host(ip4)),
            IpAddr::V6(ip6) => Self::V6(Prefix6::host(ip6)),
        }
    }

    pub fn addr(&self) -> IpAddr {
        match self {
            Self::V4(p4) => p4.value.into(),
            Self::V6(p6) => p6.value.into(),
        }
    }

    pub fn length(&self) -> u8 {
        match self {
            Self::V4(p4) => p4.length,
            Self::V6(p6) => p6.length,
        }
    }

    pub fn family(&self) -> AddressFamily {
        match self {
            Self::V4(_) => AddressFamily::Ipv4,
            Self::V6(_) => AddressFamily::Ipv6,
        }
    }

    /// Check if this prefix is contained within another prefix.
    /// Returns false for cross-family comparisons.
    pub fn within(&self, other: &Prefix) -> bool {
        match (self, other) {
            (Prefix::V4(a), Prefix::V4(b)) => a.within(b),
            (Prefix::V6(a), Prefix::V6(b)) => a.within(b),
            _ => false,
        }
    }

    /// True if `addr` falls inside this prefix.
    pub fn contains(&self, addr: IpAddr) -> bool {
        Prefix::host(addr).within(self)
    }

    /// The next host prefix of the same family, or `None` at the top of the
    /// address space.
    pub fn successor(&self) -> Option<Self> {
        match self {
            Self::V4(p4) => p4.successor().map(Self::V4),
            Self::V6(p6) => p6.successor().map(Self::V6),
        }
    }
}

#[derive(
    Debug,
    Copy,
    Clone,
    Serialize,
    Deserialize,
    Eq,
    Hash,
    PartialEq,
    PartialOrd,
    Ord,
    JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum AddressFamily {
    Ipv4,
    Ipv6,
}

impl AddressFamily {
    pub fn of(addr: IpAddr) -> Self {
        match addr {
            IpAddr::V4(_) => Self::Ipv4,
            IpAddr::V6(_) => Self::Ipv6,
        }
    }
}

impl Display for AddressFamily {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ipv4 => write!(f, "ipv4"),
            Self::Ipv6 => write!(f, "ipv6"),
        }
    }
}

/// How the routes of a run are forwarded. Either a single next hop of any
/// family, or a reference to a nexthop group known to the routing daemon.
#[derive(
    Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Hash, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum NexthopSpec {
    Single(IpAddr),
    Group(String),
}

impl Display for NexthopSpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(addr) => write!(f, "nexthop {addr}"),
            Self::Group(name) => write!(f, "nexthop-group {name}"),
        }
    }
}

/// A named set of next hops as held by the routing daemon.
#[derive(
    Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Hash, JsonSchema,
)]
pub struct NexthopGroup {
    pub name: String,
    pub nexthops: Vec<IpAddr>,
}

/// The forwarding binding shared by every route in a run once any group
/// reference has been resolved.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum ResolvedNexthops {
    Single(IpAddr),
    Group(NexthopGroup),
}

impl ResolvedNexthops {
    pub fn addrs(&self) -> Vec<IpAddr> {
        match self {
            Self::Single(addr) => vec![*addr],
            Self::Group(g) => g.nexthops.clone(),
        }
    }
}

/// Identifies one run of the controller. Every install or remove command gets
/// a fresh id, which lets late completions from an earlier run be told apart
/// from the current one.
#[derive(
    Debug,
    Default,
    Copy,
    Clone,
    Serialize,
    Deserialize,
    Eq,
    Hash,
    PartialEq,
    PartialOrd,
    Ord,
    JsonSchema,
)]
pub struct RunId(pub u64);

impl RunId {
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl Display for RunId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "run-{}", self.0)
    }
}

#[derive(
    Debug, Copy, Clone, Serialize, Deserialize, Eq, Hash, PartialEq, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Install,
    Remove,
}

impl Phase {
    pub fn opposite(self) -> Self {
        match self {
            Self::Install => Self::Remove,
            Self::Remove => Self::Install,
        }
    }

    pub fn pending(self) -> RunState {
        match self {
            Self::Install => RunState::InstallPending,
            Self::Remove => RunState::RemovePending,
        }
    }

    pub fn complete(self) -> RunState {
        match self {
            Self::Install => RunState::InstallComplete,
            Self::Remove => RunState::RemoveComplete,
        }
    }
}

impl Display for Phase {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Install => write!(f, "install"),
            Self::Remove => write!(f, "remove"),
        }
    }
}

#[derive(
    Debug,
    Default,
    Copy,
    Clone,
    Serialize,
    Deserialize,
    Eq,
    Hash,
    PartialEq,
    JsonSchema,
)]
pub enum RunState {
    #[default]
    Idle,
    InstallPending,
    InstallComplete,
    RemovePending,
    RemoveComplete,
}

impl RunState {
    /// The phase waiting on completions, if any.
    pub fn pending_phase(&self) -> Option<Phase> {
        match self {
            Self::InstallPending => Some(Phase::Install),
            Self::RemovePending => Some(Phase::Remove),
            _ => None,
        }
    }
}

/// Result of programming a single route as reported by the routing daemon.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RouteOutcome {
    Success,
    Failure(String),
}

/// Last known reachability of a watched next hop.
#[derive(
    Debug, Default, Clone, Serialize, Deserialize, Eq, PartialEq, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum NexthopStatus {
    /// No notification has arrived since the watch was (re)registered.
    #[default]
    Unknown,
    Reachable {
        nexthops: Vec<IpAddr>,
    },
    Unreachable,
}

impl Display for NexthopStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown"),
            Self::Unreachable => write!(f, "unreachable"),
            Self::Reachable { nexthops } => {
                write!(f, "reachable via")?;
                for nh in nexthops {
                    write!(f, " {nh}")?;
                }
                Ok(())
            }
        }
    }
}

/// Identifier of a VRF inside the routing daemon.
#[derive(
    Debug,
    Copy,
    Clone,
    Serialize,
    Deserialize,
    Eq,
    Hash,
    PartialEq,
    PartialOrd,
    Ord,
    JsonSchema,
)]
pub struct VrfId(pub u32);

impl VrfId {
    pub const DEFAULT: VrfId = VrfId(0);
}

impl Display for VrfId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
