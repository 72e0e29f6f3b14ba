// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::types::{AddressFamily, Prefix};

/// Errors surfaced to the operator by harness commands. None of these leave
/// the run descriptor modified.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error(
        "address space exhausted: {count} {family} routes starting at {start} \
         run past the last address"
    )]
    AddressSpaceExhausted {
        start: Prefix,
        count: u32,
        family: AddressFamily,
    },

    #[error("routing daemon error: {0}")]
    Collaborator(String),

    #[error("worker error: {0}")]
    Worker(String),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("specified nexthop group {0} does not exist")]
    UnknownNexthopGroup(String),

    #[error("unable to find vrf {0}")]
    UnknownVrf(String),
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::Worker(value.to_string())
    }
}
