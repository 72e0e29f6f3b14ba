// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::client::Client;
use anyhow::Result;
use clap::{Args, ValueEnum};
use rinj::api::VrfLabelRequest;
use rinj::{AddressFamily, MAX_LABEL};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Family {
    Ipv4,
    Ipv6,
}

impl From<Family> for AddressFamily {
    fn from(f: Family) -> Self {
        match f {
            Family::Ipv4 => AddressFamily::Ipv4,
            Family::Ipv6 => AddressFamily::Ipv6,
        }
    }
}

#[derive(Debug, Args)]
pub struct Label {
    /// Address family the label applies to.
    pub family: Family,

    /// VRF name, `default` for the default VRF.
    pub vrf: String,

    /// Label to use. Zero removes the label.
    #[arg(value_parser = clap::value_parser!(u32).range(0..=i64::from(MAX_LABEL)))]
    pub label: u32,
}

impl From<Label> for VrfLabelRequest {
    fn from(l: Label) -> Self {
        VrfLabelRequest {
            family: l.family.into(),
            vrf: l.vrf,
            label: l.label,
        }
    }
}

pub async fn label(args: Label, client: Client) -> Result<()> {
    client.set_vrf_label(&args.into()).await?;
    Ok(())
}
