// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::client::Client;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use rinj::api::{NexthopWatchEntry, WatchNexthopRequest};
use rinj::NexthopStatus;
use std::io::Write;
use std::net::IpAddr;
use tabwriter::TabWriter;

#[derive(Debug, Args)]
pub struct Watch {
    /// Next hop to track.
    pub addr: IpAddr,

    /// Only count directly attached reachability.
    #[arg(long)]
    pub connected: bool,
}

pub async fn watch(args: Watch, client: Client) -> Result<()> {
    client
        .watch_nexthop(&WatchNexthopRequest {
            addr: args.addr,
            connected: args.connected,
        })
        .await?;
    Ok(())
}

pub async fn show(addr: Option<IpAddr>, client: Client) -> Result<()> {
    let entries = match addr {
        Some(addr) => vec![client.get_nexthop_entry(addr).await?],
        None => client.get_nexthop_data().await?,
    };
    render_entries(&entries, std::io::stdout())?;
    Ok(())
}

fn status(s: &NexthopStatus) -> colored::ColoredString {
    let text = s.to_string();
    match s {
        NexthopStatus::Unknown => text.yellow(),
        NexthopStatus::Reachable { .. } => text.green(),
        NexthopStatus::Unreachable => text.red(),
    }
}

fn render_entries<W: Write>(
    entries: &[NexthopWatchEntry],
    out: W,
) -> std::io::Result<()> {
    let mut tw = TabWriter::new(out);
    writeln!(
        &mut tw,
        "{}\t{}\t{}\t{}",
        "Nexthop".dimmed(),
        "Connected".dimmed(),
        "Updates".dimmed(),
        "Status".dimmed(),
    )?;
    for e in entries {
        writeln!(
            &mut tw,
            "{}\t{}\t{}\t{}",
            e.prefix,
            e.connected,
            e.updates,
            status(&e.status),
        )?;
    }
    tw.flush()
}
