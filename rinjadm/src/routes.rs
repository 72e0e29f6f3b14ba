// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::client::Client;
use anyhow::Result;
use clap::{ArgGroup, Args};
use colored::Colorize;
use rinj::api::{InstallRequest, RemoveRequest, RunReport};
use rinj::{RunState, MAX_REPEAT, MAX_ROUTE_COUNT, MIN_REPEAT};
use std::io::Write;
use std::net::IpAddr;
use tabwriter::TabWriter;

#[derive(Debug, Args)]
#[command(group(
    ArgGroup::new("via").required(true).args(["nexthop", "nexthop_group"])
))]
pub struct Install {
    /// First address of the block.
    pub start: IpAddr,

    /// Number of host routes.
    #[arg(value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_ROUTE_COUNT)))]
    pub count: u32,

    /// Next hop for every route.
    #[arg(long)]
    pub nexthop: Option<IpAddr>,

    /// Nexthop group for every route.
    #[arg(long)]
    pub nexthop_group: Option<String>,

    /// Route table instance.
    #[arg(long)]
    pub instance: Option<u8>,

    /// Install and remove the block this many times.
    #[arg(
        long,
        value_parser = clap::value_parser!(u16).range(i64::from(MIN_REPEAT)..=i64::from(MAX_REPEAT))
    )]
    pub repeat: Option<u16>,
}

impl From<Install> for InstallRequest {
    fn from(i: Install) -> Self {
        InstallRequest {
            start: i.start,
            nexthop: i.nexthop,
            nexthop_group: i.nexthop_group,
            count: i.count,
            instance: i.instance,
            repeat: i.repeat,
        }
    }
}

#[derive(Debug, Args)]
pub struct Remove {
    /// First address of the block.
    pub start: IpAddr,

    /// Number of host routes.
    #[arg(value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_ROUTE_COUNT)))]
    pub count: u32,

    /// Route table instance.
    #[arg(long)]
    pub instance: Option<u8>,
}

impl From<Remove> for RemoveRequest {
    fn from(r: Remove) -> Self {
        RemoveRequest {
            start: r.start,
            count: r.count,
            instance: r.instance,
        }
    }
}

pub async fn install(args: Install, client: Client) -> Result<()> {
    let started = client.install_routes(&args.into()).await?;
    println!("{} started", started.run);
    Ok(())
}

pub async fn remove(args: Remove, client: Client) -> Result<()> {
    let started = client.remove_routes(&args.into()).await?;
    println!("{} started", started.run);
    Ok(())
}

pub async fn cancel(client: Client) -> Result<()> {
    match client.cancel_run().await?.run {
        Some(run) => println!("{run} cancelled"),
        None => println!("no run in flight"),
    }
    Ok(())
}

pub async fn show(client: Client) -> Result<()> {
    let report = client.get_route_data().await?;
    render_report(&report, std::io::stdout())?;
    Ok(())
}

fn state(s: RunState) -> colored::ColoredString {
    let text = format!("{s:?}");
    match s {
        RunState::Idle => text.normal(),
        RunState::InstallPending | RunState::RemovePending => text.yellow(),
        RunState::InstallComplete | RunState::RemoveComplete => text.green(),
    }
}

fn render_report<W: Write>(report: &RunReport, out: W) -> std::io::Result<()> {
    let mut tw = TabWriter::new(out);
    writeln!(&mut tw, "{report}")?;
    writeln!(&mut tw, "{}\t{}", "Run".dimmed(), report.run)?;
    writeln!(&mut tw, "{}\t{}", "State".dimmed(), state(report.state))?;
    if let Some(nh) = &report.nexthop {
        writeln!(&mut tw, "{}\t{}", "Nexthop".dimmed(), nh)?;
    }
    if let Some(instance) = report.instance {
        writeln!(&mut tw, "{}\t{}", "Instance".dimmed(), instance)?;
    }
    let failed = report.failed.to_string();
    writeln!(
        &mut tw,
        "{}\t{}",
        "Failed".dimmed(),
        if report.failed > 0 { failed.red() } else { failed.normal() }
    )?;
    if report.repeat_remaining > 0 {
        writeln!(
            &mut tw,
            "{}\t{}",
            "Repeat steps left".dimmed(),
            report.repeat_remaining
        )?;
    }
    if let Some(at) = report.phase_started_at {
        writeln!(&mut tw, "{}\t{}", "Phase started".dimmed(), at.to_rfc3339())?;
    }
    tw.flush()
}
