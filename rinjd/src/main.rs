// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use anyhow::Result;
use clap::Parser;
use rinj::client::RoutingClient;
use rinj::sim::{SimClient, SimConfig};
use rinj::{NexthopGroup, Prefix, VrfId, DEFAULT_ADMIN_PORT};
use rinj_common::cli::cli_style;
use rinj_common::log::{init_file_logger, init_logger};
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

mod admin;
mod error;
mod log;
mod nexthop_admin;
mod routes_admin;
mod vrf_admin;

const COMPONENT_RINJD: &str = "rinjd";
const MOD_ADMIN: &str = "admin";

#[derive(Parser, Debug)]
#[command(version, about, long_about = None, styles = cli_style())]
struct Cli {
    /// Admin server address.
    #[arg(long, default_value = "::", env = "RINJD_ADDR")]
    addr: IpAddr,

    /// Admin server TCP port.
    #[arg(long, default_value_t = DEFAULT_ADMIN_PORT, env = "RINJD_PORT")]
    port: u16,

    /// Write logs to this file instead of stdout.
    #[arg(long)]
    log_file: Option<String>,

    /// Nexthop group known to the routing daemon, as NAME=ADDR[,ADDR..].
    #[arg(long = "nexthop-group", value_parser = parse_group)]
    nexthop_groups: Vec<NexthopGroup>,

    /// Named VRF known to the routing daemon, as NAME=ID.
    #[arg(long = "vrf", value_parser = parse_vrf)]
    vrfs: Vec<(String, VrfId)>,

    /// Network whose addresses resolve as reachable next hops.
    #[arg(long)]
    reachable: Vec<Prefix>,

    /// Network whose addresses are directly attached.
    #[arg(long)]
    connected: Vec<Prefix>,

    /// Route the routing daemon refuses to program.
    #[arg(long)]
    fail: Vec<Prefix>,

    /// Delay in microseconds before each route is acknowledged.
    #[arg(long, default_value_t = 0)]
    ack_delay_usec: u64,

    /// Dump the OpenAPI 3 admin spec and exit.
    #[arg(long)]
    dump_api: bool,
}

impl Cli {
    fn sim_config(&self) -> SimConfig {
        SimConfig {
            groups: self.nexthop_groups.clone(),
            vrfs: self.vrfs.iter().cloned().collect(),
            reachable: self.reachable.clone(),
            connected: self.connected.clone(),
            fail: self.fail.iter().copied().collect(),
            ack_delay: Duration::from_micros(self.ack_delay_usec),
        }
    }
}

fn parse_group(s: &str) -> Result<NexthopGroup, String> {
    let (name, addrs) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=ADDR[,ADDR..], got {s}"))?;
    if name.is_empty() {
        return Err("nexthop group name is empty".into());
    }
    let nexthops = addrs
        .split(',')
        .map(|a| {
            a.trim()
                .parse::<IpAddr>()
                .map_err(|e| format!("nexthop {a}: {e}"))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(NexthopGroup {
        name: name.to_string(),
        nexthops,
    })
}

fn parse_vrf(s: &str) -> Result<(String, VrfId), String> {
    let (name, id) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=ID, got {s}"))?;
    if name.is_empty() {
        return Err("vrf name is empty".into());
    }
    let id = id.parse::<u32>().map_err(|e| format!("vrf id {id}: {e}"))?;
    Ok((name.to_string(), VrfId(id)))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.dump_api {
        return admin::apigen(&mut std::io::stdout().lock());
    }

    let log = match &cli.log_file {
        Some(path) => init_file_logger(path)?,
        None => init_logger(),
    };

    let client: Arc<dyn RoutingClient> =
        Arc::new(SimClient::new(cli.sim_config(), log.clone()));
    let context = Arc::new(admin::HandlerContext::new(client, log.clone())?);

    let (_, j) = admin::start_server(log, cli.addr, cli.port, context)
        .map_err(anyhow::Error::msg)?;
    j.await?;

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn simulator_flags() {
        let cli = Cli::try_parse_from([
            "rinjd",
            "--nexthop-group",
            "spine=10.1.0.1,10.1.0.2",
            "--vrf",
            "blue=7",
            "--reachable",
            "10.0.0.0/8",
            "--connected",
            "10.0.0.0/24",
            "--fail",
            "10.0.0.9/32",
        ])
        .unwrap();
        assert_eq!(cli.port, DEFAULT_ADMIN_PORT);

        let config = cli.sim_config();
        assert_eq!(
            config.groups,
            vec![NexthopGroup {
                name: "spine".into(),
                nexthops: vec![
                    "10.1.0.1".parse().unwrap(),
                    "10.1.0.2".parse().unwrap()
                ],
            }]
        );
        assert_eq!(config.vrfs.get("blue"), Some(&VrfId(7)));
        assert_eq!(config.reachable.len(), 1);
        assert_eq!(config.connected.len(), 1);
        assert!(config.fail.contains(&"10.0.0.9/32".parse().unwrap()));
        assert!(config.ack_delay.is_zero());
    }

    #[test]
    fn malformed_simulator_flags() {
        assert!(parse_group("spine").is_err());
        assert!(parse_group("=10.0.0.1").is_err());
        assert!(parse_group("spine=10.0.0.1,bogus").is_err());
        assert!(parse_vrf("blue=x").is_err());
        assert!(parse_vrf("blue").is_err());
        assert!(Cli::try_parse_from(["rinjd", "--reachable", "10.0.0.0/33"])
            .is_err());
    }
}
