// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use anyhow::Result;
use clap::{Parser, Subcommand};
use client::Client;
use rinj::DEFAULT_ADMIN_PORT;
use rinj_common::cli::cli_style;
use slog::Drain;
use slog::Logger;
use std::net::{IpAddr, SocketAddr};

mod client;
mod nexthop;
mod routes;
mod vrf;

#[derive(Parser, Debug)]
#[command(
    version,
    about,
    long_about = None,
    styles = cli_style(),
    infer_subcommands = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Address of admin interface
    #[arg(short, env = "RINJD_ADDR", long, default_value = "::1")]
    address: IpAddr,

    /// TCP port for admin interface
    #[arg(short, env = "RINJD_PORT", long, default_value_t = DEFAULT_ADMIN_PORT)]
    port: u16,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Install a block of host routes and time it.
    Install(routes::Install),

    /// Remove a block of host routes and time it.
    Remove(routes::Remove),

    /// Stop tracking the run in flight.
    Cancel,

    /// Track reachability of a next hop.
    Watch(nexthop::Watch),

    /// Attach a label to a VRF.
    Label(vrf::Label),

    /// Show harness state.
    #[command(subcommand)]
    Show(Show),
}

#[derive(Subcommand, Debug)]
enum Show {
    /// Progress and timing of the current run.
    Route,

    /// Watched next hops.
    Nexthop {
        /// Show a single next hop.
        addr: Option<IpAddr>,
    },

    /// Debugging state.
    Debugging,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let log = init_logger();

    let endpoint = format!("http://{}", SocketAddr::new(cli.address, cli.port));
    let client = Client::new(&endpoint, log.clone());

    match cli.command {
        Commands::Install(args) => routes::install(args, client).await?,
        Commands::Remove(args) => routes::remove(args, client).await?,
        Commands::Cancel => routes::cancel(client).await?,
        Commands::Watch(args) => nexthop::watch(args, client).await?,
        Commands::Label(args) => vrf::label(args, client).await?,
        Commands::Show(Show::Route) => routes::show(client).await?,
        Commands::Show(Show::Nexthop { addr }) => {
            nexthop::show(addr, client).await?
        }
        Commands::Show(Show::Debugging) => {
            println!("{}", client.get_debugging().await?.status);
        }
    }
    Ok(())
}

fn init_logger() -> Logger {
    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_envlogger::new(drain).fuse();
    let drain = slog_async::Async::new(drain).build().fuse();
    slog::Logger::root(drain, slog::o!())
}
