// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::{nexthop_admin, routes_admin, vrf_admin};
use dropshot::{
    endpoint, ApiDescription, ConfigDropshot, HttpError, HttpResponseOk,
    RequestContext, ServerBuilder,
};
use rinj::api::DebuggingStatus;
use rinj::client::RoutingClient;
use rinj::{NexthopWatchRegistry, RunController};
use semver::Version;
use slog::o;
use slog::{error, info, warn, Logger};
use std::io::Write;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio::task::JoinHandle;

pub struct HandlerContext {
    pub controller: RunController,
    pub nht: NexthopWatchRegistry,
    pub client: Arc<dyn RoutingClient>,
    pub log: Logger,
}

impl HandlerContext {
    pub fn new(
        client: Arc<dyn RoutingClient>,
        log: Logger,
    ) -> Result<Self, rinj::error::Error> {
        Ok(Self {
            controller: RunController::new(client.clone(), log.clone())?,
            nht: NexthopWatchRegistry::new(client.clone(), log.clone())?,
            client,
            log,
        })
    }
}

/// Start the admin server. Returns the address actually bound, which differs
/// from the requested one when `port` is zero.
pub fn start_server(
    log: Logger,
    addr: IpAddr,
    port: u16,
    context: Arc<HandlerContext>,
) -> Result<(SocketAddr, JoinHandle<()>), String> {
    let sa = SocketAddr::new(addr, port);
    let ds_config = ConfigDropshot {
        bind_address: sa,
        ..Default::default()
    };

    let ds_log = log.new(o!("unit" => "api-server"));

    let api = api_description();

    let server = ServerBuilder::new(api, context, ds_log)
        .config(ds_config)
        .start()
        .map_err(|e| format!("new admin dropshot: {}", e))?;

    let bound = server.local_addr();
    info!(log, "admin: listening on {}", bound);

    Ok((
        bound,
        tokio::spawn(async move {
            match server.await {
                Ok(_) => warn!(log, "admin: unexpected server exit"),
                Err(e) => error!(log, "admin: server start error {:?}", e),
            }
        }),
    ))
}

#[macro_export]
macro_rules! register {
    ($api:expr, $endpoint:expr) => {
        $api.register($endpoint).expect(stringify!($endpoint))
    };
}

pub fn api_description() -> ApiDescription<Arc<HandlerContext>> {
    let mut api = ApiDescription::new();

    routes_admin::api_description(&mut api);
    nexthop_admin::api_description(&mut api);
    vrf_admin::api_description(&mut api);
    register!(api, get_debugging);

    api
}

/// Write the OpenAPI document for the admin interface.
pub fn apigen<W: Write>(out: &mut W) -> anyhow::Result<()> {
    let api = api_description();
    api.openapi("Route Injection Harness Admin", Version::new(0, 1, 0))
        .write(out)?;
    Ok(())
}

/// Debugging state of the harness.
#[endpoint { method = GET, path = "/debugging" }]
async fn get_debugging(
    _ctx: RequestContext<Arc<HandlerContext>>,
) -> Result<HttpResponseOk<DebuggingStatus>, HttpError> {
    Ok(HttpResponseOk(DebuggingStatus {
        status: "route injection harness debugging status:".into(),
    }))
}
