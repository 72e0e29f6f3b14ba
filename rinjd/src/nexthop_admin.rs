// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::error::Error;
use crate::log::adm_log;
use crate::{admin::HandlerContext, register};
use dropshot::{
    endpoint, ApiDescription, HttpError, HttpResponseOk,
    HttpResponseUpdatedNoContent, Path, RequestContext, TypedBody,
};
use rinj::api::{NexthopWatchEntry, WatchNexthopRequest};
use rinj::Prefix;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::sync::Arc;

const UNIT: &str = "nexthop";

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct NexthopSelector {
    pub addr: IpAddr,
}

pub(crate) fn api_description(api: &mut ApiDescription<Arc<HandlerContext>>) {
    register!(api, watch_nexthop);
    register!(api, get_nexthop_data);
    register!(api, get_nexthop_entry);
}

/// Track reachability of a next hop.
#[endpoint { method = PUT, path = "/nexthop/watch" }]
pub async fn watch_nexthop(
    ctx: RequestContext<Arc<HandlerContext>>,
    request: TypedBody<WatchNexthopRequest>,
) -> Result<HttpResponseUpdatedNoContent, HttpError> {
    let rq = request.into_inner();
    let ctx = ctx.context();
    let prefix = ctx
        .nht
        .watch(rq.addr, rq.connected)
        .map_err(Error::from)?;
    adm_log!(ctx.log, info, "watching nexthop";
        "prefix" => prefix.to_string(),
        "connected" => rq.connected
    );
    Ok(HttpResponseUpdatedNoContent())
}

/// Every watched next hop, ordered by prefix.
#[endpoint { method = GET, path = "/data/nexthop" }]
pub async fn get_nexthop_data(
    ctx: RequestContext<Arc<HandlerContext>>,
) -> Result<HttpResponseOk<Vec<NexthopWatchEntry>>, HttpError> {
    Ok(HttpResponseOk(ctx.context().nht.dump()))
}

/// A single watched next hop.
#[endpoint { method = GET, path = "/data/nexthop/{addr}" }]
pub async fn get_nexthop_entry(
    ctx: RequestContext<Arc<HandlerContext>>,
    path: Path<NexthopSelector>,
) -> Result<HttpResponseOk<NexthopWatchEntry>, HttpError> {
    let addr = path.into_inner().addr;
    let entry = ctx
        .context()
        .nht
        .get(&Prefix::host(addr))
        .ok_or_else(|| Error::NotFound(format!("nexthop {addr} not watched")))?;
    Ok(HttpResponseOk(entry))
}
