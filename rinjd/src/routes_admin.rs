// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::error::Error;
use crate::log::adm_log;
use crate::{admin::HandlerContext, register};
use dropshot::{
    endpoint, ApiDescription, HttpError, HttpResponseOk, RequestContext,
    TypedBody,
};
use rinj::api::{
    InstallRequest, RemoveRequest, RunCancelled, RunReport, RunStarted,
};
use std::sync::Arc;

const UNIT: &str = "routes";

pub(crate) fn api_description(api: &mut ApiDescription<Arc<HandlerContext>>) {
    register!(api, install_routes);
    register!(api, remove_routes);
    register!(api, cancel_run);
    register!(api, get_route_data);
}

/// Start installing a block of host routes. Any run in flight is replaced.
#[endpoint { method = PUT, path = "/routes/install" }]
pub async fn install_routes(
    ctx: RequestContext<Arc<HandlerContext>>,
    request: TypedBody<InstallRequest>,
) -> Result<HttpResponseOk<RunStarted>, HttpError> {
    let rq = request.into_inner();
    let ctx = ctx.context();
    let run = ctx.controller.install(&rq).map_err(|e| {
        adm_log!(ctx.log, warn, "install rejected: {}", e;
            "start" => rq.start.to_string(),
            "count" => rq.count
        );
        Error::from(e)
    })?;
    Ok(HttpResponseOk(RunStarted { run }))
}

/// Start removing a block of host routes. Any run in flight is replaced.
#[endpoint { method = PUT, path = "/routes/remove" }]
pub async fn remove_routes(
    ctx: RequestContext<Arc<HandlerContext>>,
    request: TypedBody<RemoveRequest>,
) -> Result<HttpResponseOk<RunStarted>, HttpError> {
    let rq = request.into_inner();
    let ctx = ctx.context();
    let run = ctx.controller.remove(&rq).map_err(|e| {
        adm_log!(ctx.log, warn, "remove rejected: {}", e;
            "start" => rq.start.to_string(),
            "count" => rq.count
        );
        Error::from(e)
    })?;
    Ok(HttpResponseOk(RunStarted { run }))
}

/// Stop tracking the run in flight. Routes already programmed stay where
/// they are.
#[endpoint { method = DELETE, path = "/routes/run" }]
pub async fn cancel_run(
    ctx: RequestContext<Arc<HandlerContext>>,
) -> Result<HttpResponseOk<RunCancelled>, HttpError> {
    let run = ctx.context().controller.cancel();
    Ok(HttpResponseOk(RunCancelled { run }))
}

/// Progress and timing of the current run.
#[endpoint { method = GET, path = "/data/route" }]
pub async fn get_route_data(
    ctx: RequestContext<Arc<HandlerContext>>,
) -> Result<HttpResponseOk<RunReport>, HttpError> {
    Ok(HttpResponseOk(ctx.context().controller.status()))
}
