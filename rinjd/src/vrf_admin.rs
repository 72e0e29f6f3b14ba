// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::error::Error;
use crate::log::adm_log;
use crate::{admin::HandlerContext, register};
use dropshot::{
    endpoint, ApiDescription, HttpError, HttpResponseUpdatedNoContent,
    RequestContext, TypedBody,
};
use rinj::api::VrfLabelRequest;
use std::sync::Arc;

const UNIT: &str = "vrf";

pub(crate) fn api_description(api: &mut ApiDescription<Arc<HandlerContext>>) {
    register!(api, set_vrf_label);
}

/// Attach a pop-and-forward label to a VRF, or withdraw it with label 0.
#[endpoint { method = PUT, path = "/vrf/label" }]
pub async fn set_vrf_label(
    ctx: RequestContext<Arc<HandlerContext>>,
    request: TypedBody<VrfLabelRequest>,
) -> Result<HttpResponseUpdatedNoContent, HttpError> {
    let rq = request.into_inner();
    let ctx = ctx.context();
    match rinj::vrf::set_label(ctx.client.as_ref(), &rq) {
        Ok(vrf) => {
            adm_log!(ctx.log, info, "vrf label set";
                "vrf" => vrf.0,
                "family" => rq.family.to_string(),
                "label" => rq.label
            );
            Ok(HttpResponseUpdatedNoContent())
        }
        Err(e) => {
            adm_log!(ctx.log, error, "vrf label failed: {}", e;
                "vrf" => rq.vrf.clone()
            );
            Err(Error::from(e).into())
        }
    }
}
