// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::api::VrfLabelRequest;
use crate::client::RoutingClient;
use crate::error::{ConfigurationError, Error};
use crate::types::VrfId;
use crate::MAX_LABEL;

/// Name that always refers to the default VRF.
pub const DEFAULT_VRF_NAME: &str = "default";

/// Attach or withdraw a VRF's pop-and-forward label. Returns the VRF the
/// label was applied to.
pub fn set_label(
    client: &dyn RoutingClient,
    req: &VrfLabelRequest,
) -> Result<VrfId, Error> {
    if req.label > MAX_LABEL {
        return Err(Error::Validation(format!(
            "label {} outside of 0-{MAX_LABEL}",
            req.label
        )));
    }
    let vrf = if req.vrf == DEFAULT_VRF_NAME {
        VrfId::DEFAULT
    } else {
        client
            .lookup_vrf(&req.vrf)
            .ok_or_else(|| ConfigurationError::UnknownVrf(req.vrf.clone()))?
    };
    let label = match req.label {
        0 => None,
        l => Some(l),
    };
    client.vrf_label_add(vrf, req.family, label)?;
    Ok(vrf)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::sim::{SimClient, SimConfig};
    use crate::types::AddressFamily;
    use pretty_assertions::assert_eq;
    use rinj_common::log::discard_logger;

    fn client() -> SimClient {
        SimClient::new(
            SimConfig {
                vrfs: [("blue".to_string(), VrfId(7))].into_iter().collect(),
                ..Default::default()
            },
            discard_logger(),
        )
    }

    fn req(vrf: &str, label: u32) -> VrfLabelRequest {
        VrfLabelRequest {
            family: AddressFamily::Ipv6,
            vrf: vrf.into(),
            label,
        }
    }

    #[test]
    fn default_and_named_vrfs() {
        let c = client();
        assert_eq!(set_label(&c, &req("default", 100)).unwrap(), VrfId::DEFAULT);
        assert_eq!(set_label(&c, &req("blue", 200)).unwrap(), VrfId(7));
        assert_eq!(c.label(VrfId(7), AddressFamily::Ipv6), Some(200));
        assert_eq!(c.label(VrfId::DEFAULT, AddressFamily::Ipv6), Some(100));
    }

    #[test]
    fn zero_withdraws() {
        let c = client();
        set_label(&c, &req("blue", 200)).unwrap();
        set_label(&c, &req("blue", 0)).unwrap();
        assert_eq!(c.label(VrfId(7), AddressFamily::Ipv6), None);
    }

    #[test]
    fn rejects_unknown_vrf_and_large_label() {
        let c = client();
        assert_eq!(
            set_label(&c, &req("red", 1)).unwrap_err(),
            Error::Configuration(ConfigurationError::UnknownVrf("red".into()))
        );
        assert!(matches!(
            set_label(&c, &req("blue", MAX_LABEL + 1)),
            Err(Error::Validation(_))
        ));
        assert!(set_label(&c, &req("blue", MAX_LABEL)).is_ok());
    }
}
