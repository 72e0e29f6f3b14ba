// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use dropshot::{ClientErrorStatusCode, HttpError};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Harness(#[from] rinj::error::Error),

    #[error("not found: {0}")]
    NotFound(String),
}

impl From<Error> for HttpError {
    fn from(value: Error) -> Self {
        use rinj::error::Error as H;
        match value {
            Error::Harness(H::Validation(_))
            | Error::Harness(H::AddressSpaceExhausted { .. }) => {
                Self::for_bad_request(None, value.to_string())
            }
            // for_not_found hides the message from the client
            Error::Harness(H::Configuration(_)) | Error::NotFound(_) => {
                Self::for_client_error(
                    None,
                    ClientErrorStatusCode::NOT_FOUND,
                    value.to_string(),
                )
            }
            Error::Harness(H::Collaborator(_))
            | Error::Harness(H::Worker(_)) => {
                Self::for_internal_error(value.to_string())
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use rinj::error::{ConfigurationError, Error as H};

    fn status(e: H) -> u16 {
        HttpError::from(Error::from(e)).status_code.as_u16()
    }

    #[test]
    fn harness_errors_map_to_status() {
        assert_eq!(status(H::Validation("count".into())), 400);
        assert_eq!(
            status(H::AddressSpaceExhausted {
                start: "255.255.255.255/32".parse().unwrap(),
                count: 2,
                family: rinj::AddressFamily::Ipv4,
            }),
            400
        );
        assert_eq!(
            status(H::Configuration(ConfigurationError::UnknownNexthopGroup(
                "spine".into()
            ))),
            404
        );
        assert_eq!(status(H::Collaborator("down".into())), 500);
    }

    #[test]
    fn not_found_names_the_missing_item() {
        let e = HttpError::from(Error::from(H::Configuration(
            ConfigurationError::UnknownVrf("blue".into()),
        )));
        assert_eq!(e.status_code.as_u16(), 404);
        assert!(e.external_message.contains("blue"), "{}", e.external_message);
    }
}
