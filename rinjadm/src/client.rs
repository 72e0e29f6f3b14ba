// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP client for the harness daemon's admin interface.

use reqwest::{RequestBuilder, StatusCode};
use rinj::api::{
    DebuggingStatus, InstallRequest, NexthopWatchEntry, RemoveRequest,
    RunCancelled, RunReport, RunStarted, VrfLabelRequest, WatchNexthopRequest,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use slog::{debug, Logger};
use std::net::IpAddr;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("communication error: {0}")]
    Communication(#[from] reqwest::Error),

    #[error("{status}: {message}")]
    Daemon { status: StatusCode, message: String },
}

/// Error body produced by the admin server.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

pub struct Client {
    baseurl: String,
    http: reqwest::Client,
    log: Logger,
}

impl Client {
    pub fn new(baseurl: &str, log: Logger) -> Self {
        Self {
            baseurl: baseurl.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
            log,
        }
    }

    pub fn baseurl(&self) -> &str {
        &self.baseurl
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.baseurl, path)
    }

    async fn send(&self, rb: RequestBuilder) -> Result<reqwest::Response, Error> {
        let request = rb.build()?;
        debug!(self.log, "{} {}", request.method(), request.url());
        let response = self.http.execute(request).await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.message,
            Err(_) => status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string(),
        };
        Err(Error::Daemon { status, message })
    }

    async fn call<T: DeserializeOwned>(
        &self,
        rb: RequestBuilder,
    ) -> Result<T, Error> {
        Ok(self.send(rb).await?.json().await?)
    }

    pub async fn install_routes(
        &self,
        body: &InstallRequest,
    ) -> Result<RunStarted, Error> {
        self.call(self.http.put(self.url("/routes/install")).json(body))
            .await
    }

    pub async fn remove_routes(
        &self,
        body: &RemoveRequest,
    ) -> Result<RunStarted, Error> {
        self.call(self.http.put(self.url("/routes/remove")).json(body))
            .await
    }

    pub async fn cancel_run(&self) -> Result<RunCancelled, Error> {
        self.call(self.http.delete(self.url("/routes/run"))).await
    }

    pub async fn get_route_data(&self) -> Result<RunReport, Error> {
        self.call(self.http.get(self.url("/data/route"))).await
    }

    pub async fn watch_nexthop(
        &self,
        body: &WatchNexthopRequest,
    ) -> Result<(), Error> {
        self.send(self.http.put(self.url("/nexthop/watch")).json(body))
            .await?;
        Ok(())
    }

    pub async fn get_nexthop_data(
        &self,
    ) -> Result<Vec<NexthopWatchEntry>, Error> {
        self.call(self.http.get(self.url("/data/nexthop"))).await
    }

    pub async fn get_nexthop_entry(
        &self,
        addr: IpAddr,
    ) -> Result<NexthopWatchEntry, Error> {
        self.call(self.http.get(self.url(&format!("/data/nexthop/{addr}"))))
            .await
    }

    pub async fn set_vrf_label(
        &self,
        body: &VrfLabelRequest,
    ) -> Result<(), Error> {
        self.send(self.http.put(self.url("/vrf/label")).json(body))
            .await?;
        Ok(())
    }

    pub async fn get_debugging(&self) -> Result<DebuggingStatus, Error> {
        self.call(self.http.get(self.url("/debugging"))).await
    }
}
