// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Reqwest based [`HttpTransport`] for sigbridge.
//!
//! Request bodies are pulled out of their [`PushBody`] on demand while
//! reqwest writes them, and response bodies are handed back as a push
//! handle over reqwest's byte stream, so neither side is buffered.
//!
//! ```no_run
//! use sigbridge_core::{TransportClient, AsyncHttpClient};
//! use sigbridge_transport_reqwest::ReqwestTransport;
//!
//! let client = TransportClient::new(ReqwestTransport::default());
//! assert_eq!(client.client_name(), "sigbridge");
//! ```

use async_trait::async_trait;
use futures::TryStreamExt;
use http::header::CONTENT_LENGTH;
use http::HeaderValue;
use log::debug;
use reqwest::{Body, Client};
use sigbridge_core::{
    to_pull_stream, to_push_stream, Error, HttpTransport, Result, TransportBody,
    TransportRequest, TransportResponse,
};

/// HttpTransport backed by a [`reqwest::Client`].
#[derive(Debug, Default, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Create a new ReqwestTransport with a reqwest::Client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl From<Client> for ReqwestTransport {
    fn from(client: Client) -> Self {
        Self::new(client)
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, req: TransportRequest) -> Result<TransportResponse> {
        let url = req.full_url();
        let mut builder = self.client.request(req.method, url.as_str());

        let mut headers = req.headers;
        if let Some(body) = req.body {
            if let Some(len) = body.content_length() {
                if !headers.contains_key(CONTENT_LENGTH) {
                    headers.insert(CONTENT_LENGTH, HeaderValue::from(len));
                }
            }
            builder = match body {
                TransportBody::Full(bs) => builder.body(Body::from(bs)),
                TransportBody::Streaming(body) => {
                    builder.body(Body::wrap_stream(to_pull_stream(body)))
                }
            };
        }
        builder = builder.headers(headers);

        debug!("sending request to {url}");
        let resp = builder.send().await.map_err(|err| {
            Error::transport(format!("failed to send request to {url}")).with_source(err)
        })?;

        let status = resp.status();
        let headers = resp.headers().clone();
        let content_length = resp.content_length();
        let stream = resp
            .bytes_stream()
            .map_err(|err| Error::transport("failed to read response body").with_source(err));

        Ok(TransportResponse {
            status,
            headers,
            body: to_push_stream(stream, content_length),
        })
    }
}
