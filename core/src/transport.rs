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

use std::fmt::Debug;
use std::sync::Arc;

use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode};

use crate::bridge::PushBody;
use crate::Result;

/// HttpTransport is the underlying HTTP capability requests are delegated to.
///
/// Implementations own sockets, TLS, pooling and retries. They must return
/// as soon as the status and headers are known and stream the body through
/// the returned [`PushBody`].
#[async_trait::async_trait]
pub trait HttpTransport: Debug + Send + Sync + 'static {
    /// Dispatch the request and return the streamed response.
    async fn send(&self, req: TransportRequest) -> Result<TransportResponse>;
}

#[async_trait::async_trait]
impl<T: HttpTransport + ?Sized> HttpTransport for Arc<T> {
    async fn send(&self, req: TransportRequest) -> Result<TransportResponse> {
        self.as_ref().send(req).await
    }
}

/// Request in the shape the underlying transport consumes.
#[derive(Debug)]
pub struct TransportRequest {
    /// HTTP method.
    pub method: Method,
    /// `scheme://host[:port]/encodedPath`, without query.
    pub url: String,
    /// Percent-encoded query pairs, in order.
    pub query: Vec<(String, String)>,
    /// Headers sent verbatim.
    pub headers: HeaderMap,
    /// Body, absent when nothing must be sent.
    pub body: Option<TransportBody>,
}

impl TransportRequest {
    /// Create a request without query, headers or body.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Render the encoded query string, `None` if there is no query.
    pub fn query_string(&self) -> Option<String> {
        if self.query.is_empty() {
            return None;
        }

        let mut s = String::new();
        for (idx, (k, v)) in self.query.iter().enumerate() {
            if idx != 0 {
                s.push('&');
            }
            s.push_str(k);
            s.push('=');
            s.push_str(v);
        }
        Some(s)
    }

    /// The URL including the encoded query.
    pub fn full_url(&self) -> String {
        match self.query_string() {
            Some(q) => format!("{}?{}", self.url, q),
            None => self.url.clone(),
        }
    }
}

/// Body handed to the transport.
#[derive(Debug)]
pub enum TransportBody {
    /// Bytes already in memory.
    Full(Bytes),
    /// Bytes produced on demand by the transport.
    Streaming(PushBody),
}

impl TransportBody {
    /// Declared length of the body, if known.
    pub fn content_length(&self) -> Option<u64> {
        match self {
            TransportBody::Full(bs) => Some(bs.len() as u64),
            TransportBody::Streaming(body) => body.content_length(),
        }
    }

    /// View the body as a push handle regardless of its representation.
    pub fn into_push_body(self) -> PushBody {
        match self {
            TransportBody::Full(bs) => PushBody::from_bytes(bs),
            TransportBody::Streaming(body) => body,
        }
    }
}

/// Streamed response returned by the transport.
#[derive(Debug)]
pub struct TransportResponse {
    /// Response status.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Response body, produced on demand.
    pub body: PushBody,
}
