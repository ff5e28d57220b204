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

use std::fmt::{Debug, Formatter};

use bytes::Bytes;
use futures::Stream;
use http::header::HeaderName;
use http::uri::Scheme;
use http::{HeaderMap, HeaderValue, Method, StatusCode};

use crate::bridge::ByteStream;
use crate::Result;

/// Description of a request the caller wants sent.
///
/// Built once per request and consumed by the client that executes it.
pub struct OutboundRequest {
    method: Method,
    scheme: Scheme,
    host: String,
    port: Option<u16>,
    encoded_path: String,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    body: Option<RequestBody>,
}

impl Debug for OutboundRequest {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutboundRequest")
            .field("method", &self.method)
            .field("scheme", &self.scheme)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("encoded_path", &self.encoded_path)
            .field("query", &self.query)
            .field("headers", &self.headers)
            .field("body", &self.body)
            .finish()
    }
}

impl OutboundRequest {
    /// Create a request for `method` against `scheme://host`.
    pub fn new(method: Method, scheme: Scheme, host: impl Into<String>) -> Self {
        Self {
            method,
            scheme,
            host: host.into(),
            port: None,
            encoded_path: String::new(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Set the port explicitly.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set the path. It must already be percent-encoded.
    pub fn with_encoded_path(mut self, path: impl Into<String>) -> Self {
        self.encoded_path = path.into();
        self
    }

    /// Append a raw, not yet encoded, query parameter. Repeated names are kept.
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// Append a header value. Repeated names are kept.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Attach a body.
    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = Some(body);
        self
    }

    /// HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Protocol scheme.
    pub fn scheme(&self) -> &Scheme {
        &self.scheme
    }

    /// Host without port.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Port, if one was given.
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Percent-encoded path.
    pub fn encoded_path(&self) -> &str {
        &self.encoded_path
    }

    /// Raw query parameters in insertion order.
    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    /// Request headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Body, if any.
    pub fn body(&self) -> Option<&RequestBody> {
        self.body.as_ref()
    }

    /// Split off the body so the rest can be read while the body is handed on.
    pub fn take_body(&mut self) -> Option<RequestBody> {
        self.body.take()
    }
}

/// Finite, single-pass producer of request body chunks.
pub struct RequestBody {
    stream: ByteStream,
    content_length: Option<u64>,
}

impl Debug for RequestBody {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestBody")
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

impl RequestBody {
    /// Body backed by a stream with an optional declared length.
    pub fn from_stream<S>(stream: S, content_length: Option<u64>) -> Self
    where
        S: Stream<Item = Result<Bytes>> + Send + 'static,
    {
        Self {
            stream: Box::pin(stream),
            content_length,
        }
    }

    /// Body holding `bs` in a single chunk.
    pub fn from_bytes(bs: impl Into<Bytes>) -> Self {
        let bs = bs.into();
        let len = bs.len() as u64;
        Self::from_stream(futures::stream::once(async move { Ok(bs) }), Some(len))
    }

    /// Declared total length.
    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    /// Give up the underlying stream.
    pub fn into_stream(self) -> ByteStream {
        self.stream
    }
}

/// Status and headers of a response, available before any body chunk.
#[derive(Debug, Clone)]
pub struct ResponseHead {
    /// Response status.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
}

impl ResponseHead {
    /// Create a response head.
    pub fn new(status: StatusCode, headers: HeaderMap) -> Self {
        Self { status, headers }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use http::header::CONTENT_TYPE;

    #[test]
    fn test_builder_keeps_multi_values() {
        let req = OutboundRequest::new(Method::GET, Scheme::HTTPS, "api.example.com")
            .with_encoded_path("/items")
            .with_query("tag", "a")
            .with_query("tag", "b")
            .with_header(CONTENT_TYPE, HeaderValue::from_static("text/plain"))
            .with_header(CONTENT_TYPE, HeaderValue::from_static("text/html"));

        assert_eq!(req.port(), None);
        assert_eq!(
            req.query(),
            &[
                ("tag".to_string(), "a".to_string()),
                ("tag".to_string(), "b".to_string())
            ]
        );
        assert_eq!(req.headers().get_all(CONTENT_TYPE).iter().count(), 2);
        assert!(req.body().is_none());
    }

    #[tokio::test]
    async fn test_request_body_from_bytes() {
        let body = RequestBody::from_bytes("hello");
        assert_eq!(body.content_length(), Some(5));

        let chunks: Vec<_> = body.into_stream().collect().await;
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].as_ref().unwrap(), "hello");
    }
}
