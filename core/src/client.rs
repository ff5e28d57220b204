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

use futures::future;
use futures::TryStreamExt;
use log::debug;

use crate::bridge::{to_pull_stream, to_push_stream, ByteStream};
use crate::request::{OutboundRequest, ResponseHead};
use crate::transport::{HttpTransport, TransportBody, TransportRequest, TransportResponse};
use crate::utils::{encode_query_component, is_standard_port};
use crate::{Error, Result};

/// Name reported by [`TransportClient`] unless overridden.
pub const DEFAULT_CLIENT_NAME: &str = "sigbridge";

/// Receiver of a response in push style.
///
/// For one execution the handler observes either `on_headers` followed by
/// exactly one `on_stream`, or exactly one `on_error`. Never both.
pub trait ResponseHandler: Send + 'static {
    /// Status and headers, before any body chunk.
    fn on_headers(&mut self, head: ResponseHead);
    /// The response body as a pull stream.
    fn on_stream(&mut self, body: ByteStream);
    /// The request failed before the response was handed off.
    fn on_error(&mut self, err: &Error);
}

/// A request together with the handler that receives its response.
pub struct AsyncExecuteRequest {
    request: OutboundRequest,
    handler: Box<dyn ResponseHandler>,
}

impl Debug for AsyncExecuteRequest {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncExecuteRequest")
            .field("request", &self.request)
            .finish_non_exhaustive()
    }
}

impl AsyncExecuteRequest {
    /// Pair a request with its response handler.
    pub fn new(request: OutboundRequest, handler: impl ResponseHandler) -> Self {
        Self {
            request,
            handler: Box::new(handler),
        }
    }

    /// The request to send.
    pub fn request(&self) -> &OutboundRequest {
        &self.request
    }
}

/// AsyncHttpClient is the client contract callers issue requests through.
#[async_trait::async_trait]
pub trait AsyncHttpClient: Debug + Send + Sync + 'static {
    /// Send the request and hand the response to its handler.
    ///
    /// Resolves once the response was handed off, not once the body is
    /// drained. Failures after the hand-off surface through the body stream.
    async fn execute(&self, req: AsyncExecuteRequest) -> Result<()>;

    /// Stable name of this client.
    fn client_name(&self) -> &str;

    /// Release resources owned by this client.
    fn close(&self);
}

/// TransportClient implements [`AsyncHttpClient`] on top of a pre-built
/// [`HttpTransport`].
///
/// The transport is owned by whoever built it; closing the client leaves it
/// untouched.
#[derive(Debug, Clone)]
pub struct TransportClient<T> {
    transport: T,
    name: String,
}

impl<T: HttpTransport> TransportClient<T> {
    /// Create a client delegating to `transport`.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            name: DEFAULT_CLIENT_NAME.to_string(),
        }
    }

    /// Override the reported client name.
    pub fn with_client_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Borrow the underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }
}

#[async_trait::async_trait]
impl<T: HttpTransport> AsyncHttpClient for TransportClient<T> {
    async fn execute(&self, req: AsyncExecuteRequest) -> Result<()> {
        let AsyncExecuteRequest { request, handler } = req;
        let mut delivery = Delivery::new(handler);

        let req = build_transport_request(request);
        debug!(
            "{}: dispatching {} {} (body: {:?})",
            self.name,
            req.method,
            req.url,
            req.body.as_ref().map(|b| b.content_length())
        );

        match self.transport.send(req).await {
            Ok(resp) => {
                delivery.deliver(resp);
                Ok(())
            }
            Err(err) => {
                debug!("{}: request failed: {err}", self.name);
                delivery.fail(&err);
                Err(err)
            }
        }
    }

    fn client_name(&self) -> &str {
        &self.name
    }

    fn close(&self) {
        // The transport belongs to its owner.
        debug!("{}: close requested, transport left to its owner", self.name);
    }
}

/// Build `scheme://host[:port]/encodedPath`.
///
/// The port is left out when it is the standard one for the scheme.
pub fn build_url(req: &OutboundRequest) -> String {
    let mut url = format!("{}://{}", req.scheme(), req.host());
    if !is_standard_port(req.scheme(), req.port()) {
        if let Some(port) = req.port() {
            url.push(':');
            url.push_str(&port.to_string());
        }
    }
    url.push_str(req.encoded_path());
    url
}

/// Translate a caller request into the transport's request.
///
/// The body is attached only when its declared length is known and greater
/// than zero.
pub fn build_transport_request(mut request: OutboundRequest) -> TransportRequest {
    let body = request.take_body().and_then(|body| {
        let content_length = body.content_length().filter(|len| *len > 0)?;
        Some(TransportBody::Streaming(to_push_stream(
            body.into_stream(),
            Some(content_length),
        )))
    });

    TransportRequest {
        method: request.method().clone(),
        url: build_url(&request),
        query: request
            .query()
            .iter()
            .map(|(k, v)| (encode_query_component(k), encode_query_component(v)))
            .collect(),
        headers: request.headers().clone(),
        body,
    }
}

/// Tracks which handler callbacks already fired so each execution ends in
/// exactly one outcome.
struct Delivery {
    handler: Box<dyn ResponseHandler>,
    settled: bool,
}

impl Delivery {
    fn new(handler: Box<dyn ResponseHandler>) -> Self {
        Self {
            handler,
            settled: false,
        }
    }

    fn deliver(&mut self, resp: TransportResponse) {
        if self.settled {
            return;
        }
        self.settled = true;

        self.handler
            .on_headers(ResponseHead::new(resp.status, resp.headers));

        let body = to_pull_stream(resp.body)
            .try_filter(|chunk| future::ready(!chunk.is_empty()));
        self.handler.on_stream(Box::pin(body));
    }

    fn fail(&mut self, err: &Error) {
        if self.settled {
            return;
        }
        self.settled = true;
        self.handler.on_error(err);
    }
}

impl Drop for Delivery {
    fn drop(&mut self) {
        // The execute future was dropped before the transport answered.
        if !self.settled {
            self.fail(&Error::transport(
                "request cancelled before the response arrived",
            ));
        }
    }
}
