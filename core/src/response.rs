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
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::channel::oneshot;

use crate::bridge::ByteStream;
use crate::client::ResponseHandler;
use crate::request::ResponseHead;
use crate::{Error, Result};

/// A response paired with its streamed body.
pub struct ResponseSource<T> {
    response: T,
    body: ByteStream,
}

/// Response as delivered by [`StreamResponseHandler`].
pub type InboundResponse = ResponseSource<ResponseHead>;

impl<T: Debug> Debug for ResponseSource<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseSource")
            .field("response", &self.response)
            .finish_non_exhaustive()
    }
}

impl<T> ResponseSource<T> {
    /// Pair `response` with `body`.
    pub fn new(response: T, body: ByteStream) -> Self {
        Self { response, body }
    }

    /// The response metadata.
    pub fn response(&self) -> &T {
        &self.response
    }

    /// Drop the metadata and keep the body.
    pub fn into_body(self) -> ByteStream {
        self.body
    }

    /// Split into metadata and body.
    pub fn into_parts(self) -> (T, ByteStream) {
        (self.response, self.body)
    }
}

/// A [`ResponseHandler`] that resolves a [`ResponseFuture`] once the head and
/// body are available.
pub struct StreamResponseHandler {
    head: Option<ResponseHead>,
    tx: Option<oneshot::Sender<Result<InboundResponse>>>,
}

impl StreamResponseHandler {
    /// Create a handler and the future it completes.
    pub fn prepare() -> (Self, ResponseFuture) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                head: None,
                tx: Some(tx),
            },
            ResponseFuture { rx },
        )
    }

    fn complete(&mut self, res: Result<InboundResponse>) {
        if let Some(tx) = self.tx.take() {
            // The future may be gone already, nobody is left to tell.
            let _ = tx.send(res);
        }
    }
}

impl ResponseHandler for StreamResponseHandler {
    fn on_headers(&mut self, head: ResponseHead) {
        self.head = Some(head);
    }

    fn on_stream(&mut self, body: ByteStream) {
        let res = match self.head.take() {
            Some(head) => Ok(ResponseSource::new(head, body)),
            None => Err(Error::bridge("response body delivered before headers")),
        };
        self.complete(res);
    }

    fn on_error(&mut self, err: &Error) {
        let mut forwarded = Error::new(err.kind(), err.message());

        // The handler only borrows the error, keep its causes as text.
        let mut causes = Vec::new();
        let mut source = std::error::Error::source(err);
        while let Some(cause) = source {
            causes.push(cause.to_string());
            source = cause.source();
        }
        if !causes.is_empty() {
            forwarded = forwarded.with_source(anyhow::Error::msg(causes.join(": ")));
        }

        self.complete(Err(forwarded));
    }
}

/// Future resolved by [`StreamResponseHandler`].
pub struct ResponseFuture {
    rx: oneshot::Receiver<Result<InboundResponse>>,
}

impl Future for ResponseFuture {
    type Output = Result<InboundResponse>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(res)) => Poll::Ready(res),
            Poll::Ready(Err(_)) => Poll::Ready(Err(Error::bridge(
                "handler dropped before response was delivered",
            ))),
            Poll::Pending => Poll::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{AsyncExecuteRequest, AsyncHttpClient, TransportClient};
    use crate::request::OutboundRequest;
    use crate::transport::{HttpTransport, TransportRequest, TransportResponse};
    use crate::ErrorKind;
    use bytes::Bytes;
    use futures::StreamExt;
    use http::uri::Scheme;
    use http::{HeaderMap, HeaderValue, Method, StatusCode};

    #[derive(Debug)]
    struct Echo;

    #[async_trait::async_trait]
    impl HttpTransport for Echo {
        async fn send(&self, req: TransportRequest) -> Result<TransportResponse> {
            let mut headers = HeaderMap::new();
            headers.insert("x-echo-url", HeaderValue::from_str(&req.full_url())?);
            Ok(TransportResponse {
                status: StatusCode::CREATED,
                headers,
                body: crate::bridge::PushBody::from_bytes(Bytes::from_static(b"done")),
            })
        }
    }

    #[tokio::test]
    async fn test_stream_handler_resolves_response() {
        let client = TransportClient::new(Echo);
        let (handler, fut) = StreamResponseHandler::prepare();
        let req = OutboundRequest::new(Method::GET, Scheme::HTTP, "localhost")
            .with_encoded_path("/ping")
            .with_query("q", "1");

        client
            .execute(AsyncExecuteRequest::new(req, handler))
            .await
            .expect("execute must succeed");

        let (head, body) = fut.await.expect("response must resolve").into_parts();
        assert_eq!(head.status, StatusCode::CREATED);
        assert_eq!(head.headers["x-echo-url"], "http://localhost/ping?q=1");

        let chunks: Vec<Bytes> = body.map(|c| c.expect("chunk must be ok")).collect().await;
        assert_eq!(chunks, vec![Bytes::from_static(b"done")]);
    }

    #[tokio::test]
    async fn test_stream_handler_forwards_error() {
        let (mut handler, fut) = StreamResponseHandler::prepare();
        handler.on_error(&Error::transport("refused"));
        handler.on_error(&Error::transport("ignored"));

        let err = fut.await.expect_err("must fail");
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert_eq!(err.message(), "refused");
    }

    #[tokio::test]
    async fn test_stream_handler_keeps_error_cause() {
        let (mut handler, fut) = StreamResponseHandler::prepare();
        let cause = std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "connection refused by peer",
        );
        handler.on_error(&Error::transport("failed to send request").with_source(cause));

        let err = fut.await.expect_err("must fail");
        assert!(err.is_transport_error());
        assert_eq!(err.message(), "failed to send request");
        let source = std::error::Error::source(&err).expect("cause must be kept");
        assert_eq!(source.to_string(), "connection refused by peer");
    }

    #[tokio::test]
    async fn test_dropped_handler_is_bridge_error() {
        let (handler, fut) = StreamResponseHandler::prepare();
        drop(handler);

        let err = fut.await.expect_err("must fail");
        assert!(err.is_bridge_error());
    }

    #[tokio::test]
    async fn test_body_without_headers_is_bridge_error() {
        let (mut handler, fut) = StreamResponseHandler::prepare();
        handler.on_stream(Box::pin(futures::stream::empty()));

        let err = fut.await.expect_err("must fail");
        assert!(err.is_bridge_error());
    }
}
