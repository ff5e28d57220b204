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

//! Core components for bridging signed HTTP requests onto a transport.
//!
//! This crate provides the foundational types and traits for the sigbridge
//! ecosystem. Service crates build request signers on top of them and
//! transport crates plug a concrete HTTP client underneath.
//!
//! ## Overview
//!
//! The crate is built around several key concepts:
//!
//! - **Client**: [`AsyncHttpClient`] is what callers issue requests through, [`TransportClient`] implements it over any [`HttpTransport`]
//! - **Bridge**: [`PushBody`] and [`PullStream`] convert between push-based and pull-based byte streams
//! - **Context**: A container that holds implementations for file reading and environment access
//! - **Providers**: [`ProvideCredential`] and [`ProvideRegion`] resolve what signing needs per request
//!
//! ## Example
//!
//! ```no_run
//! use sigbridge_core::{
//!     AsyncExecuteRequest, AsyncHttpClient, HttpTransport, OutboundRequest, Result,
//!     StreamResponseHandler, TransportClient,
//! };
//! use futures::StreamExt;
//! use http::uri::Scheme;
//! use http::Method;
//!
//! # async fn example(transport: impl HttpTransport) -> Result<()> {
//! let client = TransportClient::new(transport);
//!
//! let req = OutboundRequest::new(Method::GET, Scheme::HTTPS, "api.example.com")
//!     .with_encoded_path("/items");
//! let (handler, response) = StreamResponseHandler::prepare();
//! client.execute(AsyncExecuteRequest::new(req, handler)).await?;
//!
//! let (head, mut body) = response.await?.into_parts();
//! println!("status: {}", head.status);
//! while let Some(chunk) = body.next().await {
//!     println!("read {} bytes", chunk?.len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Utilities
//!
//! The crate also provides utility modules:
//!
//! - [`hash`]: Cryptographic hashing utilities
//! - [`time`]: Time manipulation utilities
//! - [`utils`]: General utilities including data redaction

// Make sure all our public APIs have docs.
#![warn(missing_docs)]

pub mod hash;
pub mod time;
pub mod utils;

mod error;
pub use error::{Error, ErrorKind, Result};
mod context;
pub use context::{Context, Env, FileRead, NoopEnv, NoopFileRead, OsEnv, StaticEnv};
mod api;
pub use api::{ProvideCredential, ProvideRegion, SigningCredential};

mod bridge;
pub use bridge::{
    to_pull_stream, to_push_stream, ByteStream, PullStream, PushBody, Subscriber, Subscription,
};
mod request;
pub use request::{OutboundRequest, RequestBody, ResponseHead};
mod transport;
pub use transport::{HttpTransport, TransportBody, TransportRequest, TransportResponse};
mod client;
pub use client::{
    build_transport_request, build_url, AsyncExecuteRequest, AsyncHttpClient, ResponseHandler,
    TransportClient, DEFAULT_CLIENT_NAME,
};
mod response;
pub use response::{InboundResponse, ResponseFuture, ResponseSource, StreamResponseHandler};
