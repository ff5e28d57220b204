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

//! AWS SigV4 signing for sigbridge transports.
//!
//! [`SigningTransport`] wraps any [`HttpTransport`](sigbridge_core::HttpTransport)
//! and signs each request right before it is dispatched:
//!
//! 1. the body is drained into memory with a bounded wait, hashed, and
//!    replayed to the transport unchanged,
//! 2. query parameters are decoded and re-encoded canonically,
//! 3. credential and region are resolved from their providers,
//! 4. the SigV4 headers are merged into the request.
//!
//! ## Example
//!
//! ```no_run
//! use sigbridge_aws_v4::{Config, SigningTransport};
//! use sigbridge_core::{Context, HttpTransport, OsEnv, TransportClient};
//! use sigbridge_file_read_tokio::TokioFileRead;
//!
//! # fn example(transport: impl HttpTransport) {
//! let ctx = Context::new().with_file_read(TokioFileRead).with_env(OsEnv);
//! let config = Config::default().from_env(&ctx);
//!
//! let client = TransportClient::new(SigningTransport::new(transport, ctx, &config));
//! # }
//! ```

mod constants;
pub use constants::API_GATEWAY_SERVICE_NAME;

mod config;
pub use config::Config;

mod credential;
pub use credential::Credential;

mod profile;

mod provide_credential;
pub use provide_credential::*;

mod provide_region;
pub use provide_region::*;

mod query;
pub use query::decode_query_component;

mod body;
pub use body::BufferedBody;

mod sign_request;
pub use sign_request::RequestSigner;

mod signing_transport;
pub use signing_transport::SigningTransport;
