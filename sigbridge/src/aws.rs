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

//! AWS SigV4 signing with convenience constructors.

pub use sigbridge_aws_v4::*;

#[cfg(feature = "default-context")]
use crate::{default_context, default_transport, DefaultTransport, TransportClient};

/// Client that signs every request before handing it to reqwest.
#[cfg(feature = "default-context")]
pub type DefaultClient = TransportClient<SigningTransport<DefaultTransport>>;

/// Create a signing client for `config`.
///
/// Settings left unset in `config` are filled from the process environment,
/// and credentials and region fall back to the shared AWS profile files.
///
/// ```no_run
/// use sigbridge::aws::{default_client, Config};
/// use sigbridge::AsyncHttpClient;
///
/// let client = default_client(Config::default().with_region("eu-west-1"));
/// assert_eq!(client.client_name(), "sigbridge");
/// ```
#[cfg(feature = "default-context")]
pub fn default_client(config: Config) -> DefaultClient {
    let ctx = default_context();
    let config = config.from_env(&ctx);
    TransportClient::new(SigningTransport::new(default_transport(), ctx, &config))
}
