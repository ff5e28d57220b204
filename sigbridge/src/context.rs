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

use sigbridge_core::{Context, OsEnv};
use sigbridge_file_read_tokio::TokioFileRead;
use sigbridge_transport_reqwest::ReqwestTransport;

/// Transport used when nothing else is configured.
pub type DefaultTransport = ReqwestTransport;

/// Context reading files through tokio and the environment from the OS.
pub fn default_context() -> Context {
    Context::new().with_file_read(TokioFileRead).with_env(OsEnv)
}

/// Reqwest transport with a default client.
///
/// Use [`ReqwestTransport::new`] to bring a tuned `reqwest::Client`.
pub fn default_transport() -> DefaultTransport {
    ReqwestTransport::default()
}
