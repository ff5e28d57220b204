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
use std::time::Duration;

use sigbridge_core::utils::Redact;
use sigbridge_core::Context;

use crate::constants::*;

/// Config for signing requests against aws services.
#[derive(Clone)]
pub struct Config {
    /// `region` will be loaded from:
    ///
    /// - this field if it's `is_some`
    /// - env value: [`AWS_REGION`], then [`AWS_DEFAULT_REGION`]
    pub region: Option<String>,
    /// `access_key_id` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`AWS_ACCESS_KEY_ID`]
    pub access_key_id: Option<String>,
    /// `secret_access_key` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`AWS_SECRET_ACCESS_KEY`]
    pub secret_access_key: Option<String>,
    /// `session_token` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`AWS_SESSION_TOKEN`]
    pub session_token: Option<String>,
    /// `profile` will be loaded from:
    ///
    /// - env value: [`AWS_PROFILE`]
    /// - this field if it's `is_some`
    /// - default to: `default`
    ///
    /// Profile based providers read [`AWS_PROFILE`] at resolution time, so a
    /// set variable overrides this field.
    pub profile: Option<String>,
    /// `config_file` will be loaded from:
    ///
    /// - this field if it's `is_some`
    /// - env value: [`AWS_CONFIG_FILE`]
    /// - default to: `~/.aws/config`
    pub config_file: Option<String>,
    /// `shared_credentials_file` will be loaded from:
    ///
    /// - this field if it's `is_some`
    /// - env value: [`AWS_SHARED_CREDENTIALS_FILE`]
    /// - default to: `~/.aws/credentials`
    pub shared_credentials_file: Option<String>,
    /// Service name in the credential scope, `execute-api` by default.
    pub service: String,
    /// Time allowed to drain a request body before signing, 30 seconds by default.
    pub body_timeout: Duration,
    /// Send the payload hash as `x-amz-content-sha256`. Off by default.
    pub content_sha256_header: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            region: None,
            access_key_id: None,
            secret_access_key: None,
            session_token: None,
            profile: None,
            config_file: None,
            shared_credentials_file: None,
            service: API_GATEWAY_SERVICE_NAME.to_string(),
            body_timeout: Duration::from_secs(DEFAULT_BODY_TIMEOUT_SECS),
            content_sha256_header: false,
        }
    }
}

impl Debug for Config {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("region", &self.region)
            .field("access_key_id", &Redact::from(&self.access_key_id))
            .field("secret_access_key", &Redact::from(&self.secret_access_key))
            .field("session_token", &Redact::from(&self.session_token))
            .field("profile", &self.profile)
            .field("config_file", &self.config_file)
            .field("shared_credentials_file", &self.shared_credentials_file)
            .field("service", &self.service)
            .field("body_timeout", &self.body_timeout)
            .field("content_sha256_header", &self.content_sha256_header)
            .finish()
    }
}

impl Config {
    /// Fill fields that are still unset from the environment in `ctx`.
    pub fn from_env(mut self, ctx: &Context) -> Self {
        let envs = ctx.env_vars();

        if self.region.is_none() {
            self.region = envs
                .get(AWS_REGION)
                .or_else(|| envs.get(AWS_DEFAULT_REGION))
                .cloned();
        }
        if self.access_key_id.is_none() {
            self.access_key_id = envs.get(AWS_ACCESS_KEY_ID).cloned();
        }
        if self.secret_access_key.is_none() {
            self.secret_access_key = envs.get(AWS_SECRET_ACCESS_KEY).cloned();
        }
        if self.session_token.is_none() {
            self.session_token = envs.get(AWS_SESSION_TOKEN).cloned();
        }
        if self.profile.is_none() {
            self.profile = envs.get(AWS_PROFILE).cloned();
        }
        if self.config_file.is_none() {
            self.config_file = envs.get(AWS_CONFIG_FILE).cloned();
        }
        if self.shared_credentials_file.is_none() {
            self.shared_credentials_file = envs.get(AWS_SHARED_CREDENTIALS_FILE).cloned();
        }
        self
    }

    /// Set the region.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Set the service name used in the credential scope.
    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = service.into();
        self
    }

    /// Set the time allowed to drain a request body.
    pub fn with_body_timeout(mut self, timeout: Duration) -> Self {
        self.body_timeout = timeout;
        self
    }

    /// Send the payload hash as `x-amz-content-sha256`.
    pub fn with_content_sha256_header(mut self, enabled: bool) -> Self {
        self.content_sha256_header = enabled;
        self
    }

    /// Profile name to use, falling back to `default`.
    pub fn profile(&self) -> &str {
        self.profile.as_deref().unwrap_or("default")
    }
}
