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

use async_trait::async_trait;
use ini::Properties;
use log::debug;
use sigbridge_core::{Context, ProvideCredential, Result};

use crate::profile::{config_section, load_ini, ProfileFiles};
use crate::{Config, Credential};

/// ProfileCredentialProvider loads AWS credentials from the shared files:
///
/// - `~/.aws/credentials` (or the path specified by `AWS_SHARED_CREDENTIALS_FILE`)
/// - `~/.aws/config` (or the path specified by `AWS_CONFIG_FILE`)
///
/// The credentials file is tried first.
///
/// The profile to use is determined by:
/// 1. The `AWS_PROFILE` environment variable
/// 2. The profile specified via `with_profile()`
/// 3. Default to "default"
#[derive(Debug, Clone, Default)]
pub struct ProfileCredentialProvider {
    files: ProfileFiles,
}

impl ProfileCredentialProvider {
    /// Create a new ProfileCredentialProvider with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use the profile and file locations set on `config`.
    pub fn from_config(config: &Config) -> Self {
        Self {
            files: ProfileFiles {
                profile: config.profile.clone(),
                config_file: config.config_file.clone(),
                credentials_file: config.shared_credentials_file.clone(),
            },
        }
    }

    /// Set the profile name to use.
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.files.profile = Some(profile.into());
        self
    }

    /// Set the path to the config file.
    pub fn with_config_file(mut self, path: impl Into<String>) -> Self {
        self.files.config_file = Some(path.into());
        self
    }

    /// Set the path to the credentials file.
    pub fn with_credentials_file(mut self, path: impl Into<String>) -> Self {
        self.files.credentials_file = Some(path.into());
        self
    }

    async fn load_section(
        &self,
        ctx: &Context,
        path: &str,
        section: &str,
    ) -> Result<Option<Credential>> {
        let Some(conf) = load_ini(ctx, path).await? else {
            return Ok(None);
        };
        let Some(props) = conf.section(Some(section)) else {
            debug!("section {section} not found in {path}");
            return Ok(None);
        };
        Ok(credential_from_props(props))
    }
}

fn credential_from_props(props: &Properties) -> Option<Credential> {
    let ak = props.get("aws_access_key_id")?;
    let sk = props.get("aws_secret_access_key")?;
    Some(Credential {
        access_key_id: ak.to_string(),
        secret_access_key: sk.to_string(),
        session_token: props.get("aws_session_token").map(|s| s.to_string()),
        expires_in: None,
    })
}

#[async_trait]
impl ProvideCredential for ProfileCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        let profile = self.files.profile(ctx);

        let path = self.files.credentials_file(ctx);
        if let Some(cred) = self.load_section(ctx, &path, &profile).await? {
            return Ok(Some(cred));
        }

        let path = self.files.config_file(ctx);
        self.load_section(ctx, &path, &config_section(&profile))
            .await
    }
}
