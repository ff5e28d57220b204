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
use log::debug;
use sigbridge_core::{Context, ProvideRegion, Result};

use crate::profile::{config_section, load_ini, ProfileFiles};
use crate::Config;

/// ProfileRegionProvider reads the `region` key of the active profile in
/// `~/.aws/config` (or the path specified by `AWS_CONFIG_FILE`).
#[derive(Debug, Clone, Default)]
pub struct ProfileRegionProvider {
    files: ProfileFiles,
}

impl ProfileRegionProvider {
    /// Create a new ProfileRegionProvider with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use the profile and config file set on `config`.
    pub fn from_config(config: &Config) -> Self {
        Self {
            files: ProfileFiles {
                profile: config.profile.clone(),
                config_file: config.config_file.clone(),
                credentials_file: None,
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
}

#[async_trait]
impl ProvideRegion for ProfileRegionProvider {
    async fn provide_region(&self, ctx: &Context) -> Result<Option<String>> {
        let path = self.files.config_file(ctx);
        let Some(conf) = load_ini(ctx, &path).await? else {
            return Ok(None);
        };

        let section = config_section(&self.files.profile(ctx));
        let region = conf
            .section(Some(section.as_str()))
            .and_then(|props| props.get("region"))
            .map(|v| v.to_string());
        if region.is_none() {
            debug!("no region in section {section} of {path}");
        }
        Ok(region)
    }
}
