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

//! Shared helpers for the `~/.aws/credentials` and `~/.aws/config` files.

use ini::Ini;
use log::debug;
use sigbridge_core::{Context, Error, Result};

use crate::constants::{AWS_CONFIG_FILE, AWS_PROFILE, AWS_SHARED_CREDENTIALS_FILE};

const DEFAULT_CONFIG_FILE: &str = "~/.aws/config";
const DEFAULT_CREDENTIALS_FILE: &str = "~/.aws/credentials";

/// Where profile data lives and which profile to read.
#[derive(Debug, Clone, Default)]
pub(crate) struct ProfileFiles {
    pub profile: Option<String>,
    pub config_file: Option<String>,
    pub credentials_file: Option<String>,
}

impl ProfileFiles {
    /// `AWS_PROFILE` takes precedence over the configured profile.
    pub fn profile(&self, ctx: &Context) -> String {
        ctx.env_var(AWS_PROFILE)
            .or_else(|| self.profile.clone())
            .unwrap_or_else(|| "default".to_string())
    }

    pub fn config_file(&self, ctx: &Context) -> String {
        self.config_file
            .clone()
            .or_else(|| ctx.env_var(AWS_CONFIG_FILE))
            .unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string())
    }

    pub fn credentials_file(&self, ctx: &Context) -> String {
        self.credentials_file
            .clone()
            .or_else(|| ctx.env_var(AWS_SHARED_CREDENTIALS_FILE))
            .unwrap_or_else(|| DEFAULT_CREDENTIALS_FILE.to_string())
    }
}

/// Section name of `profile` inside the config file.
///
/// The credentials file uses the bare name, the config file prefixes every
/// profile but `default` with `profile `.
pub(crate) fn config_section(profile: &str) -> String {
    match profile {
        "default" => "default".to_string(),
        x => format!("profile {x}"),
    }
}

/// Load and parse an ini file.
///
/// A file that cannot be found or read yields `Ok(None)`. A file that exists
/// but does not parse is an error.
pub(crate) async fn load_ini(ctx: &Context, path: &str) -> Result<Option<Ini>> {
    let Some(path) = ctx.expand_home_dir(path) else {
        debug!("failed to expand homedir for path: {path}");
        return Ok(None);
    };

    let content = match ctx.file_read(&path).await {
        Ok(content) => content,
        Err(err) => {
            debug!("failed to read profile file {path}: {err}");
            return Ok(None);
        }
    };

    let conf = Ini::load_from_str(&String::from_utf8_lossy(&content)).map_err(|e| {
        Error::config_invalid(format!("failed to parse profile file {path}"))
            .with_source(anyhow::Error::new(e))
    })?;
    Ok(Some(conf))
}
