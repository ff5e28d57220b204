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
use sigbridge_core::{Context, ProvideRegion, Result};

use crate::provide_region::{
    EnvRegionProvider, ProfileRegionProvider, ProvideRegionChain, StaticRegionProvider,
};
use crate::Config;

/// DefaultRegionProvider resolves the region from, in order:
///
/// 1. The region set on the [`Config`], when built with [`Self::with_config`]
/// 2. `AWS_REGION`, then `AWS_DEFAULT_REGION`
/// 3. The `region` key of the active profile
#[derive(Debug)]
pub struct DefaultRegionProvider {
    chain: ProvideRegionChain,
}

impl Default for DefaultRegionProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl DefaultRegionProvider {
    /// Create a new `DefaultRegionProvider`.
    pub fn new() -> Self {
        let chain = ProvideRegionChain::new()
            .push(EnvRegionProvider::new())
            .push(ProfileRegionProvider::new());
        Self { chain }
    }

    /// Prefer the region and profile settings of `config`.
    pub fn with_config(config: &Config) -> Self {
        let mut chain = ProvideRegionChain::new();
        if let Some(region) = &config.region {
            chain = chain.push(StaticRegionProvider::new(region));
        }
        let chain = chain
            .push(EnvRegionProvider::new())
            .push(ProfileRegionProvider::from_config(config));
        Self { chain }
    }
}

#[async_trait]
impl ProvideRegion for DefaultRegionProvider {
    async fn provide_region(&self, ctx: &Context) -> Result<Option<String>> {
        self.chain.provide_region(ctx).await
    }
}
