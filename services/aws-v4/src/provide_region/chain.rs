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
use log::{debug, warn};
use sigbridge_core::{Context, ProvideRegion, Result};

/// ProvideRegionChain tries a list of region providers in order.
///
/// The first provider returning a region wins. Errors are logged and the
/// next provider is tried.
#[derive(Debug, Default)]
pub struct ProvideRegionChain {
    providers: Vec<Box<dyn ProvideRegion>>,
}

impl ProvideRegionChain {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a region provider to the chain.
    pub fn push(mut self, provider: impl ProvideRegion) -> Self {
        self.providers.push(Box::new(provider));
        self
    }
}

#[async_trait]
impl ProvideRegion for ProvideRegionChain {
    async fn provide_region(&self, ctx: &Context) -> Result<Option<String>> {
        for provider in &self.providers {
            match provider.provide_region(ctx).await {
                Ok(Some(region)) => {
                    debug!("loaded region {region} from provider: {provider:?}");
                    return Ok(Some(region));
                }
                Ok(None) => {}
                Err(e) => warn!("error loading region from provider {provider:?}: {e}"),
            }
        }
        Ok(None)
    }
}
