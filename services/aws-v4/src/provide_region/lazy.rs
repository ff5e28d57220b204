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
use tokio::sync::OnceCell;

/// LazyRegionProvider resolves the region of `P` on first use and keeps it
/// for its own lifetime.
///
/// A failed resolution is not kept, the next call tries again. An absent
/// region is kept like any other answer.
#[derive(Debug)]
pub struct LazyRegionProvider<P> {
    inner: P,
    region: OnceCell<Option<String>>,
}

impl<P: ProvideRegion> LazyRegionProvider<P> {
    /// Wrap `inner`.
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            region: OnceCell::new(),
        }
    }
}

#[async_trait]
impl<P: ProvideRegion> ProvideRegion for LazyRegionProvider<P> {
    async fn provide_region(&self, ctx: &Context) -> Result<Option<String>> {
        let region = self
            .region
            .get_or_try_init(|| async {
                let region = self.inner.provide_region(ctx).await?;
                debug!("resolved region once: {region:?}");
                Ok::<_, sigbridge_core::Error>(region)
            })
            .await?;
        Ok(region.clone())
    }
}
