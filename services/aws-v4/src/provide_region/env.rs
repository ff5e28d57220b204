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

use crate::constants::{AWS_DEFAULT_REGION, AWS_REGION};

/// EnvRegionProvider reads `AWS_REGION`, then `AWS_DEFAULT_REGION`.
///
/// Empty values are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvRegionProvider;

impl EnvRegionProvider {
    /// Create a new EnvRegionProvider.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProvideRegion for EnvRegionProvider {
    async fn provide_region(&self, ctx: &Context) -> Result<Option<String>> {
        Ok([AWS_REGION, AWS_DEFAULT_REGION]
            .into_iter()
            .filter_map(|key| ctx.env_var(key))
            .find(|v| !v.is_empty()))
    }
}
