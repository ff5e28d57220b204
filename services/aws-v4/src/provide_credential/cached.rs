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
use sigbridge_core::{Context, ProvideCredential, Result, SigningCredential};
use tokio::sync::Mutex;

use crate::Credential;

/// CachedCredentialProvider keeps the last credential of `P` while it is
/// still valid.
///
/// Credentials expiring within two minutes are refreshed. Failed loads are
/// not cached.
#[derive(Debug)]
pub struct CachedCredentialProvider<P> {
    inner: P,
    cached: Mutex<Option<Credential>>,
}

impl<P> CachedCredentialProvider<P>
where
    P: ProvideCredential<Credential = Credential>,
{
    /// Wrap `inner` with a cache.
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            cached: Mutex::new(None),
        }
    }
}

#[async_trait]
impl<P> ProvideCredential for CachedCredentialProvider<P>
where
    P: ProvideCredential<Credential = Credential>,
{
    type Credential = Credential;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        let mut cached = self.cached.lock().await;
        if let Some(cred) = cached.as_ref().filter(|c| c.is_valid()) {
            return Ok(Some(cred.clone()));
        }

        debug!("cached credential missing or expired, reloading");
        let cred = self.inner.provide_credential(ctx).await?;
        *cached = cred.clone();
        Ok(cred)
    }
}
