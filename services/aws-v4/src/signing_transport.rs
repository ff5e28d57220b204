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
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use sigbridge_core::{
    Context, Error, HttpTransport, ProvideCredential, ProvideRegion, Result, SigningCredential,
    TransportRequest, TransportResponse,
};

use crate::body::BufferedBody;
use crate::{
    CachedCredentialProvider, Config, Credential, DefaultCredentialProvider,
    DefaultRegionProvider, LazyRegionProvider, RequestSigner,
};

/// SigningTransport signs every request with AWS SigV4 before handing it to
/// the wrapped transport.
///
/// Credentials and region are asked from their providers on each request,
/// so any caching is up to the providers. The ones wired by [`Self::new`]
/// cache, providers set through the `with_*` builders are used as given.
/// A request that cannot be signed never reaches the wrapped transport.
pub struct SigningTransport<T> {
    inner: T,
    ctx: Context,
    credential: Arc<dyn ProvideCredential<Credential = Credential>>,
    region: Arc<dyn ProvideRegion>,
    service: String,
    body_timeout: Duration,
    content_sha256_header: bool,
}

impl<T: Debug> Debug for SigningTransport<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningTransport")
            .field("inner", &self.inner)
            .field("credential", &self.credential)
            .field("region", &self.region)
            .field("service", &self.service)
            .field("body_timeout", &self.body_timeout)
            .finish_non_exhaustive()
    }
}

impl<T: HttpTransport> SigningTransport<T> {
    /// Wrap `inner`, resolving credentials and region the default way for
    /// `config`.
    ///
    /// The region is resolved once for the lifetime of the transport and the
    /// credential is kept until it is about to expire.
    pub fn new(inner: T, ctx: Context, config: &Config) -> Self {
        Self {
            inner,
            ctx,
            credential: Arc::new(CachedCredentialProvider::new(
                DefaultCredentialProvider::with_config(config),
            )),
            region: Arc::new(LazyRegionProvider::new(
                DefaultRegionProvider::with_config(config),
            )),
            service: config.service.clone(),
            body_timeout: config.body_timeout,
            content_sha256_header: config.content_sha256_header,
        }
    }

    /// Replace the credential provider.
    pub fn with_credential_provider(
        mut self,
        provider: impl ProvideCredential<Credential = Credential>,
    ) -> Self {
        self.credential = Arc::new(provider);
        self
    }

    /// Replace the region provider.
    pub fn with_region_provider(mut self, provider: impl ProvideRegion) -> Self {
        self.region = Arc::new(provider);
        self
    }

    /// Borrow the wrapped transport.
    pub fn inner(&self) -> &T {
        &self.inner
    }

    /// Sign `req`.
    ///
    /// Either every signing header is merged into `req`, overwriting headers
    /// of the same name, or an error of kind `Signing` is returned.
    pub async fn sign(&self, req: TransportRequest) -> Result<TransportRequest> {
        self.try_sign(req).await.map_err(|err| {
            if err.is_signing_error() {
                err
            } else {
                Error::signing(format!("failed to sign request: {err}")).with_source(err)
            }
        })
    }

    async fn try_sign(&self, mut req: TransportRequest) -> Result<TransportRequest> {
        let body = BufferedBody::materialize(req.body.take(), self.body_timeout).await?;

        let cred = self
            .credential
            .provide_credential(&self.ctx)
            .await?
            .ok_or_else(|| Error::signing("no credential found"))?;
        if !cred.is_valid() {
            return Err(Error::signing(format!(
                "credential {cred:?} is invalid or about to expire"
            )));
        }

        let region = self
            .region
            .provide_region(&self.ctx)
            .await?
            .ok_or_else(|| Error::signing("no region found"))?;

        let headers = RequestSigner::new(&self.service, &region)
            .with_content_sha256_header(self.content_sha256_header)
            .sign(&req, &body.payload_hash(), &cred)?;

        for (name, value) in &headers {
            req.headers.insert(name.clone(), value.clone());
        }
        req.body = body.into_transport_body();
        Ok(req)
    }
}

#[async_trait]
impl<T: HttpTransport> HttpTransport for SigningTransport<T> {
    async fn send(&self, req: TransportRequest) -> Result<TransportResponse> {
        let req = self.sign(req).await?;
        debug!("signed {} {} for {}", req.method, req.url, self.service);
        self.inner.send(req).await
    }
}
