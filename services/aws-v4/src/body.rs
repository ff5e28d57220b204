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

use std::time::Duration;

use bytes::{Bytes, BytesMut};
use log::debug;
use sigbridge_core::hash::hex_sha256;
use sigbridge_core::{Error, PushBody, Result, Subscriber, TransportBody};

/// A request body held fully in memory so that it can be hashed and then
/// replayed byte for byte.
///
/// This is the only place that buffers a whole payload.
#[derive(Debug, Clone, Default)]
pub struct BufferedBody {
    bytes: Option<Bytes>,
}

impl BufferedBody {
    /// Drain `body` into memory, giving up after `timeout`.
    ///
    /// Bodies already in memory are used as they are. A missing body stays
    /// missing and hashes as the empty payload.
    pub async fn materialize(body: Option<TransportBody>, timeout: Duration) -> Result<Self> {
        let bytes = match body {
            None => None,
            Some(TransportBody::Full(bs)) => Some(bs),
            Some(TransportBody::Streaming(body)) => {
                let bs = tokio::time::timeout(timeout, drain(body))
                    .await
                    .map_err(|_| {
                        Error::signing(format!(
                            "request body was not drained within {timeout:?}"
                        ))
                    })??;
                debug!("drained {} bytes of request body for signing", bs.len());
                Some(bs)
            }
        };
        Ok(Self { bytes })
    }

    /// The buffered bytes, empty when there is no body.
    pub fn as_bytes(&self) -> &[u8] {
        self.bytes.as_deref().unwrap_or_default()
    }

    /// Hex encoded SHA-256 of [`Self::as_bytes`].
    pub fn payload_hash(&self) -> String {
        hex_sha256(self.as_bytes())
    }

    /// Re-present the buffered bytes to the transport.
    ///
    /// An empty buffer is dropped so that no zero-length payload is sent,
    /// whatever length the original body declared.
    pub fn into_transport_body(self) -> Option<TransportBody> {
        self.bytes
            .filter(|bs| !bs.is_empty())
            .map(TransportBody::Full)
    }
}

async fn drain(body: PushBody) -> Result<Bytes> {
    let capacity = body
        .content_length()
        .and_then(|len| usize::try_from(len).ok())
        .unwrap_or_default();
    let mut sub = body.subscribe(Collector {
        buf: BytesMut::with_capacity(capacity),
        error: None,
    });
    while sub.request(usize::MAX).await > 0 {}

    let collector = sub.into_subscriber();
    match collector.error {
        Some(err) => Err(Error::signing("failed to drain request body").with_source(err)),
        None => Ok(collector.buf.freeze()),
    }
}

struct Collector {
    buf: BytesMut,
    error: Option<Error>,
}

impl Subscriber for Collector {
    fn on_next(&mut self, chunk: Bytes) {
        self.buf.extend_from_slice(&chunk);
    }

    fn on_error(&mut self, err: Error) {
        self.error = Some(err);
    }

    fn on_complete(&mut self) {}
}
