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

//! Streaming bridge between pull-based byte streams and push-based subscribers.
//!
//! Two models meet here:
//!
//! - **Pull**: a [`ByteStream`], the consumer polls for the next chunk.
//! - **Push**: a [`PushBody`] handed to a transport, which subscribes a
//!   [`Subscriber`] and signals demand through [`Subscription::request`].
//!   Chunks arrive through callbacks, never more than requested.
//!
//! [`to_push_stream`] wraps a pull stream into a push handle and
//! [`to_pull_stream`] turns a push handle back into a pull stream using a
//! single-slot handoff. Neither direction buffers more than one chunk.

use std::fmt::{Debug, Formatter};
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use bytes::Bytes;
use futures::future::poll_fn;
use futures::stream::FusedStream;
use futures::Stream;
use log::debug;

use crate::{Error, Result};

/// Pull-based sequence of byte chunks.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send + 'static>>;

/// Push-style consumer of a [`PushBody`].
///
/// Exactly one of `on_complete` or `on_error` is called, at most once, and no
/// `on_next` follows it.
pub trait Subscriber: Send {
    /// A chunk the subscriber asked for.
    fn on_next(&mut self, chunk: Bytes);
    /// Terminal failure.
    fn on_error(&mut self, err: Error);
    /// Terminal success.
    fn on_complete(&mut self);
}

/// A push handle over a finite, single-pass sequence of byte chunks.
pub struct PushBody {
    upstream: ByteStream,
    content_length: Option<u64>,
}

impl Debug for PushBody {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushBody")
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

impl PushBody {
    /// Build a push body that completes immediately.
    pub fn empty() -> Self {
        to_push_stream(futures::stream::empty(), Some(0))
    }

    /// Build a push body that emits `bs` as a single chunk.
    pub fn from_bytes(bs: Bytes) -> Self {
        let len = bs.len() as u64;
        to_push_stream(futures::stream::once(async move { Ok(bs) }), Some(len))
    }

    /// Total length if known up front.
    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    /// Attach a subscriber. Nothing is pulled until the subscription
    /// requests it.
    pub fn subscribe<S: Subscriber>(self, subscriber: S) -> Subscription<S> {
        Subscription {
            upstream: Some(self.upstream),
            subscriber,
            state: State::Active,
        }
    }
}

/// Wrap a pull stream so that a push-based consumer can drive it.
pub fn to_push_stream<S>(stream: S, content_length: Option<u64>) -> PushBody
where
    S: Stream<Item = Result<Bytes>> + Send + 'static,
{
    PushBody {
        upstream: Box::pin(stream),
        content_length,
    }
}

/// Turn a push handle back into a pull stream.
///
/// The returned stream requests one chunk at a time and only when its slot
/// is empty, so a slow consumer throttles the producer instead of growing a
/// buffer.
pub fn to_pull_stream(body: PushBody) -> PullStream {
    PullStream {
        subscription: body.subscribe(Slot::default()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Active,
    Completed,
    Failed,
    Cancelled,
}

/// Demand channel between a [`PushBody`] and its [`Subscriber`].
pub struct Subscription<S> {
    upstream: Option<ByteStream>,
    subscriber: S,
    state: State,
}

impl<S> Debug for Subscription<S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<S: Subscriber> Subscription<S> {
    /// Signal demand for up to `n` chunks and deliver them.
    ///
    /// Resolves once `n` chunks were delivered or the stream terminated, and
    /// returns how many chunks were delivered. Zero demand is a protocol
    /// violation and terminates the subscription with a bridge error.
    pub async fn request(&mut self, n: usize) -> usize {
        if n == 0 {
            self.fail(Error::bridge("demand must be greater than zero"));
            return 0;
        }

        let mut delivered = 0;
        while delivered < n {
            if !poll_fn(|cx| self.poll_deliver(cx)).await {
                break;
            }
            delivered += 1;
        }
        delivered
    }

    /// Pull one chunk from upstream and push it to the subscriber.
    ///
    /// `Ready(true)` means one chunk was delivered, `Ready(false)` means the
    /// subscription is terminated and nothing will be delivered anymore.
    pub fn poll_deliver(&mut self, cx: &mut Context<'_>) -> Poll<bool> {
        let Some(upstream) = self.upstream.as_mut() else {
            return Poll::Ready(false);
        };

        match ready!(upstream.as_mut().poll_next(cx)) {
            Some(Ok(chunk)) => {
                self.subscriber.on_next(chunk);
                Poll::Ready(true)
            }
            Some(Err(err)) => {
                self.fail(err);
                Poll::Ready(false)
            }
            None => {
                self.upstream = None;
                self.state = State::Completed;
                self.subscriber.on_complete();
                Poll::Ready(false)
            }
        }
    }

    /// Stop the upstream and release it.
    ///
    /// The subscriber receives no further signal. Cancelling twice, or after
    /// termination, is a no-op.
    pub fn cancel(&mut self) {
        if self.state != State::Active {
            return;
        }
        debug!("subscription cancelled, releasing upstream");
        self.upstream = None;
        self.state = State::Cancelled;
    }

    /// Whether completion, failure or cancellation already happened.
    pub fn is_terminated(&self) -> bool {
        self.state != State::Active
    }

    /// Whether the subscription was cancelled by the consumer.
    pub fn is_cancelled(&self) -> bool {
        self.state == State::Cancelled
    }

    /// Borrow the subscriber.
    pub fn subscriber(&self) -> &S {
        &self.subscriber
    }

    /// Consume the subscription and return the subscriber.
    ///
    /// The upstream is released as part of this.
    pub fn into_subscriber(self) -> S {
        self.subscriber
    }

    fn fail(&mut self, err: Error) {
        if self.state != State::Active {
            return;
        }
        self.upstream = None;
        self.state = State::Failed;
        self.subscriber.on_error(err);
    }
}

/// Single-slot handoff used by [`PullStream`].
#[derive(Default)]
struct Slot {
    chunk: Option<Bytes>,
    error: Option<Error>,
    done: bool,
}

impl Subscriber for Slot {
    fn on_next(&mut self, chunk: Bytes) {
        if self.done {
            self.error = Some(Error::bridge("chunk delivered after completion"));
        } else if self.chunk.is_some() {
            self.done = true;
            self.error = Some(Error::bridge("chunk delivered without demand"));
        } else {
            self.chunk = Some(chunk);
        }
    }

    fn on_error(&mut self, err: Error) {
        if !self.done {
            self.done = true;
            self.error = Some(err);
        }
    }

    fn on_complete(&mut self) {
        self.done = true;
    }
}

/// Pull stream fed by a [`PushBody`] through a single-slot handoff.
pub struct PullStream {
    subscription: Subscription<Slot>,
}

impl Debug for PullStream {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PullStream")
            .field("subscription", &self.subscription)
            .finish()
    }
}

impl PullStream {
    /// Close the stream early, releasing the producer.
    ///
    /// Subsequent polls yield `None`. Dropping the stream has the same effect.
    pub fn cancel(&mut self) {
        self.subscription.cancel();
        self.subscription.subscriber.chunk = None;
        self.subscription.subscriber.done = true;
    }
}

impl Stream for PullStream {
    type Item = Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            let slot = &mut this.subscription.subscriber;
            if let Some(err) = slot.error.take() {
                slot.chunk = None;
                slot.done = true;
                return Poll::Ready(Some(Err(err)));
            }
            if let Some(chunk) = slot.chunk.take() {
                return Poll::Ready(Some(Ok(chunk)));
            }
            if slot.done {
                return Poll::Ready(None);
            }

            if !ready!(this.subscription.poll_deliver(cx)) {
                // Cancelled subscriptions never reach the subscriber.
                this.subscription.subscriber.done = true;
            }
        }
    }
}

impl FusedStream for PullStream {
    fn is_terminated(&self) -> bool {
        let slot = &self.subscription.subscriber;
        slot.done && slot.chunk.is_none() && slot.error.is_none()
    }
}
