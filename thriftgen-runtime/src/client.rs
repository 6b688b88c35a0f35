//! Client side of the generic transport.

use crate::context::Context;
use crate::error::Error;
use crate::protocol::{TStruct, decode, encode};
use async_trait::async_trait;
use bytes::Bytes;
use std::future::Future;

/// A transport that can carry calls keyed by service and method name.
///
/// Implementations only move opaque envelopes; argument and result structs are
/// encoded by the caller.
#[async_trait]
pub trait TChanClient: Send + Sync {
    /// Sends a call and waits for the reply envelope.
    ///
    /// # Errors
    /// Returns an error if the call cannot be delivered or no reply arrives.
    async fn call(
        &self,
        ctx: &Context,
        service: &str,
        method: &str,
        envelope: Bytes,
    ) -> Result<Bytes, Error>;

    /// Sends a call that has no reply. Returns once the send completes.
    ///
    /// # Errors
    /// Returns an error if the call cannot be delivered.
    async fn call_oneway(
        &self,
        ctx: &Context,
        service: &str,
        method: &str,
        envelope: Bytes,
    ) -> Result<(), Error>;
}

/// Encodes `args`, performs a two-way call and decodes the reply.
///
/// The call fails with `Error::DeadlineExceeded` without touching the
/// transport if the context has already expired, and the wait for the reply
/// is bounded by the time remaining.
///
/// # Errors
/// Returns transport, protocol and deadline errors.
pub async fn call<A: TStruct, R: TStruct>(
    client: &dyn TChanClient,
    ctx: &Context,
    service: &str,
    method: &str,
    args: &A,
) -> Result<R, Error> {
    if ctx.is_expired() {
        return Err(Error::DeadlineExceeded);
    }
    let envelope = encode(args)?;
    tracing::trace!(service, method, bytes = envelope.len(), "two-way call");
    let reply = within_deadline(ctx, client.call(ctx, service, method, envelope)).await?;
    decode(&reply)
}

/// Encodes `args` and performs a oneway call.
///
/// # Errors
/// Returns transport, protocol and deadline errors.
pub async fn call_oneway<A: TStruct>(
    client: &dyn TChanClient,
    ctx: &Context,
    service: &str,
    method: &str,
    args: &A,
) -> Result<(), Error> {
    if ctx.is_expired() {
        return Err(Error::DeadlineExceeded);
    }
    let envelope = encode(args)?;
    tracing::trace!(service, method, bytes = envelope.len(), "oneway call");
    within_deadline(ctx, client.call_oneway(ctx, service, method, envelope)).await
}

async fn within_deadline<T, F>(ctx: &Context, fut: F) -> Result<T, Error>
where
    F: Future<Output = Result<T, Error>>,
{
    match ctx.remaining() {
        Some(remaining) => tokio::time::timeout(remaining, fut)
            .await
            .map_err(|_| Error::DeadlineExceeded)?,
        None => fut.await,
    }
}
