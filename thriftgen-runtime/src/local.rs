//! In-memory transport.

use crate::client::TChanClient;
use crate::context::Context;
use crate::dispatcher::Dispatcher;
use crate::error::Error;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;

/// A [`TChanClient`] that hands calls straight to a [`Dispatcher`] in the
/// same process.
#[derive(Debug, Clone)]
pub struct LocalClient {
    dispatcher: Arc<Dispatcher>,
}

impl LocalClient {
    /// Creates a client over a dispatcher.
    #[must_use]
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Returns the dispatcher.
    #[must_use]
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }
}

#[async_trait]
impl TChanClient for LocalClient {
    async fn call(
        &self,
        ctx: &Context,
        service: &str,
        method: &str,
        envelope: Bytes,
    ) -> Result<Bytes, Error> {
        self.dispatcher
            .handle(ctx.clone(), service, method, envelope)
            .await?
            .ok_or_else(|| {
                Error::transport(format!(
                    "'{}.{}' is oneway and sends no reply",
                    service, method
                ))
            })
    }

    /// Checks that the method is registered, then runs the handler on a
    /// separate task and returns without waiting for it. Handler failures are
    /// logged, never returned.
    async fn call_oneway(
        &self,
        ctx: &Context,
        service: &str,
        method: &str,
        envelope: Bytes,
    ) -> Result<(), Error> {
        self.dispatcher.lookup(service, method)?;

        let dispatcher = Arc::clone(&self.dispatcher);
        let ctx = ctx.clone();
        let service = service.to_string();
        let method = method.to_string();
        tokio::spawn(async move {
            match dispatcher.handle(ctx, &service, &method, envelope).await {
                Ok(None) => {}
                Ok(Some(_)) => {
                    tracing::debug!(%service, %method, "discarding reply of a two-way method");
                }
                Err(err) => {
                    tracing::warn!(%service, %method, error = %err, "oneway handler failed");
                }
            }
        });
        Ok(())
    }
}
