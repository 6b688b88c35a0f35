//! Server-side method handlers.

use crate::context::Context;
use crate::error::Error;
use bytes::Bytes;
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::future::Future;

type TwoWayFn = dyn Fn(Context, Bytes) -> BoxFuture<'static, Result<Bytes, Error>> + Send + Sync;
type OnewayFn = dyn Fn(Context, Bytes) -> BoxFuture<'static, Result<(), Error>> + Send + Sync;

/// Handler for one method, tagged with its call kind.
pub enum Handler {
    /// Decodes the arguments, runs the method and returns the encoded result.
    TwoWay(Box<TwoWayFn>),
    /// Decodes the arguments and runs the method; nothing is sent back.
    Oneway(Box<OnewayFn>),
}

impl Handler {
    /// Creates a two-way handler from an async closure.
    pub fn two_way<F, Fut>(f: F) -> Self
    where
        F: Fn(Context, Bytes) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Bytes, Error>> + Send + 'static,
    {
        Self::TwoWay(Box::new(move |ctx, envelope| Box::pin(f(ctx, envelope))))
    }

    /// Creates a oneway handler from an async closure.
    pub fn oneway<F, Fut>(f: F) -> Self
    where
        F: Fn(Context, Bytes) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), Error>> + Send + 'static,
    {
        Self::Oneway(Box::new(move |ctx, envelope| Box::pin(f(ctx, envelope))))
    }

    /// Returns true for oneway handlers.
    #[must_use]
    pub const fn is_oneway(&self) -> bool {
        matches!(self, Self::Oneway(_))
    }
}

impl std::fmt::Debug for Handler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TwoWay(_) => f.write_str("Handler::TwoWay"),
            Self::Oneway(_) => f.write_str("Handler::Oneway"),
        }
    }
}

/// Handlers of one service keyed by method name.
pub type HandlerMap = HashMap<&'static str, Handler>;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_two_way_handler() {
        let handler = Handler::two_way(|_ctx, envelope| async move { Ok(envelope) });
        assert!(!handler.is_oneway());

        let Handler::TwoWay(f) = handler else {
            panic!("expected a two-way handler");
        };
        let reply = f(Context::new(), Bytes::from_static(b"ping")).await.unwrap();
        assert_eq!(reply, Bytes::from_static(b"ping"));
    }

    #[tokio::test]
    async fn test_oneway_handler() {
        let handler = Handler::oneway(|_ctx, _envelope| async { Ok(()) });
        assert!(handler.is_oneway());
        assert_eq!(format!("{:?}", handler), "Handler::Oneway");

        let Handler::Oneway(f) = handler else {
            panic!("expected a oneway handler");
        };
        f(Context::new(), Bytes::new()).await.unwrap();
    }
}
