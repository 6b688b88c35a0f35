//! Dispatcher routing calls to handlers by service and method name.

use crate::context::Context;
use crate::error::Error;
use crate::handler::{Handler, HandlerMap};
use bytes::Bytes;
use std::collections::HashMap;

/// A service implementation exposed as a map of method handlers.
///
/// Generated `TChan{Service}Server` types implement this trait.
pub trait TChanServer: Send + Sync {
    /// Returns the service name the handlers are registered under.
    fn service(&self) -> &str;

    /// Builds the handler for every method of the service.
    fn handlers(&self) -> HandlerMap;
}

/// Routes incoming calls to the registered handlers.
///
/// The handler maps are built once at startup; afterwards the dispatcher is
/// shared immutably (typically behind `Arc`).
#[derive(Debug, Default)]
pub struct Dispatcher {
    services: HashMap<String, HandlerMap>,
}

impl Dispatcher {
    /// Creates a new empty dispatcher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the handlers of a service, replacing any previous registration.
    pub fn register(&mut self, service: impl Into<String>, handlers: HandlerMap) {
        let service = service.into();
        tracing::debug!(service = %service, methods = handlers.len(), "registered service");
        if self.services.insert(service.clone(), handlers).is_some() {
            tracing::warn!(service = %service, "service registered twice, replacing handlers");
        }
    }

    /// Registers a service implementation.
    pub fn register_server<S: TChanServer + ?Sized>(&mut self, server: &S) {
        self.register(server.service(), server.handlers());
    }

    /// Returns true if a handler is registered for the method.
    #[must_use]
    pub fn has_method(&self, service: &str, method: &str) -> bool {
        self.services
            .get(service)
            .is_some_and(|handlers| handlers.contains_key(method))
    }

    /// Finds the handler registered for a call.
    ///
    /// # Errors
    /// Returns `Error::UnknownService` or `Error::UnknownMethod` when nothing
    /// is registered for the call.
    pub fn lookup(&self, service: &str, method: &str) -> Result<&Handler, Error> {
        let Some(handlers) = self.services.get(service) else {
            tracing::warn!("No handlers for service={}", service);
            return Err(Error::UnknownService {
                service: service.to_string(),
            });
        };
        handlers.get(method).ok_or_else(|| {
            tracing::warn!("No handler for service={} method={}", service, method);
            Error::UnknownMethod {
                service: service.to_string(),
                method: method.to_string(),
            }
        })
    }

    /// Handles one call.
    ///
    /// Returns the encoded reply for two-way methods and `None` for oneway
    /// methods.
    ///
    /// # Errors
    /// Returns `Error::UnknownService` or `Error::UnknownMethod` when nothing
    /// is registered for the call, otherwise whatever the handler returns.
    pub async fn handle(
        &self,
        ctx: Context,
        service: &str,
        method: &str,
        envelope: Bytes,
    ) -> Result<Option<Bytes>, Error> {
        match self.lookup(service, method)? {
            Handler::TwoWay(f) => f(ctx, envelope).await.map(Some),
            Handler::Oneway(f) => f(ctx, envelope).await.map(|()| None),
        }
    }
}
