//! # thriftgen runtime
//!
//! Runtime support for adapters generated by thriftgen.
//!
//! This crate provides:
//! - The per-call [`Context`] with deadline support
//! - The [`TStruct`] contract for argument and result structs
//! - The [`TChanClient`] transport trait and typed call helpers
//! - Tagged method [`Handler`]s, the [`TChanServer`] trait and the [`Dispatcher`]
//! - [`LocalClient`], an in-memory transport
//!
//! Generated code refers to this crate through a single path, so everything
//! it needs is re-exported here, including `async_trait` and `Bytes`.

pub mod client;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod local;
pub mod protocol;

pub use async_trait::async_trait;
pub use bytes::Bytes;
pub use client::{TChanClient, call, call_oneway};
pub use context::Context;
pub use dispatcher::{Dispatcher, TChanServer};
pub use error::{Error, ProtocolError};
pub use handler::{Handler, HandlerMap};
pub use local::LocalClient;
pub use protocol::{TStruct, decode, encode};
