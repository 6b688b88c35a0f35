//! Rust adapter generation modules.

pub mod client;
pub mod interface;
pub mod server;

pub use client::ClientGenerator;
pub use interface::InterfaceGenerator;
pub use server::ServerGenerator;
