//! # thriftgen demo
//!
//! The Echo service from `idl/echo.thrift`, generated at build time and wired
//! to hand-written upstream structs.
//!
//! - [`types`] - Argument, result and exception structs (encoded with bitcode)
//! - [`echo`] - Generated traits, clients and servers
//! - [`EchoService`] - An implementation of the `Echo` service

use parking_lot::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};
use thriftgen_runtime::{Context, Error};

/// Upstream structs the generated adapters encode and decode.
pub mod types {
    use bitcode::{Decode, Encode};
    use thriftgen_runtime::{Bytes, ProtocolError, TStruct};

    macro_rules! impl_tstruct {
        ($($name:ty),* $(,)?) => {
            $(
                impl TStruct for $name {
                    fn write(&self) -> Result<Bytes, ProtocolError> {
                        Ok(Bytes::from(bitcode::encode(self)))
                    }

                    fn read(buf: &[u8]) -> Result<Self, ProtocolError> {
                        bitcode::decode(buf)
                            .map_err(|e| ProtocolError::decode::<Self>(e.to_string()))
                    }
                }
            )*
        };
    }

    /// The service cannot serve the request.
    #[derive(Debug, Clone, Default, PartialEq, Eq, Encode, Decode)]
    pub struct Unavailable {
        pub reason: String,
    }

    /// The service is overloaded.
    #[derive(Debug, Clone, Default, PartialEq, Eq, Encode, Decode)]
    pub struct Overloaded {
        pub retry_after_ms: i32,
    }

    pub type Busy = Overloaded;

    #[derive(Debug, Default, Encode, Decode)]
    pub struct BaseHealthArgs {}

    #[derive(Debug, Default, Encode, Decode)]
    pub struct BaseHealthResult {
        pub success: Option<String>,
    }

    #[derive(Debug, Default, Encode, Decode)]
    pub struct EchoPingArgs {
        pub arg1: String,
    }

    #[derive(Debug, Default, Encode, Decode)]
    pub struct EchoPingResult {
        pub success: Option<String>,
    }

    #[derive(Debug, Default, Encode, Decode)]
    pub struct EchoFireAndForgetArgs {
        pub arg1: String,
    }

    #[derive(Debug, Default, Encode, Decode)]
    pub struct EchoRepeatArgs {
        pub text: String,
        pub times: i32,
    }

    #[derive(Debug, Default, Encode, Decode)]
    pub struct EchoRepeatResult {
        pub success: Option<Vec<String>>,
        pub unavailable: Option<Unavailable>,
        pub busy: Option<Busy>,
    }

    #[derive(Debug, Default, Encode, Decode)]
    pub struct EchoResetArgs {}

    #[derive(Debug, Default, Encode, Decode)]
    pub struct EchoResetResult {
        pub unavailable: Option<Unavailable>,
    }

    #[derive(Debug, Default, Encode, Decode)]
    pub struct EchoCountArgs {}

    #[derive(Debug, Default, Encode, Decode)]
    pub struct EchoCountResult {
        pub success: Option<i64>,
    }

    impl_tstruct!(
        BaseHealthArgs,
        BaseHealthResult,
        EchoPingArgs,
        EchoPingResult,
        EchoFireAndForgetArgs,
        EchoRepeatArgs,
        EchoRepeatResult,
        EchoResetArgs,
        EchoResetResult,
        EchoCountArgs,
        EchoCountResult,
    );
}

/// Generated adapters for `idl/echo.thrift`.
pub mod echo {
    include!(concat!(env!("OUT_DIR"), "/echo/tchan-echo.rs"));
}

use echo::{EchoRepeatError, EchoResetError, TChanBase, TChanEcho};
use types::{Overloaded, Unavailable};

/// Most copies `repeat` hands out in one reply.
pub const MAX_REPEAT: i32 = 100;

/// Echo service implementation.
#[derive(Debug, Default)]
pub struct EchoService {
    pings: AtomicI64,
    fired: Mutex<Vec<String>>,
}

impl EchoService {
    /// Creates a new service.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the payloads received through `fireAndForget`, oldest first.
    #[must_use]
    pub fn fired(&self) -> Vec<String> {
        self.fired.lock().clone()
    }
}

#[thriftgen_runtime::async_trait]
impl TChanBase for EchoService {
    async fn health(&self, _ctx: &Context) -> Result<String, Error> {
        Ok("ok".to_string())
    }
}

#[thriftgen_runtime::async_trait]
impl TChanEcho for EchoService {
    async fn health(&self, ctx: &Context) -> Result<String, Error> {
        TChanBase::health(self, ctx).await
    }

    async fn ping(&self, _ctx: &Context, arg1: String) -> Result<String, Error> {
        self.pings.fetch_add(1, Ordering::SeqCst);
        Ok(arg1)
    }

    async fn fire_and_forget(&self, _ctx: &Context, arg1: String) -> Result<(), Error> {
        tracing::debug!(payload = %arg1, "fire and forget");
        self.fired.lock().push(arg1);
        Ok(())
    }

    async fn repeat(
        &self,
        _ctx: &Context,
        text: String,
        times: i32,
    ) -> Result<Vec<String>, EchoRepeatError> {
        if times < 0 {
            return Err(EchoRepeatError::Unavailable(Unavailable {
                reason: format!("cannot repeat {} times", times),
            }));
        }
        if times > MAX_REPEAT {
            return Err(EchoRepeatError::Busy(Overloaded {
                retry_after_ms: 250,
            }));
        }
        Ok(vec![text; times as usize])
    }

    async fn reset(&self, _ctx: &Context) -> Result<(), EchoResetError> {
        if self.pings.swap(0, Ordering::SeqCst) == 0 {
            return Err(EchoResetError::Unavailable(Unavailable {
                reason: "nothing to reset".to_string(),
            }));
        }
        Ok(())
    }

    async fn count(&self, _ctx: &Context) -> Result<i64, Error> {
        Ok(self.pings.load(Ordering::SeqCst))
    }
}
