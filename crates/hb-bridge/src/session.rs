//! One-shot calls to the helper
//!
//! Each call gets its own helper instance: start, connect, route logs, call,
//! release. The instance is released exactly once on every path, including
//! when the caller drops the returned future.

use std::sync::Arc;

use serde_json::Value;

use hb_core::{Logger, PackageRegistry};
use hb_protocol::{ProtocolError, RequestDescriptor};

use crate::classify::local_stack;
use crate::client::ClientSession;
use crate::error::BridgeError;
use crate::notify::setup_logging;
use crate::supervisor::{HelperInstance, HelperSupervisor};

/// Runs against the session after logging is wired and before the call
/// is sent, typically to subscribe to notifications
pub type SetupHook = Box<dyn FnOnce(&ClientSession) + Send>;

/// Entry point for calling the helper
pub struct RpcBridge {
    supervisor: HelperSupervisor,
    registry: Arc<dyn PackageRegistry>,
    logger: Arc<dyn Logger>,
}

impl RpcBridge {
    pub fn new(
        supervisor: HelperSupervisor,
        registry: Arc<dyn PackageRegistry>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            supervisor,
            registry,
            logger,
        }
    }

    pub fn supervisor(&self) -> &HelperSupervisor {
        &self.supervisor
    }

    /// Call `R` with the default logger
    pub async fn call<R>(&self, params: R::Params) -> Result<R::Result, BridgeError>
    where
        R: RequestDescriptor,
    {
        self.call_typed::<R>(&self.logger, params, None).await
    }

    /// Call `R`, running `setup` on the session first
    pub async fn call_with_setup<R, F>(
        &self,
        params: R::Params,
        setup: F,
    ) -> Result<R::Result, BridgeError>
    where
        R: RequestDescriptor,
        F: FnOnce(&ClientSession) + Send + 'static,
    {
        self.call_typed::<R>(&self.logger, params, Some(Box::new(setup)))
            .await
    }

    /// Untyped call
    pub async fn call_raw(
        &self,
        method: &str,
        params: Value,
        setup: Option<SetupHook>,
    ) -> Result<Value, BridgeError> {
        self.call_internal(&self.logger, method, params, setup).await
    }

    /// Same calls, logging to `logger` instead of the default
    pub fn with_logger(&self, logger: Arc<dyn Logger>) -> ScopedBridge<'_> {
        ScopedBridge {
            bridge: self,
            logger,
        }
    }

    async fn call_typed<R>(
        &self,
        logger: &Arc<dyn Logger>,
        params: R::Params,
        setup: Option<SetupHook>,
    ) -> Result<R::Result, BridgeError>
    where
        R: RequestDescriptor,
    {
        let params = serde_json::to_value(&params).map_err(ProtocolError::from)?;
        let result = self.call_internal(logger, R::METHOD, params, setup).await?;
        serde_json::from_value(result).map_err(|e| ProtocolError::from(e).into())
    }

    async fn call_internal(
        &self,
        logger: &Arc<dyn Logger>,
        method: &str,
        params: Value,
        setup: Option<SetupHook>,
    ) -> Result<Value, BridgeError> {
        let mut instance = self.supervisor.create_from_registry(self.registry.as_ref())?;

        let result = run_call(&mut instance, logger, method, params, setup).await;
        if let Err(e) = &result {
            log_failure(logger.as_ref(), e);
        }

        instance.cancel();
        result
    }
}

async fn run_call(
    instance: &mut HelperInstance,
    logger: &Arc<dyn Logger>,
    method: &str,
    params: Value,
    setup: Option<SetupHook>,
) -> Result<Value, BridgeError> {
    let client = instance.get_client().await?;
    setup_logging(&client, Arc::clone(logger));
    if let Some(setup) = setup {
        setup(&client);
    }
    client.call_raw(method, params).await
}

fn log_failure(logger: &dyn Logger, error: &BridgeError) {
    logger.error(&format!("Caught helper error: {}", local_stack(error)));
    if let Some(stack) = error.remote().and_then(|remote| remote.remote_stack()) {
        logger.error(&format!("Helper stack:\n{}", stack));
    }
}

/// [`RpcBridge`] bound to a non-default logger
pub struct ScopedBridge<'a> {
    bridge: &'a RpcBridge,
    logger: Arc<dyn Logger>,
}

impl ScopedBridge<'_> {
    pub async fn call<R>(&self, params: R::Params) -> Result<R::Result, BridgeError>
    where
        R: RequestDescriptor,
    {
        self.bridge.call_typed::<R>(&self.logger, params, None).await
    }

    pub async fn call_with_setup<R, F>(
        &self,
        params: R::Params,
        setup: F,
    ) -> Result<R::Result, BridgeError>
    where
        R: RequestDescriptor,
        F: FnOnce(&ClientSession) + Send + 'static,
    {
        self.bridge
            .call_typed::<R>(&self.logger, params, Some(Box::new(setup)))
            .await
    }

    pub async fn call_raw(
        &self,
        method: &str,
        params: Value,
        setup: Option<SetupHook>,
    ) -> Result<Value, BridgeError> {
        self.bridge
            .call_internal(&self.logger, method, params, setup)
            .await
    }
}
