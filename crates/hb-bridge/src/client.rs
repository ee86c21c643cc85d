//! JSON-RPC client session over one helper connection
//!
//! A background reader task owns the inbound half of the transport. It
//! resolves pending calls by request id and runs notification handlers
//! inline, in arrival order, so a handler always observes every
//! notification the helper sent before the response to a call.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use futures::{SinkExt, StreamExt};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::{oneshot, Mutex};
use tokio_util::codec::{FramedRead, FramedWrite};
use tokio_util::sync::CancellationToken;

use hb_protocol::{
    error_codes, ErrorObject, Frame, JsonLineCodec, Message, Notification, NotificationDescriptor,
    ProtocolError, Request, RequestDescriptor, RequestId, Response,
};

use crate::error::{BridgeError, RemoteError};

type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;
type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;
type SharedWriter = Arc<Mutex<FramedWrite<BoxedWriter, JsonLineCodec>>>;

type NotificationHandler = Arc<dyn Fn(Value) -> Result<(), serde_json::Error> + Send + Sync>;
type WarningHandler = Arc<dyn Fn(&str) + Send + Sync>;

/// Byte stream to a helper, split in two halves
pub struct Transport {
    reader: BoxedReader,
    writer: BoxedWriter,
}

impl Transport {
    pub fn new(
        reader: impl AsyncRead + Send + Unpin + 'static,
        writer: impl AsyncWrite + Send + Unpin + 'static,
    ) -> Self {
        Self {
            reader: Box::new(reader),
            writer: Box::new(writer),
        }
    }

    pub fn from_tcp(stream: TcpStream) -> Self {
        let (reader, writer) = stream.into_split();
        Self::new(reader, writer)
    }
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport").finish_non_exhaustive()
    }
}

#[derive(Default)]
struct Handlers {
    notifications: RwLock<HashMap<String, Vec<NotificationHandler>>>,
    warnings: RwLock<Vec<WarningHandler>>,
}

impl Handlers {
    fn warn(&self, message: &str) {
        let handlers = self.warnings.read().clone();
        if handlers.is_empty() {
            tracing::warn!("(helper) {}", message);
            return;
        }
        for handler in handlers {
            handler(message);
        }
    }

    fn dispatch(&self, notification: Notification) {
        let handlers = self
            .notifications
            .read()
            .get(&notification.method)
            .cloned()
            .unwrap_or_default();

        if handlers.is_empty() {
            tracing::trace!(method = %notification.method, "Unhandled notification");
            return;
        }

        let params = notification.params.unwrap_or(Value::Null);
        for handler in handlers {
            if let Err(e) = handler(params.clone()) {
                self.warn(&format!(
                    "Invalid params for notification {}: {}",
                    notification.method, e
                ));
            }
        }
    }
}

/// Removes a pending entry when the call future finishes or is dropped
struct PendingGuard<'a> {
    pending: &'a DashMap<RequestId, oneshot::Sender<Response>>,
    id: RequestId,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.pending.remove(&self.id);
    }
}

/// Live RPC connection to one helper
pub struct ClientSession {
    writer: SharedWriter,
    pending: Arc<DashMap<RequestId, oneshot::Sender<Response>>>,
    handlers: Arc<Handlers>,
    next_id: AtomicU64,
    cancel: CancellationToken,
}

impl ClientSession {
    /// Start a session on `transport`
    ///
    /// The session closes when `cancel` fires, when the helper hangs up, or
    /// when the session is dropped.
    pub fn new(transport: Transport, cancel: CancellationToken) -> Self {
        let writer: SharedWriter = Arc::new(Mutex::new(FramedWrite::new(
            transport.writer,
            JsonLineCodec::new(),
        )));
        let pending = Arc::new(DashMap::new());
        let handlers = Arc::new(Handlers::default());

        let reader = FramedRead::new(transport.reader, JsonLineCodec::new());
        tokio::spawn(read_loop(
            reader,
            Arc::clone(&writer),
            Arc::clone(&pending),
            Arc::clone(&handlers),
            cancel.clone(),
        ));

        Self {
            writer,
            pending,
            handlers,
            next_id: AtomicU64::new(1),
            cancel,
        }
    }

    /// Register a handler for notification kind `N`
    pub fn on_notification<N, F>(&self, handler: F)
    where
        N: NotificationDescriptor,
        N::Params: 'static,
        F: Fn(N::Params) + Send + Sync + 'static,
    {
        let wrapped: NotificationHandler =
            Arc::new(move |params: Value| -> Result<(), serde_json::Error> {
                handler(serde_json::from_value(params)?);
                Ok(())
            });
        self.handlers
            .notifications
            .write()
            .entry(N::METHOD.to_string())
            .or_default()
            .push(wrapped);
    }

    /// Register a handler for session-level warnings
    ///
    /// Warnings cover malformed frames, unknown response ids and similar
    /// protocol noise that does not fail any call.
    pub fn on_warning<F>(&self, handler: F)
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.handlers.warnings.write().push(Arc::new(handler));
    }

    /// Call procedure `R`
    pub async fn call<R>(&self, params: R::Params) -> Result<R::Result, BridgeError>
    where
        R: RequestDescriptor,
    {
        let params = serde_json::to_value(&params).map_err(ProtocolError::from)?;
        let result = self.call_raw(R::METHOD, params).await?;
        Ok(decode_result(result)?)
    }

    /// Call `method` with untyped params and result
    pub async fn call_raw(&self, method: &str, params: Value) -> Result<Value, BridgeError> {
        let id = RequestId::from(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = oneshot::channel();
        self.pending.insert(id.clone(), tx);
        let _guard = PendingGuard {
            pending: &*self.pending,
            id: id.clone(),
        };

        if self.cancel.is_cancelled() {
            return Err(BridgeError::ConnectionClosed);
        }

        tracing::trace!(%id, method, "Sending request");
        self.writer
            .lock()
            .await
            .send(Message::from(Request::new(id, method, params)))
            .await?;

        let response = tokio::select! {
            biased;
            response = rx => response.map_err(|_| BridgeError::ConnectionClosed)?,
            _ = self.cancel.cancelled() => return Err(BridgeError::ConnectionClosed),
        };

        response
            .into_result()
            .map_err(|e| RemoteError::from(e).into())
    }

    /// Whether the session has ended
    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Close the session; in-flight calls fail with `ConnectionClosed`
    pub fn close(&self) {
        self.cancel.cancel();
    }
}

impl Drop for ClientSession {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

fn decode_result<T: DeserializeOwned>(value: Value) -> Result<T, ProtocolError> {
    Ok(serde_json::from_value(value)?)
}

async fn read_loop(
    mut reader: FramedRead<BoxedReader, JsonLineCodec>,
    writer: SharedWriter,
    pending: Arc<DashMap<RequestId, oneshot::Sender<Response>>>,
    handlers: Arc<Handlers>,
    cancel: CancellationToken,
) {
    loop {
        let frame = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            frame = reader.next() => frame,
        };

        match frame {
            Some(Ok(Frame::Message(Message::Response(response)))) => {
                let sender = response.id.as_ref().and_then(|id| pending.remove(id));
                match sender {
                    Some((_, tx)) => {
                        let _ = tx.send(response);
                    }
                    None => handlers.warn(&format!(
                        "Received response for unknown request id {}",
                        response
                            .id
                            .as_ref()
                            .map(ToString::to_string)
                            .unwrap_or_else(|| "null".to_string())
                    )),
                }
            }
            Some(Ok(Frame::Message(Message::Notification(notification)))) => {
                handlers.dispatch(notification);
            }
            Some(Ok(Frame::Message(Message::Request(request)))) => {
                handlers.warn(&format!(
                    "Helper called unsupported method {}",
                    request.method
                ));
                let reply = Response::failure(
                    Some(request.id),
                    ErrorObject {
                        code: error_codes::METHOD_NOT_FOUND,
                        message: format!("Method not found: {}", request.method),
                        data: None,
                    },
                );
                if let Err(e) = writer.lock().await.send(Message::from(reply)).await {
                    tracing::debug!("Failed to reject helper request: {}", e);
                }
            }
            Some(Ok(Frame::Malformed { line, error })) => {
                handlers.warn(&format!("Ignoring malformed line ({}): {}", error, line));
            }
            Some(Err(e)) => {
                tracing::debug!("Helper connection failed: {}", e);
                break;
            }
            None => {
                tracing::debug!("Helper closed the connection");
                break;
            }
        }
    }

    pending.clear();
    cancel.cancel();
}
