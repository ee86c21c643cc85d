//! Shared fixtures: an in-memory helper, a recording logger, and a registry
//! with the helper package installed

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::io::DuplexStream;
use tokio_util::codec::{FramedRead, FramedWrite};

use hb_bridge::{BridgeError, HelperCommand, HelperProcess, Launcher, Transport};
use hb_core::config::HelperConfig;
use hb_core::{Logger, PackageStage, PackageState, PackageTable};
use hb_protocol::{Frame, JsonLineCodec, Message, Notification, Request, Response};

pub const HELPER_PREFIX: &str = "/opt/helper/1.0.0";

/// What the fake helper does with one request
pub enum Reply {
    /// Send the notifications in order, then the response
    Respond {
        notifications: Vec<Notification>,
        response: Response,
    },
    /// Never answer
    Silent,
}

impl Reply {
    pub fn result(request: &Request, result: serde_json::Value) -> Self {
        Reply::Respond {
            notifications: Vec::new(),
            response: Response::success(request.id.clone(), result),
        }
    }
}

pub type Handler = Arc<dyn Fn(&Request) -> Reply + Send + Sync>;

/// Launcher handing out in-memory helpers
pub struct FakeLauncher {
    handler: Handler,
    fail_ready: bool,
    launches: Mutex<Vec<HelperCommand>>,
    terminations: Arc<AtomicUsize>,
}

impl FakeLauncher {
    pub fn new<F>(handler: F) -> Arc<Self>
    where
        F: Fn(&Request) -> Reply + Send + Sync + 'static,
    {
        Arc::new(Self {
            handler: Arc::new(handler),
            fail_ready: false,
            launches: Mutex::new(Vec::new()),
            terminations: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Helpers that start but never become reachable
    pub fn unreachable() -> Arc<Self> {
        Arc::new(Self {
            handler: Arc::new(|_| Reply::Silent),
            fail_ready: true,
            launches: Mutex::new(Vec::new()),
            terminations: Arc::new(AtomicUsize::new(0)),
        })
    }

    pub fn launches(&self) -> Vec<HelperCommand> {
        self.launches.lock().clone()
    }

    pub fn terminations(&self) -> usize {
        self.terminations.load(Ordering::SeqCst)
    }
}

impl Launcher for FakeLauncher {
    fn launch(&self, command: &HelperCommand) -> Result<Box<dyn HelperProcess>, BridgeError> {
        self.launches.lock().push(command.clone());
        Ok(Box::new(FakeProcess {
            handler: Arc::clone(&self.handler),
            fail_ready: self.fail_ready,
            terminations: Arc::clone(&self.terminations),
        }))
    }
}

struct FakeProcess {
    handler: Handler,
    fail_ready: bool,
    terminations: Arc<AtomicUsize>,
}

#[async_trait]
impl HelperProcess for FakeProcess {
    async fn ready(&mut self) -> Result<Transport, BridgeError> {
        if self.fail_ready {
            return Err(BridgeError::NotReady("helper exited (exit status: 1)".into()));
        }

        let (client_read, helper_write) = tokio::io::duplex(64 * 1024);
        let (helper_read, client_write) = tokio::io::duplex(64 * 1024);
        tokio::spawn(serve(helper_read, helper_write, Arc::clone(&self.handler)));
        Ok(Transport::new(client_read, client_write))
    }

    fn terminate(&mut self) {
        self.terminations.fetch_add(1, Ordering::SeqCst);
    }
}

async fn serve(reader: DuplexStream, writer: DuplexStream, handler: Handler) {
    let mut reader = FramedRead::new(reader, JsonLineCodec::new());
    let mut writer = FramedWrite::new(writer, JsonLineCodec::new());

    while let Some(Ok(frame)) = reader.next().await {
        let Frame::Message(Message::Request(request)) = frame else {
            continue;
        };
        match handler(&request) {
            Reply::Respond {
                notifications,
                response,
            } => {
                for notification in notifications {
                    if writer.send(Message::from(notification)).await.is_err() {
                        return;
                    }
                }
                if writer.send(Message::from(response)).await.is_err() {
                    return;
                }
            }
            Reply::Silent => {}
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
}

/// Logger keeping every line for later assertions
#[derive(Default)]
pub struct RecordingLogger {
    lines: Mutex<Vec<(Level, String)>>,
}

impl RecordingLogger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn lines(&self) -> Vec<(Level, String)> {
        self.lines.lock().clone()
    }

    pub fn at(&self, level: Level) -> Vec<String> {
        self.lines
            .lock()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }

    fn push(&self, level: Level, message: &str) {
        self.lines.lock().push((level, message.to_string()));
    }
}

impl Logger for RecordingLogger {
    fn debug(&self, message: &str) {
        self.push(Level::Debug, message);
    }

    fn info(&self, message: &str) {
        self.push(Level::Info, message);
    }

    fn warn(&self, message: &str) {
        self.push(Level::Warn, message);
    }

    fn error(&self, message: &str) {
        self.push(Level::Error, message);
    }
}

/// Registry with an idle helper installed under [`HELPER_PREFIX`]
pub fn installed_registry() -> Arc<PackageTable> {
    let table = PackageTable::new();
    table.insert(
        HelperConfig::default().package,
        PackageState {
            stage: PackageStage::Idle,
            version_prefix: Some(PathBuf::from(HELPER_PREFIX)),
            available_version: None,
        },
    );
    Arc::new(table)
}
