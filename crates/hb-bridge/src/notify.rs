//! Routing of helper notifications to host sinks

use std::sync::Arc;

use hb_core::Logger;
use hb_protocol::messages::{Log, LogParams, Progress, ProgressUpdate};

use crate::client::ClientSession;

/// Receives progress updates for a long-running call
pub trait ProgressSink: Send + Sync {
    fn emit_progress(&self, update: ProgressUpdate);
}

/// Forward the helper's log lines and the session's warnings to `logger`
pub fn setup_logging(session: &ClientSession, logger: Arc<dyn Logger>) {
    let warn_logger = Arc::clone(&logger);
    session.on_warning(move |message| {
        warn_logger.warn(&format!("(helper) {}", message));
    });

    session.on_notification::<Log, _>(move |params| dispatch_log(logger.as_ref(), &params));
}

/// [`setup_logging`], plus progress forwarding
pub fn setup_client(session: &ClientSession, logger: Arc<dyn Logger>, sink: Arc<dyn ProgressSink>) {
    setup_logging(session, logger);
    session.on_notification::<Progress, _>(move |update| sink.emit_progress(update));
}

fn dispatch_log(logger: &dyn Logger, params: &LogParams) {
    match params.level.as_str() {
        "debug" => logger.debug(&params.message),
        "info" => logger.info(&params.message),
        "warning" => logger.warn(&params.message),
        "error" => logger.error(&params.message),
        other => logger.info(&format!("[{}] {}", other, params.message)),
    }
}
