//! Call and version command implementations

use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::Value;

use crate::output::{print_error, print_info, print_success};
use hb_bridge::{
    get_error_message, get_error_stack, is_internal_error, BridgeError, ClientSession, ProgressSink,
    SetupHook,
};
use hb_core::config::ConfigFile;
use hb_core::TracingLogger;
use hb_protocol::messages::{Progress, ProgressUpdate, VersionGet, VersionGetParams};

use super::build_bridge;

/// Shown instead of the helper's message for bridge-level failures
const GENERIC_FAILURE: &str = "Something went wrong while talking to the helper";

/// Progress lines go to stderr so stdout stays parseable
struct ConsoleProgress;

impl ProgressSink for ConsoleProgress {
    fn emit_progress(&self, update: ProgressUpdate) {
        eprintln!("progress: {}", update.0);
    }
}

/// Execute the call command
pub async fn call_command(
    config: &ConfigFile,
    logger: &TracingLogger,
    method: &str,
    params: Option<&str>,
    verbose: bool,
) -> Result<()> {
    let params: Value = match params {
        Some(raw) => serde_json::from_str(raw)
            .with_context(|| format!("Params must be a JSON value, got: {}", raw))?,
        None => Value::Object(Default::default()),
    };

    let bridge = build_bridge(config, logger);
    let sink: Arc<dyn ProgressSink> = Arc::new(ConsoleProgress);
    let setup: SetupHook = Box::new(move |session: &ClientSession| {
        session.on_notification::<Progress, _>(move |update| sink.emit_progress(update));
    });

    match bridge.call_raw(method, params, Some(setup)).await {
        Ok(result) => {
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Err(e) => {
            report_failure(&e, verbose);
            Err(e.into())
        }
    }
}

/// Execute the version command
pub async fn version_command(
    config: &ConfigFile,
    logger: &TracingLogger,
    verbose: bool,
) -> Result<()> {
    let bridge = build_bridge(config, logger);
    match bridge.call::<VersionGet>(VersionGetParams {}).await {
        Ok(version) => {
            print_success(&format!("Helper {}", version.version));
            if verbose {
                print_info(&version.version_string);
            }
            Ok(())
        }
        Err(e) => {
            report_failure(&e, verbose);
            Err(e.into())
        }
    }
}

fn report_failure(e: &BridgeError, verbose: bool) {
    if is_internal_error(Some(e)) {
        print_error(GENERIC_FAILURE);
    } else {
        print_error(&get_error_message(Some(e)));
    }
    if verbose {
        eprintln!("{}", get_error_stack(Some(e)));
    }
}
