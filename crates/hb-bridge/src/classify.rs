//! Error classification for presentation
//!
//! These functions take any error (or none at all) and decide whether it
//! came back from the helper, and which message and stack are worth showing.
//! They walk the `source()` chain, so an error wrapped in context by the
//! caller is classified the same as the bare [`BridgeError`].
//!
//! None of them panic: an error they know nothing about simply falls
//! through to the least specific answer.

use std::error::Error;

use crate::error::{BridgeError, RemoteError};

/// Returned for a missing error
pub const UNKNOWN_ERROR: &str = "Unknown error";

type DynError = dyn Error + 'static;

fn chain<'a>(e: &'a DynError) -> impl Iterator<Item = &'a DynError> {
    std::iter::successors(Some(e), |&e| e.source())
}

/// The remote error somewhere in `e`'s chain, if there is one
pub fn as_request_error(e: Option<&DynError>) -> Option<&RemoteError> {
    chain(e?).find_map(|err| match err.downcast_ref::<BridgeError>() {
        Some(bridge) => bridge.remote(),
        None => err.downcast_ref::<RemoteError>(),
    })
}

/// True unless `e` carries a remote error with a non-negative code
pub fn is_internal_error(e: Option<&DynError>) -> bool {
    match as_request_error(e) {
        Some(remote) => remote.is_internal(),
        None => true,
    }
}

/// Message to show the user: the helper's own message when there is one
pub fn get_error_message(e: Option<&DynError>) -> String {
    let Some(err) = e else {
        return UNKNOWN_ERROR.to_string();
    };

    match as_request_error(e) {
        Some(remote) if !remote.message.is_empty() => remote.message.clone(),
        _ => err.to_string(),
    }
}

/// Most useful stack trace: the helper's, then the helper's message, then
/// the local cause chain
pub fn get_error_stack(e: Option<&DynError>) -> String {
    let Some(err) = e else {
        return UNKNOWN_ERROR.to_string();
    };

    if let Some(remote) = as_request_error(e) {
        if let Some(stack) = remote.remote_stack() {
            return stack.to_string();
        }
        if !remote.message.is_empty() {
            return remote.message.clone();
        }
    }
    local_stack(err)
}

/// The cause chain rendered one error per line
pub fn local_stack(e: &DynError) -> String {
    let mut lines = chain(e).map(|err| err.to_string());
    let mut out = lines.next().unwrap_or_default();
    for cause in lines {
        out.push_str("\n    caused by: ");
        out.push_str(&cause);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fmt;

    /// Caller-side wrapper adding context, like `anyhow::Context` would
    #[derive(Debug)]
    struct Context {
        message: &'static str,
        source: BridgeError,
    }

    impl fmt::Display for Context {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.message)
        }
    }

    impl Error for Context {
        fn source(&self) -> Option<&(dyn Error + 'static)> {
            Some(&self.source)
        }
    }

    #[test]
    fn test_local_error_is_internal() {
        let err = BridgeError::ConnectionClosed;
        assert!(as_request_error(Some(&err)).is_none());
        assert!(is_internal_error(Some(&err)));

        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        assert!(as_request_error(Some(&io)).is_none());
        assert!(is_internal_error(Some(&io)));
    }

    #[test]
    fn test_internal_follows_code_sign() {
        for (code, internal) in [(-32601, true), (-1, true), (0, false), (17, false)] {
            let err = BridgeError::Remote(RemoteError::new(code, "x"));
            assert_eq!(is_internal_error(Some(&err)), internal, "code {}", code);
        }
    }

    #[test]
    fn test_missing_error() {
        assert_eq!(get_error_message(None), "Unknown error");
        assert_eq!(get_error_stack(None), "Unknown error");
        assert!(as_request_error(None).is_none());
        assert!(is_internal_error(None));
    }

    #[test]
    fn test_message_prefers_remote() {
        let err = Context {
            message: "generic",
            source: RemoteError::new(5, "remote").into(),
        };
        assert_eq!(get_error_message(Some(&err)), "remote");
        assert!(!is_internal_error(Some(&err)));

        let local = Context {
            message: "generic",
            source: BridgeError::ConnectionClosed,
        };
        assert_eq!(get_error_message(Some(&local)), "generic");
    }

    #[test]
    fn test_stack_priority() {
        let err = Context {
            message: "local-stack",
            source: RemoteError::new(5, "remote-msg")
                .with_data(json!({"stack": "remote-stack"}))
                .into(),
        };
        assert_eq!(get_error_stack(Some(&err)), "remote-stack");

        let no_stack = Context {
            message: "local-stack",
            source: RemoteError::new(5, "remote-msg")
                .with_data(json!({"other": true}))
                .into(),
        };
        assert_eq!(get_error_stack(Some(&no_stack)), "remote-msg");

        let local = Context {
            message: "while installing",
            source: BridgeError::NotReady("helper exited".into()),
        };
        assert_eq!(
            get_error_stack(Some(&local)),
            "while installing\n    caused by: Helper did not become ready: helper exited"
        );
    }

    #[test]
    fn test_remote_error_found_through_nested_context() {
        #[derive(Debug)]
        struct Outer(Context);

        impl fmt::Display for Outer {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("while fetching caves")
            }
        }

        impl Error for Outer {
            fn source(&self) -> Option<&(dyn Error + 'static)> {
                Some(&self.0)
            }
        }

        let err = Outer(Context {
            message: "call failed",
            source: RemoteError::new(404, "no such cave").into(),
        });
        assert_eq!(chain(&err).count(), 3);
        assert_eq!(as_request_error(Some(&err)).map(|r| r.code), Some(404));
        assert_eq!(get_error_message(Some(&err)), "no such cave");
        assert!(!is_internal_error(Some(&err)));
    }

    #[test]
    fn test_bare_remote_error_classified() {
        let remote = RemoteError::new(2, "quota exceeded");
        assert_eq!(as_request_error(Some(&remote)), Some(&remote));
        assert_eq!(get_error_message(Some(&remote)), "quota exceeded");
    }
}
