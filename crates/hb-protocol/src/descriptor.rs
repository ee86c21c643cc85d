//! Typed descriptors for remote procedures and notifications
//!
//! A descriptor is a zero-sized type naming one method on the wire together
//! with the shape of its parameters and result. Callers never spell method
//! strings by hand:
//!
//! ```ignore
//! let info = session.call::<VersionGet>(VersionGetParams {}).await?;
//! ```

use serde::de::DeserializeOwned;
use serde::Serialize;

/// One remote procedure
pub trait RequestDescriptor {
    /// Method name on the wire
    const METHOD: &'static str;

    /// Parameters sent with the call
    type Params: Serialize + Send + Sync;

    /// Successful result
    type Result: DeserializeOwned + Send;
}

/// One unsolicited message kind
pub trait NotificationDescriptor {
    /// Method name on the wire
    const METHOD: &'static str;

    /// Notification payload
    type Params: DeserializeOwned + Send;
}
