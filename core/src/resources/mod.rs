//! Endpoint catalogs for the FarmOpsX resources.
//!
//! Each handle borrows the client, shapes an options map for one endpoint and
//! hands it to the pipeline under its own resource name. Handles never touch
//! the client's configured resource.

mod channels;
mod sync;

pub use channels::{ChannelDetails, Channels};
pub use sync::SyncResource;

use serde_json::{json, Value};

use crate::Options;

/// `defaults` with every key of `overrides` written over it.
pub(crate) fn merge(mut defaults: Options, overrides: &Options) -> Options {
    for (key, value) in overrides {
        defaults.insert(key.clone(), value.clone());
    }
    defaults
}

/// Report import schedule: notifications and scheduling both off unless
/// overridden.
pub(crate) fn import_schedule(overrides: &Options) -> Options {
    let mut defaults = Options::new();
    defaults.insert("notifier".to_string(), Value::Bool(false));
    defaults.insert("scheduled".to_string(), Value::Bool(false));
    merge(defaults, overrides)
}

/// Metadata document sent with channel writes.
pub(crate) fn channel_metadata(schedule: &Options, extra: &Options) -> Options {
    let mut base = Options::new();
    base.insert("importReports".to_string(), json!(import_schedule(schedule)));
    merge(base, extra)
}
