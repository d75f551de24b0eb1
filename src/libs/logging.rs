//! Tracing subscriber setup.
//!
//! The subscriber is only installed in debug mode (see
//! [`is_debug_mode`](crate::libs::messages::macros::is_debug_mode)); in
//! normal mode the `msg_*!` macros print directly and `tracing` events from
//! the repositories are discarded.

use crate::libs::messages::macros::is_debug_mode;
use tracing_subscriber::{fmt, EnvFilter};

/// Default filter used when `BREAKWATCH_DEBUG` is set without `RUST_LOG`.
pub const DEFAULT_FILTER: &str = "breakwatch=debug";

/// Installs a global `fmt` subscriber honouring `RUST_LOG`.
///
/// Calling this more than once is harmless; later calls are ignored.
pub fn init() {
    if !is_debug_mode() {
        return;
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}
