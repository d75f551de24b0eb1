//! Output macros for application messages.
//!
//! Every macro routes through [`is_debug_mode`]: with `BREAKWATCH_DEBUG` or
//! `RUST_LOG` set, messages go to `tracing` at the matching level; otherwise
//! they are printed to stdout (stderr for errors). Debug messages are
//! dropped entirely outside debug mode.
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐    ┌─────────────────┐
//! │   Macro Call    │    │   Debug Mode    │    │   Output        │
//! │                 │───▶│   Detection     │───▶│   Routing       │
//! │ msg_info!(msg)  │    │ BREAKWATCH_DEBUG│    │ tracing::info!  │
//! │                 │    │   or RUST_LOG   │    │  or println!    │
//! └─────────────────┘    └─────────────────┘    └─────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use breakwatch::{msg_info, msg_success};
//! use breakwatch::libs::messages::Message;
//!
//! msg_success!(Message::ConfigSaved);
//! msg_info!(Message::NoActiveSessions, true);
//! ```

use std::sync::OnceLock;

static DEBUG_MODE: OnceLock<bool> = OnceLock::new();

/// Returns `true` when `BREAKWATCH_DEBUG` or `RUST_LOG` is set.
///
/// The environment is inspected once; the answer is cached for the lifetime
/// of the process.
#[doc(hidden)]
pub fn is_debug_mode() -> bool {
    *DEBUG_MODE.get_or_init(|| std::env::var("BREAKWATCH_DEBUG").is_ok() || std::env::var("RUST_LOG").is_ok())
}

/// Routes one formatted message either to `tracing` or to the terminal.
#[doc(hidden)]
#[macro_export]
macro_rules! __msg_emit {
    ($level:ident, $print:ident, $fmt:literal, $msg:expr) => {
        if $crate::libs::messages::macros::is_debug_mode() {
            tracing::$level!($fmt, $msg);
        } else {
            $print!($fmt, $msg);
        }
    };
}

/// Prints a plain message. A trailing `true` pads it with blank lines.
#[macro_export]
macro_rules! msg_print {
    ($msg:expr) => {
        $crate::__msg_emit!(info, println, "{}", $msg)
    };
    ($msg:expr, true) => {
        $crate::__msg_emit!(info, println, "\n{}\n", $msg)
    };
}

#[macro_export]
macro_rules! msg_success {
    ($msg:expr) => {
        $crate::__msg_emit!(info, println, "✅ {}", $msg)
    };
    ($msg:expr, true) => {
        $crate::__msg_emit!(info, println, "\n✅ {}\n", $msg)
    };
}

/// Errors go to stderr.
#[macro_export]
macro_rules! msg_error {
    ($msg:expr) => {
        $crate::__msg_emit!(error, eprintln, "❌ {}", $msg)
    };
    ($msg:expr, true) => {
        $crate::__msg_emit!(error, eprintln, "\n❌ {}\n", $msg)
    };
}

/// Policy breaches that do not stop the operation, e.g. a break that ran
/// over its limit.
#[macro_export]
macro_rules! msg_warning {
    ($msg:expr) => {
        $crate::__msg_emit!(warn, println, "⚠️ {}", $msg)
    };
    ($msg:expr, true) => {
        $crate::__msg_emit!(warn, println, "\n⚠️ {}\n", $msg)
    };
}

#[macro_export]
macro_rules! msg_info {
    ($msg:expr) => {
        $crate::__msg_emit!(info, println, "ℹ️ {}", $msg)
    };
    ($msg:expr, true) => {
        $crate::__msg_emit!(info, println, "\nℹ️ {}\n", $msg)
    };
}

/// Debug-only message; produces no output outside debug mode.
#[macro_export]
macro_rules! msg_debug {
    ($msg:expr) => {
        if $crate::libs::messages::macros::is_debug_mode() {
            tracing::debug!("🔍 {}", $msg);
        }
    };
}

/// `anyhow::Error` carrying a message; `main` adds the ❌ prefix when printing it.
#[macro_export]
macro_rules! msg_error_anyhow {
    ($msg:expr) => {
        anyhow::anyhow!("{}", $msg)
    };
}

#[macro_export]
macro_rules! msg_bail_anyhow {
    ($msg:expr) => {
        anyhow::bail!("{}", $msg)
    };
}
