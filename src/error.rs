//! Diagnostic error types for mailbox cleanup operations.
//!
//! Only failures that abort an operation live here: session establishment,
//! mid-session protocol errors, and a missing outbound-HTTP capability.
//! Per-item failures inside batch operations (a fetch, a deletion flag, one
//! unsubscribe request) are logged and skipped by their loops instead, so a
//! single bad message or endpoint never takes down a whole run.

use miette::Diagnostic;
use thiserror::Error;

/// Errors surfaced by the sweep engine.
#[derive(Debug, Error, Diagnostic)]
pub enum SweepError {
    /// The mail server rejected the supplied credentials.
    #[error("login rejected: {message}")]
    #[diagnostic(
        code(mailsweep::session::auth),
        help(
            "Check the account address and password. Gmail, Yahoo and iCloud \
             require an app-specific password for IMAP clients; a normal \
             account password will be refused."
        )
    )]
    Auth { message: String },

    /// The server could not be reached or the TLS handshake failed.
    #[error("connection failed: {message}")]
    #[diagnostic(
        code(mailsweep::session::connection),
        help(
            "Check the network, and that the resolved IMAP host accepts TLS \
             connections on port 993. Unknown domains are guessed as \
             mail.<domain>, which not every provider serves."
        )
    )]
    Connection { message: String },

    /// A mid-session protocol operation failed.
    #[error("{operation} failed: {message}")]
    #[diagnostic(
        code(mailsweep::session::protocol),
        help("The session may be in an unusable state; reconnect and retry.")
    )]
    Protocol {
        operation: &'static str,
        message: String,
    },

    /// This build cannot issue outbound HTTP requests.
    #[error("no outbound HTTP capability: {message}")]
    #[diagnostic(
        code(mailsweep::unsubscribe::capability),
        help("Rebuild with the `http` feature enabled to visit unsubscribe links.")
    )]
    CapabilityMissing { message: String },
}

impl SweepError {
    /// Protocol failure for `operation`, keeping the server's error text.
    pub fn protocol(operation: &'static str, cause: impl std::fmt::Display) -> Self {
        Self::Protocol {
            operation,
            message: cause.to_string(),
        }
    }
}

/// Convenience alias for engine results.
pub type SweepResult<T> = std::result::Result<T, SweepError>;
