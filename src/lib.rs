// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # mailsweep
//!
//! An inbox cleaner: finds promotional mail over IMAP, unsubscribes,
//! and deletes what it found.
//!
//! ## How it works
//!
//! - **Classification** (`classify`): header heuristics (`Precedence`,
//!   `List-Unsubscribe`) plus multilingual keyword matching, with a
//!   trusted-sender exemption that always wins
//! - **Link harvest** (`unsubscribe`): first `List-Unsubscribe` HTTP
//!   target per sender, visited one GET at a time with pacing
//! - **Deletion** (`delete`): flag everything, purge once
//! - **Session** (`session`): IMAP over TLS behind a trait, with a
//!   scripted mock for offline tests
//!
//! ## Library usage
//!
//! ```no_run
//! use mailsweep::progress::NoProgress;
//! use mailsweep::{ScanOptions, Sweeper};
//!
//! fn main() -> Result<(), mailsweep::SweepError> {
//!     let mut sweeper = Sweeper::new();
//!     sweeper.connect("me@gmail.com", "app-password")?;
//!     let result = sweeper.scan(&ScanOptions::default(), &mut NoProgress)?;
//!     println!("{} promotional messages", result.messages.len());
//!     sweeper.disconnect();
//!     Ok(())
//! }
//! ```

pub mod address;
pub mod classify;
pub mod decode;
pub mod delete;
pub mod error;
pub mod message;
pub mod progress;
pub mod provider;
pub mod report;
pub mod scan;
pub mod session;
pub mod sweeper;
pub mod unsubscribe;

pub use error::{SweepError, SweepResult};
pub use message::{Message, ScanResult};
pub use report::SweepReport;
pub use scan::ScanOptions;
pub use sweeper::Sweeper;
