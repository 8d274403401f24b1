//! Line-oriented terminal client for roomlink.
//!
//! Reads commands from stdin, prints session changes to stdout and talks to
//! the server over QUIC. All session logic lives in `roomlink-core`; this
//! crate only supplies the terminal [`roomlink_client::Driver`], a printing
//! [`roomlink_client::SessionObserver`] and file-backed preferences.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod input;
pub mod observer;
pub mod preferences;
pub mod terminal;

pub use input::{HELP, InputError, LineCommand, parse_line};
pub use observer::TerminalObserver;
pub use preferences::FilePreferences;
pub use terminal::{TerminalDriver, TerminalError};
