//! An in-application developer console.
//!
//! Submitted text runs in a persistent script scope; script output, echoed
//! commands and mirrored application log events accumulate in a rich-text
//! transcript. The panel slides in and out of view on a toggle key.

pub mod config;
pub mod console;
pub mod engine;
pub mod error;
pub mod handle;
pub mod history;
pub mod input;
pub mod interceptor;
pub mod log_buffer;
pub mod log_source;
pub mod logging;
pub mod rhai_engine;
pub mod scope;
pub mod transcript;
pub mod visibility;

pub use console::{CommandOutcome, Console};
pub use error::{ConsoleError, ScriptError};
