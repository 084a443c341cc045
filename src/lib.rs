//! Run commands against a persistent shell with a timeout, progress reporting, and
//! pass/fail triage of their output.
//!
//! ```no_run
//! use interactive_shell::{Outcome, Session};
//!
//! # fn main() -> Result<(), interactive_shell::SessionError> {
//! let mut session = Session::create_verbose(10)?;
//! match session.execute_command("docker run -d --name mongo-shell mongo", 60)? {
//!     Outcome::Success => {}
//!     other => eprintln!("{}", other),
//! }
//! session.execute("docker rm -f mongo-shell")?.into_result()?;
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod constants;
pub mod core;
pub mod models;
pub mod system;

pub use crate::core::session::{Session, SessionError};
pub use crate::models::Outcome;
