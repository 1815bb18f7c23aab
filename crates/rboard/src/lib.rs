//! Review Board code review for terminals and editors
//!
//! The editor shell holds one [`Session`] and calls its queries and
//! commands; the session owns the client stack, the line-map cache and the
//! protocol used to read full files.
//!
//! # Example
//!
//! ```rust,no_run
//! use rb_client::{CredentialPrompt, Credentials};
//! use rboard::Session;
//! use std::sync::Arc;
//!
//! struct NoLogin;
//!
//! impl CredentialPrompt for NoLogin {
//!     fn credentials(&self) -> Option<Credentials> {
//!         None
//!     }
//! }
//!
//! # async fn example() -> rb_client::Result<()> {
//! let config = rb_config::AppConfig::load();
//! let session = Session::connect(&config, Arc::new(NoLogin)).await?;
//! for line in session.review_request_lines(0).await? {
//!     println!("{}", line);
//! }
//! # Ok(())
//! # }
//! ```

pub mod protocol;
pub mod render;
pub mod session;
pub mod source_control;

#[cfg(test)]
mod test_support;

pub use protocol::{ContentProtocol, FileLines, LegacyProtocol, ModernProtocol};
pub use session::{BodyField, DiffView, ReviewRequestView, Session};
pub use source_control::{P4Fetcher, P4Settings, SourceControl};
