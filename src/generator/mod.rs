//! Synthetic record generation
//!
//! - `severity` - the seven levels and uniform level selection
//! - `message` - vocabularies and level-dependent message text
//! - `record` - one complete record with its optional fields

pub mod message;
pub mod record;
pub mod severity;

pub use message::build_message;
pub use record::Record;
pub use severity::Severity;
