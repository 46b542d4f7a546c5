//! Acquisition Engine (`spec.md` §4.3): per-subscriber session lifecycle,
//! service bootstrap/shutdown, and the per-message write path.

pub mod dispatch;
pub mod service;

pub use dispatch::on_message;
pub use service::Service;
