//! Actor-based session processing
//!
//! A Guardian supervises one SessionManager, which owns a SessionProcessor per
//! session id. Built on Ractor.

pub mod guardian;
pub mod manager;
pub mod message;
pub mod processor;

pub use guardian::*;
pub use manager::*;
pub use message::*;
pub use processor::*;
