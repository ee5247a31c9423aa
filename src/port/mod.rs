//! Ports: the narrow contracts the session layer depends on

pub mod command;
pub mod identity;
pub mod store;
