//! Domain model: events, registrations, identities, session views and commands

pub mod catalog;
pub mod command;
pub mod constant;
pub mod error;
pub mod event;
pub mod identity;
pub mod registration;
pub mod state;
