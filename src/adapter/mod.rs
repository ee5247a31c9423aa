//! Adapters: implementations of the ports

pub mod command;
pub mod identity;
pub mod storage;
