//! Application services

pub mod registration;

pub use registration::EventRegistrationService;
