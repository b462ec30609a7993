//! Core business logic abstractions

pub mod checker;
pub mod config;
pub mod log;
pub mod notify;
pub mod rate;

// Re-export main types for cleaner imports
pub use checker::{CheckSettings, RateChecker, RunOutcome};
pub use notify::{EmailMessage, Notifier};
pub use rate::{RateAlert, RateSnapshot, RateSource};
