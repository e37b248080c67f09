//! # esi-core
//!
//! Core of the ESI account service.
//!
//! This crate provides:
//! - The account record and its server profiles
//! - Account name rules
//! - A directory-backed account store (one JSON file per account)
//! - Concurrent bulk deletion with a full outcome report

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod account;
mod error;

pub use account::{
    Account, AccountId, AccountStore, AccountTarget, AuthenticationMethod, ConnectionSecurity,
    IncomingProtocol, IncomingServer, OutgoingServer, PurgeFailure, PurgeReport,
    ValidationError, ValidationResult, validate_name,
};
pub use error::{Error, Result};
