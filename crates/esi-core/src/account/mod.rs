//! Account management module.
//!
//! Provides the account record, name rules, and the directory-backed store.

mod model;
mod store;
mod validation;

pub use model::{
    Account, AccountId, AuthenticationMethod, ConnectionSecurity, IncomingProtocol,
    IncomingServer, OutgoingServer,
};
pub use store::{AccountStore, AccountTarget, PurgeFailure, PurgeReport};
pub use validation::{ValidationError, ValidationResult, validate_name};
