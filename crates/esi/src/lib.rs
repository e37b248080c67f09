//! # esi
//!
//! HTTP front end of the ESI account service.
//!
//! Serves email account profiles kept by [`esi_core::AccountStore`], one
//! JSON file per account:
//!
//! | Method    | Path             | Result                 |
//! |-----------|------------------|------------------------|
//! | GET       | `/`              | route list             |
//! | POST      | `/accounts`      | `201` created account  |
//! | GET, HEAD | `/accounts`      | account ids            |
//! | DELETE    | `/accounts`      | `204`                  |
//! | GET, HEAD | `/accounts/{id}` | account JSON           |
//! | PUT       | `/accounts/{id}` | `204`                  |
//! | DELETE    | `/accounts/{id}` | `204`                  |
//!
//! Paths are matched with trailing slashes trimmed, and clients can be
//! rate limited per IP address with a [`Throttle`].

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod audit;
pub mod chain;
pub mod config;
mod error;
pub mod params;
mod routes;
mod state;
mod throttle;

pub use chain::{EnsuredAccount, LoadedAccounts};
pub use config::Config;
pub use error::ApiError;
pub use params::Params;
pub use routes::{app, router};
pub use state::AppState;
pub use throttle::Throttle;
