//! Authentication routes.
//!
//! - `first_party`: username/password exchange at `POST /token`
//! - `delegated`: login through an external identity provider

pub mod delegated;
pub mod first_party;
