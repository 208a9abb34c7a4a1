//! Docsie trust-token issuance
//!
//! Mints the minimal signed token the Docsie widget platform accepts for
//! authenticated deployments. The platform validates the token out-of-band
//! with the same shared master key, so the token shape is fixed:
//!
//! - header: HS256 / JWT
//! - payload: `{"exp": <unix seconds>}` and nothing else
//!
//! This crate performs no caller authentication. Whoever can reach the
//! issuer can obtain a token; restricting that is left to the deployment
//! boundary (network perimeter, reverse proxy).

pub mod constants;
pub mod error;
pub mod token;

pub use constants::*;
pub use error::{Error, Result};
pub use token::{IssuedToken, TokenClaims, TokenIssuer, verify};
