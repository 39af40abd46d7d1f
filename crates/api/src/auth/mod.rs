//! Authentication primitives.
//!
//! Tokens are issued by the account service; this crate only verifies them.
//!
//! - [`jwt`] -- HS256 access-token validation (and generation, for tooling and tests).

pub mod jwt;
