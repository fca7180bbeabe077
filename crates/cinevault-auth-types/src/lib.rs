//! Auth primitives shared across Cinevault services.
//!
//! Provides the JWT codec, Argon2 password hashing, and the `BearerToken` extractor.

pub mod bearer;
pub mod password;
pub mod token;
