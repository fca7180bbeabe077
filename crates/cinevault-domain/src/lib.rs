//! Domain types shared across Cinevault services.
//!
//! Pure types with no framework dependencies: account roles and the
//! validation rules for user-supplied credentials.

pub mod credential;
pub mod user;
