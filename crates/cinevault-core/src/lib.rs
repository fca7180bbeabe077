//! HTTP and observability plumbing shared by Cinevault services.

pub mod health;
pub mod middleware;
pub mod tracing;
