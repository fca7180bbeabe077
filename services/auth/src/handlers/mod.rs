pub mod account;
pub mod health;
pub mod password;
pub mod provider_session;
pub mod token;
