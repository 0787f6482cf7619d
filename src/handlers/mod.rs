pub mod auth;
pub mod clients;
pub mod oauth;
pub mod owners;
