// lib.rs
// Crate surface; the binary in main.rs and the integration tests both
// build on these modules.

pub mod app;
pub mod auth;
pub mod errors;
pub mod models;
pub mod notify;
pub mod otp;
pub mod policy;
pub mod routes;
pub mod state;
pub mod validate;
