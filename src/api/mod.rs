//! Settlement API Service
//!
//! HTTP surface for the bet settlement core: play endpoints per game,
//! verification, and read-only account/history/stats queries. The outer
//! session layer authenticates principals; this layer trusts the ids it
//! is handed.

pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;

pub use server::ApiServer;
