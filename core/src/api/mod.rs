pub mod configuration;
mod handlers;
mod routes;
pub mod server;
pub mod types;
