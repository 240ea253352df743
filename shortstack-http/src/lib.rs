pub mod config;
pub mod handlers;
pub mod server;

pub use config::{IndexSpec, ServerConfig};
pub use server::{init_tracing, router, serve, serve_with};
