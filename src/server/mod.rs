// HTTP server module

pub mod handlers;
mod middleware;
mod routes;

pub use routes::{create_router, AppState};
