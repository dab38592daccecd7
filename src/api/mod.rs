//! HTTP surface: bounding box download and place lookup

pub mod handlers;
pub mod models;
pub mod routes;
pub mod state;

pub use routes::{create_router, create_router_with};
pub use state::{AppState, SharedState};
