pub mod admin;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod triggers;

pub use routes::api_routes;
