// Infrastructure layer (shared components)
pub mod infrastructure;

// Re-export infrastructure modules for convenient paths
pub use infrastructure::config;
pub use infrastructure::error;
pub use infrastructure::metrics;
pub use infrastructure::postgres;

// Domain layer (business logic)
pub mod audit;
pub mod channels;
pub mod notification;
pub mod realtime;
pub mod users;

// Application layer
pub mod api;
pub mod server;

// Supporting modules
pub mod telemetry;
