pub mod hub;
pub mod sse;

pub use hub::RealtimeHub;
pub use sse::notification_stream;
