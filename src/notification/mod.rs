pub mod dispatcher;
pub mod factory;
pub mod memory_store;
pub mod postgres_store;
pub mod store;
pub mod types;

pub use dispatcher::{DispatchError, NotificationDispatcher};
pub use factory::create_notification_store;
pub use memory_store::MemoryNotificationStore;
pub use postgres_store::PostgresNotificationStore;
pub use store::{ListFilter, NotificationPage, NotificationStore, StoreError};
pub use types::{
    ChannelPayload, DeliveryChannel, DeliveryFlags, DispatchOptions, Notification,
    NotificationKind, Priority,
};
