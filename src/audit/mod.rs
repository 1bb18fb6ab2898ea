pub mod capture;
pub mod factory;
pub mod memory_store;
pub mod postgres_store;
pub mod recorder;
pub mod store;
pub mod types;

pub use capture::{sanitize_snapshot, REDACTED};
pub use factory::create_audit_store;
pub use memory_store::MemoryAuditStore;
pub use postgres_store::PostgresAuditStore;
pub use recorder::{audit_recorder, EntityContext};
pub use store::{AuditStore, AuditStoreError};
pub use types::{AuditLogEntry, AuditPage, AuditQuery};
