mod settings;

pub use settings::{
    ApiConfig, AuditConfig, ChannelsConfig, DatabaseConfig, EmailConfig, OtelConfig, PushConfig,
    ServerConfig, Settings, SmsConfig, StorageConfig,
};
