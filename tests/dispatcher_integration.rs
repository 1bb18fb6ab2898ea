//! Dispatcher integration tests.
//!
//! Drive the dispatch fan-out against memory backends and mock channel
//! adapters, verifying the per-channel independence guarantees: one
//! channel's failure or timeout never affects another channel or the
//! caller, and delivery flags reflect only what was actually attempted.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use harbor_notify::channels::{AdapterSet, ChannelAdapter, PushAdapter, SendOutcome};
use harbor_notify::notification::{
    ChannelPayload, DeliveryChannel, DispatchError, DispatchOptions, ListFilter,
    MemoryNotificationStore, NotificationDispatcher, NotificationKind, NotificationStore,
    StoreError,
};
use harbor_notify::realtime::RealtimeHub;
use harbor_notify::users::{MemoryRecipientDirectory, Recipient};

/// Mock adapter with a scripted outcome, call counting and an optional
/// artificial delay.
struct MockAdapter {
    channel: DeliveryChannel,
    outcome: SendOutcome,
    delay: Option<Duration>,
    calls: AtomicUsize,
    targets: Mutex<Vec<String>>,
}

impl MockAdapter {
    fn new(channel: DeliveryChannel, outcome: SendOutcome) -> Arc<Self> {
        Arc::new(Self {
            channel,
            outcome,
            delay: None,
            calls: AtomicUsize::new(0),
            targets: Mutex::new(Vec::new()),
        })
    }

    fn hanging(channel: DeliveryChannel, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            channel,
            outcome: SendOutcome::ok(),
            delay: Some(delay),
            calls: AtomicUsize::new(0),
            targets: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn targets(&self) -> Vec<String> {
        self.targets.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChannelAdapter for MockAdapter {
    fn channel(&self) -> DeliveryChannel {
        self.channel
    }

    async fn send(&self, target: &str, _payload: &ChannelPayload) -> SendOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.targets.lock().unwrap().push(target.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.outcome.clone()
    }
}

/// Notification store whose base insert always fails.
struct BrokenNotificationStore;

#[async_trait]
impl NotificationStore for BrokenNotificationStore {
    async fn insert(
        &self,
        _notification: &harbor_notify::notification::Notification,
    ) -> Result<(), StoreError> {
        Err(StoreError::Postgres(sqlx::Error::PoolClosed))
    }

    async fn update_delivery_flags(
        &self,
        _id: Uuid,
        _flags: harbor_notify::notification::DeliveryFlags,
    ) -> Result<(), StoreError> {
        Err(StoreError::Postgres(sqlx::Error::PoolClosed))
    }

    async fn mark_read(
        &self,
        _id: Uuid,
        _owner: Uuid,
    ) -> Result<harbor_notify::notification::Notification, StoreError> {
        Err(StoreError::Postgres(sqlx::Error::PoolClosed))
    }

    async fn mark_all_read(&self, _owner: Uuid) -> Result<u64, StoreError> {
        Err(StoreError::Postgres(sqlx::Error::PoolClosed))
    }

    async fn unread_count(&self, _owner: Uuid) -> Result<u64, StoreError> {
        Err(StoreError::Postgres(sqlx::Error::PoolClosed))
    }

    async fn list(
        &self,
        _owner: Uuid,
        _filter: ListFilter,
    ) -> Result<harbor_notify::notification::NotificationPage, StoreError> {
        Err(StoreError::Postgres(sqlx::Error::PoolClosed))
    }

    async fn delete(&self, _id: Uuid, _owner: Uuid) -> Result<(), StoreError> {
        Err(StoreError::Postgres(sqlx::Error::PoolClosed))
    }
}

struct TestEnvironment {
    store: Arc<MemoryNotificationStore>,
    directory: Arc<MemoryRecipientDirectory>,
    email: Arc<MockAdapter>,
    sms: Arc<MockAdapter>,
    push: Arc<MockAdapter>,
    dispatcher: NotificationDispatcher,
}

fn create_test_environment() -> TestEnvironment {
    create_test_environment_with(
        MockAdapter::new(DeliveryChannel::Email, SendOutcome::ok()),
        MockAdapter::new(DeliveryChannel::Sms, SendOutcome::ok()),
        MockAdapter::new(DeliveryChannel::Push, SendOutcome::ok()),
        Duration::from_secs(5),
    )
}

fn create_test_environment_with(
    email: Arc<MockAdapter>,
    sms: Arc<MockAdapter>,
    push: Arc<MockAdapter>,
    send_timeout: Duration,
) -> TestEnvironment {
    let store = Arc::new(MemoryNotificationStore::new());
    let directory = Arc::new(MemoryRecipientDirectory::new());

    let adapters = AdapterSet {
        email: email.clone(),
        sms: sms.clone(),
        push: push.clone(),
    };

    let dispatcher = NotificationDispatcher::new(
        store.clone(),
        directory.clone(),
        adapters,
        send_timeout,
    );

    TestEnvironment {
        store,
        directory,
        email,
        sms,
        push,
        dispatcher,
    }
}

fn verified_recipient(id: Uuid) -> Recipient {
    Recipient {
        id,
        email: Some("a@b.com".to_string()),
        email_verified: true,
        phone_number: Some("+15550100".to_string()),
        phone_verified: true,
    }
}

// =============================================================================
// Channel fan-out
// =============================================================================

#[tokio::test]
async fn test_in_app_only_never_touches_adapters() {
    let env = create_test_environment();
    let user = Uuid::new_v4();
    env.directory.insert(verified_recipient(user));

    let result = env
        .dispatcher
        .dispatch(
            user,
            NotificationKind::System,
            "T",
            "M",
            DispatchOptions::default(),
        )
        .await
        .unwrap();

    assert!(!result.email_sent && !result.sms_sent && !result.push_sent);
    assert_eq!(env.email.calls(), 0);
    assert_eq!(env.sms.calls(), 0);
    assert_eq!(env.push.calls(), 0);
}

#[tokio::test]
async fn test_unverified_email_is_never_attempted() {
    let env = create_test_environment();
    let user = Uuid::new_v4();
    env.directory.insert(Recipient {
        id: user,
        email: Some("a@b.com".to_string()),
        email_verified: false,
        phone_number: None,
        phone_verified: false,
    });

    let result = env
        .dispatcher
        .dispatch(
            user,
            NotificationKind::System,
            "T",
            "M",
            DispatchOptions::with_channels(vec![DeliveryChannel::Email]),
        )
        .await
        .unwrap();

    assert!(!result.email_sent);
    assert_eq!(env.email.calls(), 0);
}

#[tokio::test]
async fn test_in_app_and_email_scenario() {
    let env = create_test_environment();
    let user = Uuid::new_v4();
    env.directory.insert(verified_recipient(user));

    let result = env
        .dispatcher
        .dispatch(
            user,
            NotificationKind::DonationReceived,
            "T",
            "M",
            DispatchOptions::with_channels(vec![
                DeliveryChannel::InApp,
                DeliveryChannel::Email,
            ]),
        )
        .await
        .unwrap();

    assert!(!result.is_read);
    assert!(result.email_sent);
    assert!(!result.sms_sent);
    assert!(!result.push_sent);
    assert_eq!(env.email.calls(), 1);
    assert_eq!(env.email.targets(), vec!["a@b.com".to_string()]);

    // Flags were written back to the store, not just the returned record
    let page = env
        .store
        .list(user, ListFilter::default())
        .await
        .unwrap();
    assert!(page.items[0].email_sent);
}

#[tokio::test]
async fn test_failing_channel_never_fails_dispatch() {
    let env = create_test_environment_with(
        MockAdapter::new(
            DeliveryChannel::Email,
            SendOutcome::failure("provider exploded"),
        ),
        MockAdapter::new(DeliveryChannel::Sms, SendOutcome::ok()),
        MockAdapter::new(DeliveryChannel::Push, SendOutcome::ok()),
        Duration::from_secs(5),
    );
    let user = Uuid::new_v4();
    env.directory.insert(verified_recipient(user));

    let result = env
        .dispatcher
        .dispatch(
            user,
            NotificationKind::System,
            "T",
            "M",
            DispatchOptions::with_channels(vec![
                DeliveryChannel::Email,
                DeliveryChannel::Sms,
                DeliveryChannel::Push,
            ]),
        )
        .await
        .unwrap();

    // Independent outcomes: email failed, the other two succeeded
    assert!(!result.email_sent);
    assert!(result.sms_sent);
    assert!(result.push_sent);
}

#[tokio::test]
async fn test_timed_out_channel_is_treated_as_failed() {
    let env = create_test_environment_with(
        MockAdapter::new(DeliveryChannel::Email, SendOutcome::ok()),
        MockAdapter::hanging(DeliveryChannel::Sms, Duration::from_secs(30)),
        MockAdapter::new(DeliveryChannel::Push, SendOutcome::ok()),
        Duration::from_millis(100),
    );
    let user = Uuid::new_v4();
    env.directory.insert(verified_recipient(user));

    let started = std::time::Instant::now();
    let result = env
        .dispatcher
        .dispatch(
            user,
            NotificationKind::System,
            "T",
            "M",
            DispatchOptions::with_channels(vec![DeliveryChannel::Email, DeliveryChannel::Sms]),
        )
        .await
        .unwrap();

    // A hanging provider cannot stall the dispatch past its bound
    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(result.email_sent);
    assert!(!result.sms_sent);
    assert_eq!(env.sms.calls(), 1);
}

#[tokio::test]
async fn test_disabled_adapter_counts_as_attempted() {
    let env = create_test_environment_with(
        MockAdapter::new(DeliveryChannel::Email, SendOutcome::disabled()),
        MockAdapter::new(DeliveryChannel::Sms, SendOutcome::ok()),
        MockAdapter::new(DeliveryChannel::Push, SendOutcome::ok()),
        Duration::from_secs(5),
    );
    let user = Uuid::new_v4();
    env.directory.insert(verified_recipient(user));

    let result = env
        .dispatcher
        .dispatch(
            user,
            NotificationKind::System,
            "T",
            "M",
            DispatchOptions::with_channels(vec![DeliveryChannel::Email]),
        )
        .await
        .unwrap();

    // The contract: a disabled adapter reports success, so the flag is
    // true regardless of its internal disabled state
    assert!(result.email_sent);
    assert_eq!(env.email.calls(), 1);
}

#[tokio::test]
async fn test_missing_recipient_skips_fanout_silently() {
    let env = create_test_environment();
    let user = Uuid::new_v4();
    // No directory entry for this user

    let result = env
        .dispatcher
        .dispatch(
            user,
            NotificationKind::System,
            "T",
            "M",
            DispatchOptions::with_channels(vec![
                DeliveryChannel::Email,
                DeliveryChannel::Push,
            ]),
        )
        .await
        .unwrap();

    assert!(!result.email_sent && !result.push_sent);
    assert_eq!(env.email.calls(), 0);
    assert_eq!(env.push.calls(), 0);

    // The record is still the durable source of truth
    assert_eq!(env.store.len(), 1);
}

#[tokio::test]
async fn test_duplicate_channels_are_attempted_once() {
    let env = create_test_environment();
    let user = Uuid::new_v4();
    env.directory.insert(verified_recipient(user));

    env.dispatcher
        .dispatch(
            user,
            NotificationKind::System,
            "T",
            "M",
            DispatchOptions::with_channels(vec![
                DeliveryChannel::Email,
                DeliveryChannel::Email,
            ]),
        )
        .await
        .unwrap();

    assert_eq!(env.email.calls(), 1);
}

#[tokio::test]
async fn test_persistence_failure_is_the_only_dispatch_error() {
    let email = MockAdapter::new(DeliveryChannel::Email, SendOutcome::ok());
    let directory = Arc::new(MemoryRecipientDirectory::new());
    let user = Uuid::new_v4();
    directory.insert(verified_recipient(user));

    let dispatcher = NotificationDispatcher::new(
        Arc::new(BrokenNotificationStore),
        directory,
        AdapterSet {
            email: email.clone(),
            sms: MockAdapter::new(DeliveryChannel::Sms, SendOutcome::ok()),
            push: MockAdapter::new(DeliveryChannel::Push, SendOutcome::ok()),
        },
        Duration::from_secs(5),
    );

    let result = dispatcher
        .dispatch(
            user,
            NotificationKind::System,
            "T",
            "M",
            DispatchOptions::with_channels(vec![DeliveryChannel::Email]),
        )
        .await;

    assert!(matches!(result, Err(DispatchError::Persistence(_))));
    // Fan-out never started
    assert_eq!(email.calls(), 0);
}

// =============================================================================
// Realtime push delivery
// =============================================================================

#[tokio::test]
async fn test_push_event_reaches_hub_subscriber() {
    let hub = Arc::new(RealtimeHub::default());
    let store = Arc::new(MemoryNotificationStore::new());
    let directory = Arc::new(MemoryRecipientDirectory::new());
    let user = Uuid::new_v4();
    directory.insert(verified_recipient(user));

    let dispatcher = NotificationDispatcher::new(
        store,
        directory,
        AdapterSet {
            email: MockAdapter::new(DeliveryChannel::Email, SendOutcome::ok()),
            sms: MockAdapter::new(DeliveryChannel::Sms, SendOutcome::ok()),
            push: Arc::new(PushAdapter::new(hub.clone())),
        },
        Duration::from_secs(5),
    );

    let mut rx = hub.subscribe(user);

    let result = dispatcher
        .dispatch(
            user,
            NotificationKind::MessageReceived,
            "T",
            "M",
            DispatchOptions::with_channels(vec![DeliveryChannel::Push]),
        )
        .await
        .unwrap();

    assert!(result.push_sent);

    let event = rx.recv().await.unwrap();
    assert_eq!(
        event["notification_id"].as_str().unwrap(),
        result.id.to_string()
    );
}

// =============================================================================
// Read-state operations
// =============================================================================

#[tokio::test]
async fn test_unread_count_tracks_dispatches_and_mark_all() {
    let env = create_test_environment();
    let user = Uuid::new_v4();
    env.directory.insert(verified_recipient(user));

    for _ in 0..4 {
        env.dispatcher
            .dispatch(
                user,
                NotificationKind::System,
                "T",
                "M",
                DispatchOptions::default(),
            )
            .await
            .unwrap();
    }

    assert_eq!(env.dispatcher.unread_count(user).await.unwrap(), 4);

    let updated = env.dispatcher.mark_all_read(user).await.unwrap();
    assert_eq!(updated, 4);
    assert_eq!(env.dispatcher.unread_count(user).await.unwrap(), 0);
}

#[tokio::test]
async fn test_mark_read_is_idempotent_and_owner_scoped() {
    let env = create_test_environment();
    let user = Uuid::new_v4();
    env.directory.insert(verified_recipient(user));

    let n = env
        .dispatcher
        .dispatch(
            user,
            NotificationKind::System,
            "T",
            "M",
            DispatchOptions::default(),
        )
        .await
        .unwrap();

    let stranger = Uuid::new_v4();
    assert!(matches!(
        env.dispatcher.mark_read(n.id, stranger).await,
        Err(StoreError::NotFound)
    ));

    let first = env.dispatcher.mark_read(n.id, user).await.unwrap();
    let second = env.dispatcher.mark_read(n.id, user).await.unwrap();
    assert_eq!(second.read_at, first.read_at);
}

#[tokio::test]
async fn test_delete_removes_record() {
    let env = create_test_environment();
    let user = Uuid::new_v4();
    env.directory.insert(verified_recipient(user));

    let n = env
        .dispatcher
        .dispatch(
            user,
            NotificationKind::System,
            "T",
            "M",
            DispatchOptions::default(),
        )
        .await
        .unwrap();

    env.dispatcher.delete(n.id, user).await.unwrap();
    assert!(matches!(
        env.dispatcher.delete(n.id, user).await,
        Err(StoreError::NotFound)
    ));
    assert_eq!(env.store.len(), 0);
}
