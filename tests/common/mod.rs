use std::{
    env,
    sync::{Arc, Mutex, MutexGuard, OnceLock},
    time::{SystemTime, UNIX_EPOCH},
};

use mongodb::Client;
use mongodb::bson::oid::ObjectId;

use docreach::models::Role;
use docreach::notify::{Notifier, RecordingNotifier};
use docreach::state::{
    AppState, create_session, create_staff, init_state_with,
};

/// Global lock so integration tests that mutate the DB run one-at-a-time.
static TEST_DB_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

pub struct TestContext {
    pub state: AppState,
    pub notifier: Arc<RecordingNotifier>,
    pub db_name: String,
    _guard: MutexGuard<'static, ()>,
}

pub async fn setup_state() -> Option<TestContext> {
    let notifier = Arc::new(RecordingNotifier::default());
    setup_state_with(notifier.clone(), notifier).await
}

/// Variant taking an arbitrary notifier; `recording` is what the test
/// inspects (pass the same Arc twice for the common case).
pub async fn setup_state_with(
    notifier: Arc<dyn Notifier>,
    recording: Arc<RecordingNotifier>,
) -> Option<TestContext> {
    let guard = TEST_DB_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .expect("failed to lock test db mutex");

    let uri = env::var("MONGODB_URI").unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
    let db_name = format!(
        "docreachtest_{}",
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_millis()
    );
    unsafe {
        env::set_var("MONGODB_DB", &db_name);
    }

    let client = match Client::with_uri_str(&uri).await {
        Ok(c) => c,
        Err(err) => {
            eprintln!("Skipping test; cannot connect to MongoDB: {err:?}");
            drop(guard);
            return None;
        }
    };
    if let Err(err) = client.database(&db_name).drop().await {
        eprintln!("Skipping test; cannot drop test DB: {err:?}");
        drop(guard);
        return None;
    }

    match init_state_with(notifier).await {
        Ok(state) => Some(TestContext {
            state,
            notifier: recording,
            db_name,
            _guard: guard,
        }),
        Err(err) => {
            eprintln!("Skipping test; init_state failed: {err:?}");
            drop(guard);
            None
        }
    }
}

pub async fn teardown(ctx: Option<TestContext>) {
    if let Some(ctx) = ctx {
        if let Ok(uri) = env::var("MONGODB_URI") {
            if let Ok(client) = Client::with_uri_str(&uri).await {
                let _ = client.database(&ctx.db_name).drop().await;
            }
        }
        drop(ctx);
    }
}

// --- seed helpers ---------------------------------------------------------

static PHONE_COUNTER: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(0);

fn unique_phone(prefix: &str) -> String {
    let n = PHONE_COUNTER.fetch_add(1, std::sync::atomic::Ordering::Relaxed) % 100_000_000;
    format!("+91-{prefix}{n:08}")
}

pub async fn seed_location(state: &AppState) -> ObjectId {
    let location = docreach::state::create_location(state, "Hyderabad", "Banjara Hills")
        .await
        .expect("seed location");
    location.id.expect("location id")
}

pub async fn seed_doctor(
    state: &AppState,
    location_id: &ObjectId,
    email: Option<&str>,
) -> ObjectId {
    let phone = unique_phone("98");
    let doctor = docreach::state::create_doctor(
        state,
        "Dr. Mehta",
        &phone,
        email.map(str::to_string),
        location_id,
    )
    .await
    .expect("seed doctor");
    doctor.id.expect("doctor id")
}

pub async fn seed_executive(
    state: &AppState,
    location_id: &ObjectId,
) -> docreach::models::Executive {
    let phone = unique_phone("97");
    docreach::state::create_executive(state, "Ravi Kumar", &phone, None, location_id)
        .await
        .expect("seed executive")
}

pub async fn seed_staff(state: &AppState, role: Role) -> ObjectId {
    let username = format!("{}_{}", role.as_str(), ObjectId::new().to_hex());
    create_staff(state, "Test Staff", &username, "secret123", role, None)
        .await
        .expect("seed staff")
}

pub async fn token_for(state: &AppState, principal_id: &ObjectId) -> String {
    let (token, _) = create_session(state, principal_id)
        .await
        .expect("create session");
    token
}
