// state/transactions.rs
// Transaction lifecycle: creation, role-scoped listing, partial updates,
// OTP-gated completion, bulk creation, and statistics.

use futures::stream::TryStreamExt;
use mongodb::bson::{DateTime, doc, oid::ObjectId};
use mongodb::options::ReturnDocument;
use serde::Serialize;

use crate::errors::ApiError;
use crate::models::{PaymentMode, Role, Transaction, TransactionStatus};
use crate::notify::TxSummary;
use crate::otp::generate_otp;
use crate::policy::{Scope, may_verify};
use crate::validate::validate_month_year;

use super::{AppState, require_doctor, require_executive, require_location};

pub struct NewTransaction {
    pub doctor_id: ObjectId,
    pub executive_id: Option<ObjectId>,
    pub location_id: ObjectId,
    pub amount: f64,
    pub payment_mode: PaymentMode,
    pub month_year: String,
    pub status: Option<TransactionStatus>,
    pub delivery_date: Option<DateTime>,
}

/// Partial update; `None` means "leave untouched". An explicit value
/// always applies, including amount = 0.
#[derive(Default)]
pub struct TransactionPatch {
    pub doctor_id: Option<ObjectId>,
    pub executive_id: Option<ObjectId>,
    pub location_id: Option<ObjectId>,
    pub amount: Option<f64>,
    pub payment_mode: Option<PaymentMode>,
    pub month_year: Option<String>,
    pub status: Option<TransactionStatus>,
    pub delivery_date: Option<DateTime>,
}

#[derive(Default)]
pub struct TxFilters {
    pub status: Option<TransactionStatus>,
    pub location_id: Option<ObjectId>,
    pub doctor_id: Option<ObjectId>,
    pub executive_id: Option<ObjectId>,
    pub month_year: Option<String>,
}

/// Status at creation: an explicit status wins, otherwise presence of an
/// executive decides between in_progress and pending.
pub fn derived_status(
    explicit: Option<TransactionStatus>,
    has_executive: bool,
) -> TransactionStatus {
    if let Some(status) = explicit {
        return status;
    }
    if has_executive {
        TransactionStatus::InProgress
    } else {
        TransactionStatus::Pending
    }
}

fn summary_of(tx: &Transaction) -> TxSummary {
    TxSummary {
        amount: tx.amount,
        payment_mode: tx.payment_mode,
        month_year: tx.month_year.clone(),
    }
}

/// Email the OTP to the doctor. Resolution is by lookup and the send is
/// best-effort; a failure is logged and never surfaced to the caller.
async fn notify_otp(state: &AppState, tx: &Transaction, otp: &str) {
    let email = match state.doctors.find_one(doc! { "_id": tx.doctor_id }).await {
        Ok(Some(doctor)) => doctor.email,
        Ok(None) => None,
        Err(err) => {
            tracing::warn!(%err, "doctor lookup for otp email failed");
            return;
        }
    };
    let Some(email) = email else {
        tracing::warn!(doctor_id = %tx.doctor_id, "doctor has no email, otp not sent");
        return;
    };
    if let Err(err) = state
        .notifier
        .send_otp_email(email, otp.to_string(), summary_of(tx))
        .await
    {
        tracing::warn!(%err, "otp email failed");
    }
}

async fn notify_completion(state: &AppState, tx: &Transaction) {
    let doctor_email = state
        .doctors
        .find_one(doc! { "_id": tx.doctor_id })
        .await
        .ok()
        .flatten()
        .and_then(|d| d.email);
    let executive_email = match tx.executive_id {
        Some(id) => state
            .executives
            .find_one(doc! { "_id": id })
            .await
            .ok()
            .flatten()
            .and_then(|e| e.email),
        None => None,
    };
    if let Err(err) = state
        .notifier
        .send_completion_email(doctor_email, executive_email, summary_of(tx))
        .await
    {
        tracing::warn!(%err, "completion email failed");
    }
}

fn validate_amount(amount: f64) -> Result<(), ApiError> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(ApiError::Validation(format!("amount must be >= 0, got {amount}")));
    }
    Ok(())
}

pub async fn create_transaction(
    state: &AppState,
    input: NewTransaction,
) -> Result<Transaction, ApiError> {
    validate_amount(input.amount)?;
    validate_month_year(&input.month_year).map_err(ApiError::Validation)?;
    require_doctor(state, &input.doctor_id).await?;
    require_location(state, &input.location_id).await?;
    if let Some(executive_id) = &input.executive_id {
        require_executive(state, executive_id).await?;
    }

    let status = derived_status(input.status, input.executive_id.is_some());
    let otp = match status {
        TransactionStatus::InProgress => Some(generate_otp()),
        _ => None,
    };

    let now = DateTime::now();
    let mut tx = Transaction {
        id: None,
        doctor_id: input.doctor_id,
        executive_id: input.executive_id,
        location_id: input.location_id,
        amount: input.amount,
        payment_mode: input.payment_mode,
        month_year: input.month_year,
        status,
        delivery_date: input.delivery_date,
        otp,
        created_at: now,
        updated_at: now,
    };
    let res = state.transactions.insert_one(&tx).await?;
    tx.id = res.inserted_id.as_object_id();

    if let Some(otp) = &tx.otp {
        notify_otp(state, &tx, otp).await;
    }
    Ok(tx)
}

pub async fn list_transactions(
    state: &AppState,
    scope: &Scope,
    filters: &TxFilters,
) -> Result<Vec<Transaction>, ApiError> {
    let mut filter = doc! {};

    if let Some(doctor_id) = &filters.doctor_id {
        filter.insert("doctor_id", doctor_id);
    }
    if let Some(location_id) = &filters.location_id {
        filter.insert("location_id", location_id);
    }
    if let Some(month_year) = &filters.month_year {
        filter.insert("month_year", month_year);
    }

    match scope {
        Scope::All => {
            if let Some(executive_id) = &filters.executive_id {
                filter.insert("executive_id", executive_id);
            }
            if let Some(status) = filters.status {
                filter.insert("status", status.as_str());
            }
        }
        Scope::AssignedTo(me) => {
            // Executives never see pending or foreign transactions,
            // whatever the query filters say.
            filter.insert("executive_id", me);
            match filters.status {
                Some(TransactionStatus::Pending) => return Ok(Vec::new()),
                Some(status) => {
                    filter.insert("status", status.as_str());
                }
                None => {
                    filter.insert("status", doc! { "$in": ["in_progress", "completed"] });
                }
            }
        }
    }

    let mut cursor = state.transactions.find(filter).await?;
    let mut items = Vec::new();
    while let Some(tx) = cursor.try_next().await? {
        items.push(tx);
    }
    Ok(items)
}

pub async fn get_transaction_scoped(
    state: &AppState,
    id: &ObjectId,
    scope: &Scope,
) -> Result<Transaction, ApiError> {
    let tx = state
        .transactions
        .find_one(doc! { "_id": id })
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("transaction {id} not found")))?;
    if !crate::policy::scope_permits(scope, &tx) {
        return Err(ApiError::Forbidden("transaction is not visible to you".into()));
    }
    Ok(tx)
}

pub async fn update_transaction(
    state: &AppState,
    id: &ObjectId,
    patch: TransactionPatch,
) -> Result<Transaction, ApiError> {
    let existing = state
        .transactions
        .find_one(doc! { "_id": id })
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("transaction {id} not found")))?;

    if let Some(amount) = patch.amount {
        validate_amount(amount)?;
    }
    if let Some(month_year) = &patch.month_year {
        validate_month_year(month_year).map_err(ApiError::Validation)?;
    }
    if let Some(doctor_id) = &patch.doctor_id {
        require_doctor(state, doctor_id).await?;
    }
    if let Some(location_id) = &patch.location_id {
        require_location(state, location_id).await?;
    }
    if let Some(executive_id) = &patch.executive_id {
        require_executive(state, executive_id).await?;
    }

    let mut set = doc! {};
    if let Some(doctor_id) = &patch.doctor_id {
        set.insert("doctor_id", doctor_id);
    }
    if let Some(executive_id) = &patch.executive_id {
        set.insert("executive_id", executive_id);
    }
    if let Some(location_id) = &patch.location_id {
        set.insert("location_id", location_id);
    }
    if let Some(amount) = patch.amount {
        set.insert("amount", amount);
    }
    if let Some(payment_mode) = patch.payment_mode {
        set.insert("payment_mode", payment_mode.as_str());
    }
    if let Some(month_year) = &patch.month_year {
        set.insert("month_year", month_year);
    }
    if let Some(delivery_date) = patch.delivery_date {
        set.insert("delivery_date", delivery_date);
    }

    // Entering in_progress from any other status issues a fresh OTP and
    // re-notifies the doctor. An executive need not be supplied in the
    // same request; creation and update intentionally differ here.
    let mut fresh_otp = None;
    if let Some(status) = patch.status {
        set.insert("status", status.as_str());
        if status == TransactionStatus::InProgress
            && existing.status != TransactionStatus::InProgress
        {
            let otp = generate_otp();
            set.insert("otp", otp.as_str());
            fresh_otp = Some(otp);
        }
    }
    set.insert("updated_at", DateTime::now());

    state
        .transactions
        .update_one(doc! { "_id": id }, doc! { "$set": set })
        .await?;

    let updated = state
        .transactions
        .find_one(doc! { "_id": id })
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("transaction {id} not found")))?;

    if let Some(otp) = fresh_otp {
        notify_otp(state, &updated, &otp).await;
    }
    Ok(updated)
}

pub async fn delete_transaction(state: &AppState, id: &ObjectId) -> Result<(), ApiError> {
    let res = state.transactions.delete_one(doc! { "_id": id }).await?;
    if res.deleted_count == 0 {
        return Err(ApiError::NotFound(format!("transaction {id} not found")));
    }
    Ok(())
}

/// OTP verification. Checks run in a fixed order, each with its own
/// error; the transition itself is one atomic conditional update so two
/// racing verifies cannot both complete.
pub async fn verify_transaction_otp(
    state: &AppState,
    id: &ObjectId,
    role: Role,
    principal_id: &ObjectId,
    code: &str,
) -> Result<Transaction, ApiError> {
    let tx = state
        .transactions
        .find_one(doc! { "_id": id })
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("transaction {id} not found")))?;

    if !may_verify(role, principal_id, &tx) {
        return Err(ApiError::Forbidden(
            "you are not allowed to verify this transaction".into(),
        ));
    }
    if tx.status != TransactionStatus::InProgress {
        return Err(ApiError::InvalidState(format!(
            "cannot verify a {} transaction",
            tx.status.as_str()
        )));
    }
    let stored = tx
        .otp
        .as_deref()
        .ok_or_else(|| ApiError::InvalidState("no otp issued for this transaction".into()))?;
    if code.trim() != stored.trim() {
        return Err(ApiError::InvalidState("incorrect otp".into()));
    }

    let now = DateTime::now();
    let completed = state
        .transactions
        .find_one_and_update(
            doc! { "_id": id, "status": "in_progress", "otp": stored },
            doc! { "$set": {
                "status": "completed",
                "delivery_date": now,
                "updated_at": now,
            } },
        )
        .return_document(ReturnDocument::After)
        .await?
        .ok_or_else(|| {
            ApiError::InvalidState("transaction changed during verification".into())
        })?;

    notify_completion(state, &completed).await;
    Ok(completed)
}

#[derive(Debug, Serialize)]
pub struct BulkError {
    /// 1-based position in the submitted list.
    pub row: usize,
    pub reason: String,
}

pub struct BulkOutcome {
    pub created: Vec<Transaction>,
    pub errors: Vec<BulkError>,
}

/// Each spec goes through the single-create path independently; one bad
/// row never aborts the rest. Rows that already failed decoding upstream
/// arrive as `Err` and are reported in place.
pub async fn bulk_create_transactions(
    state: &AppState,
    specs: Vec<Result<NewTransaction, ApiError>>,
) -> Result<BulkOutcome, ApiError> {
    let mut created = Vec::new();
    let mut errors = Vec::new();
    for (index, spec) in specs.into_iter().enumerate() {
        let outcome = match spec {
            Ok(spec) => create_transaction(state, spec).await,
            Err(err) => Err(err),
        };
        match outcome {
            Ok(tx) => created.push(tx),
            Err(err) => errors.push(BulkError {
                row: index + 1,
                reason: err.to_string(),
            }),
        }
    }
    Ok(BulkOutcome { created, errors })
}

#[derive(Debug, Default, Serialize, PartialEq)]
pub struct StatsBucket {
    pub count: u64,
    pub amount: f64,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransactionStats {
    pub delivered: StatsBucket,
    pub in_progress: StatsBucket,
    pub pending: StatsBucket,
    pub cash_in_hand: f64,
}

/// Fold visible transactions into the three status buckets plus the
/// cash-in-hand total.
pub fn summarize<'a, I>(transactions: I) -> TransactionStats
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut stats = TransactionStats {
        delivered: StatsBucket::default(),
        in_progress: StatsBucket::default(),
        pending: StatsBucket::default(),
        cash_in_hand: 0.0,
    };
    for tx in transactions {
        let bucket = match tx.status {
            TransactionStatus::Completed => &mut stats.delivered,
            TransactionStatus::InProgress => &mut stats.in_progress,
            TransactionStatus::Pending => &mut stats.pending,
        };
        bucket.count += 1;
        bucket.amount += tx.amount;
        if tx.payment_mode == PaymentMode::Cash {
            stats.cash_in_hand += tx.amount;
        }
    }
    stats
}

pub async fn transaction_statistics(
    state: &AppState,
    scope: &Scope,
) -> Result<TransactionStats, ApiError> {
    let visible = list_transactions(state, scope, &TxFilters::default()).await?;
    Ok(summarize(visible.iter()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_derivation_at_creation() {
        assert_eq!(derived_status(None, false), TransactionStatus::Pending);
        assert_eq!(derived_status(None, true), TransactionStatus::InProgress);
        assert_eq!(
            derived_status(Some(TransactionStatus::Completed), false),
            TransactionStatus::Completed
        );
        assert_eq!(
            derived_status(Some(TransactionStatus::Pending), true),
            TransactionStatus::Pending
        );
    }

    fn tx(status: TransactionStatus, amount: f64, payment_mode: PaymentMode) -> Transaction {
        Transaction {
            id: Some(ObjectId::new()),
            doctor_id: ObjectId::new(),
            executive_id: None,
            location_id: ObjectId::new(),
            amount,
            payment_mode,
            month_year: "03/2026".into(),
            status,
            delivery_date: None,
            otp: None,
            created_at: DateTime::now(),
            updated_at: DateTime::now(),
        }
    }

    #[test]
    fn statistics_bucket_by_status_and_sum_cash() {
        let transactions = vec![
            tx(TransactionStatus::Completed, 100.0, PaymentMode::OnlineTransfer),
            tx(TransactionStatus::InProgress, 200.0, PaymentMode::OnlineTransfer),
            tx(TransactionStatus::Pending, 50.0, PaymentMode::OnlineTransfer),
            tx(TransactionStatus::Completed, 300.0, PaymentMode::Cash),
        ];
        let stats = summarize(transactions.iter());
        assert_eq!(stats.delivered, StatsBucket { count: 2, amount: 400.0 });
        assert_eq!(stats.in_progress, StatsBucket { count: 1, amount: 200.0 });
        assert_eq!(stats.pending, StatsBucket { count: 1, amount: 50.0 });
        assert_eq!(stats.cash_in_hand, 300.0);
    }

    #[test]
    fn statistics_of_empty_scope_are_zero() {
        let stats = summarize(std::iter::empty::<&Transaction>());
        assert_eq!(stats.delivered, StatsBucket::default());
        assert_eq!(stats.cash_in_hand, 0.0);
    }
}
