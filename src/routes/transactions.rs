// routes/transactions.rs
// The transaction lifecycle endpoints. Authorization and visibility all
// go through the policy module; handlers stay thin.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use crate::auth::CurrentUser;
use crate::errors::ApiError;
use crate::models::{PaymentMode, Transaction, TransactionStatus};
use crate::policy::{TxAction, role_allows, visibility_scope};
use crate::state::{
    AppState, BulkError, NewTransaction, TransactionPatch, TransactionStats, TxFilters,
    bulk_create_transactions, create_transaction, delete_transaction, get_transaction_scoped,
    list_transactions, transaction_statistics, update_transaction, verify_transaction_otp,
};

use super::{hex, parse_object_id, parse_rfc3339, rfc3339};

/// API shape of a transaction. The stored OTP is deliberately absent:
/// it travels to the doctor by email only.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionView {
    pub id: String,
    pub doctor_id: String,
    pub executive_id: Option<String>,
    pub location_id: String,
    pub amount: f64,
    pub payment_mode: PaymentMode,
    pub month_year: String,
    pub status: TransactionStatus,
    pub delivery_date: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Transaction> for TransactionView {
    fn from(tx: Transaction) -> Self {
        TransactionView {
            id: hex(&tx.id),
            doctor_id: tx.doctor_id.to_hex(),
            executive_id: tx.executive_id.map(|id| id.to_hex()),
            location_id: tx.location_id.to_hex(),
            amount: tx.amount,
            payment_mode: tx.payment_mode,
            month_year: tx.month_year,
            status: tx.status,
            delivery_date: tx.delivery_date.as_ref().map(rfc3339),
            created_at: rfc3339(&tx.created_at),
            updated_at: rfc3339(&tx.updated_at),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionBody {
    pub doctor_id: String,
    pub executive_id: Option<String>,
    pub location_id: String,
    pub amount: f64,
    pub payment_mode: PaymentMode,
    pub month_year: String,
    pub status: Option<TransactionStatus>,
    pub delivery_date: Option<String>,
}

fn to_new_transaction(body: CreateTransactionBody) -> Result<NewTransaction, ApiError> {
    Ok(NewTransaction {
        doctor_id: parse_object_id(&body.doctor_id, "doctor")?,
        executive_id: body
            .executive_id
            .as_deref()
            .map(|id| parse_object_id(id, "executive"))
            .transpose()?,
        location_id: parse_object_id(&body.location_id, "location")?,
        amount: body.amount,
        payment_mode: body.payment_mode,
        month_year: body.month_year,
        status: body.status,
        delivery_date: body
            .delivery_date
            .as_deref()
            .map(|d| parse_rfc3339(d, "delivery date"))
            .transpose()?,
    })
}

pub async fn transactions_create(
    current: CurrentUser,
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateTransactionBody>,
) -> Result<(StatusCode, Json<TransactionView>), ApiError> {
    if !role_allows(current.role(), TxAction::Create) {
        return Err(ApiError::Forbidden(
            "your role may not create transactions".into(),
        ));
    }
    let tx = create_transaction(&state, to_new_transaction(body)?).await?;
    Ok((StatusCode::CREATED, Json(tx.into())))
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TransactionListQuery {
    pub status: Option<TransactionStatus>,
    pub location_id: Option<String>,
    pub doctor_id: Option<String>,
    pub executive_id: Option<String>,
    pub month_year: Option<String>,
}

pub async fn transactions_index(
    current: CurrentUser,
    State(state): State<Arc<AppState>>,
    Query(query): Query<TransactionListQuery>,
) -> Result<Json<Vec<TransactionView>>, ApiError> {
    if !role_allows(current.role(), TxAction::List) {
        return Err(ApiError::Forbidden("your role may not list transactions".into()));
    }
    let scope = visibility_scope(current.role(), &current.principal_id());
    let filters = TxFilters {
        status: query.status,
        location_id: query
            .location_id
            .as_deref()
            .map(|id| parse_object_id(id, "location"))
            .transpose()?,
        doctor_id: query
            .doctor_id
            .as_deref()
            .map(|id| parse_object_id(id, "doctor"))
            .transpose()?,
        executive_id: query
            .executive_id
            .as_deref()
            .map(|id| parse_object_id(id, "executive"))
            .transpose()?,
        month_year: query.month_year,
    };
    let transactions = list_transactions(&state, &scope, &filters).await?;
    Ok(Json(transactions.into_iter().map(Into::into).collect()))
}

pub async fn transactions_statistics(
    current: CurrentUser,
    State(state): State<Arc<AppState>>,
) -> Result<Json<TransactionStats>, ApiError> {
    if !role_allows(current.role(), TxAction::List) {
        return Err(ApiError::Forbidden("your role may not view statistics".into()));
    }
    let scope = visibility_scope(current.role(), &current.principal_id());
    let stats = transaction_statistics(&state, &scope).await?;
    Ok(Json(stats))
}

pub async fn transactions_show(
    current: CurrentUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<TransactionView>, ApiError> {
    if !role_allows(current.role(), TxAction::View) {
        return Err(ApiError::Forbidden("your role may not view transactions".into()));
    }
    let id = parse_object_id(&id, "transaction")?;
    let scope = visibility_scope(current.role(), &current.principal_id());
    let tx = get_transaction_scoped(&state, &id, &scope).await?;
    Ok(Json(tx.into()))
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTransactionBody {
    pub doctor_id: Option<String>,
    pub executive_id: Option<String>,
    pub location_id: Option<String>,
    pub amount: Option<f64>,
    pub payment_mode: Option<PaymentMode>,
    pub month_year: Option<String>,
    pub status: Option<TransactionStatus>,
    pub delivery_date: Option<String>,
}

pub async fn transactions_update(
    current: CurrentUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<UpdateTransactionBody>,
) -> Result<Json<TransactionView>, ApiError> {
    if !role_allows(current.role(), TxAction::Update) {
        return Err(ApiError::Forbidden(
            "your role may not update transactions".into(),
        ));
    }
    let id = parse_object_id(&id, "transaction")?;
    let patch = TransactionPatch {
        doctor_id: body
            .doctor_id
            .as_deref()
            .map(|v| parse_object_id(v, "doctor"))
            .transpose()?,
        executive_id: body
            .executive_id
            .as_deref()
            .map(|v| parse_object_id(v, "executive"))
            .transpose()?,
        location_id: body
            .location_id
            .as_deref()
            .map(|v| parse_object_id(v, "location"))
            .transpose()?,
        amount: body.amount,
        payment_mode: body.payment_mode,
        month_year: body.month_year,
        status: body.status,
        delivery_date: body
            .delivery_date
            .as_deref()
            .map(|v| parse_rfc3339(v, "delivery date"))
            .transpose()?,
    };
    let tx = update_transaction(&state, &id, patch).await?;
    Ok(Json(tx.into()))
}

pub async fn transactions_delete(
    current: CurrentUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if !role_allows(current.role(), TxAction::Delete) {
        return Err(ApiError::Forbidden(
            "your role may not delete transactions".into(),
        ));
    }
    let id = parse_object_id(&id, "transaction")?;
    delete_transaction(&state, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct VerifyOtpBody {
    pub otp: String,
}

pub async fn transactions_verify_otp(
    current: CurrentUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<VerifyOtpBody>,
) -> Result<Json<TransactionView>, ApiError> {
    let id = parse_object_id(&id, "transaction")?;
    let tx = verify_transaction_otp(
        &state,
        &id,
        current.role(),
        &current.principal_id(),
        &body.otp,
    )
    .await?;
    Ok(Json(tx.into()))
}

#[derive(Deserialize)]
pub struct BulkCreateBody {
    pub transactions: Vec<CreateTransactionBody>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkCreateResponse {
    pub created_count: usize,
    pub failed_count: usize,
    pub created: Vec<TransactionView>,
    pub errors: Vec<BulkError>,
}

pub async fn transactions_bulk_create(
    current: CurrentUser,
    State(state): State<Arc<AppState>>,
    Json(body): Json<BulkCreateBody>,
) -> Result<(StatusCode, Json<BulkCreateResponse>), ApiError> {
    if !role_allows(current.role(), TxAction::Create) {
        return Err(ApiError::Forbidden(
            "your role may not create transactions".into(),
        ));
    }
    let specs = body
        .transactions
        .into_iter()
        .map(to_new_transaction)
        .collect();
    let outcome = bulk_create_transactions(&state, specs).await?;
    Ok((
        StatusCode::CREATED,
        Json(BulkCreateResponse {
            created_count: outcome.created.len(),
            failed_count: outcome.errors.len(),
            created: outcome.created.into_iter().map(Into::into).collect(),
            errors: outcome.errors,
        }),
    ))
}
