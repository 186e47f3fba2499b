// models.rs
// Domain documents for the MongoDB collections and the shared enums.

use mongodb::bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

/// Roles a principal can hold. Staff users carry one of the first four;
/// executives always authenticate as `Executive`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Superadmin,
    Accountant,
    Executive,
    Doctor,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Superadmin => "superadmin",
            Role::Accountant => "accountant",
            Role::Executive => "executive",
            Role::Doctor => "doctor",
        }
    }

    /// Admin-tier roles pass the platform gate even when disabled.
    pub fn is_admin_tier(&self) -> bool {
        matches!(self, Role::Admin | Role::Superadmin)
    }
}

/// Lifecycle of a reward delivery.
/// pending: no executive assigned, no OTP.
/// in_progress: executive assigned, OTP issued, awaiting verification.
/// completed: OTP verified, delivery date recorded. Terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    InProgress,
    Completed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::InProgress => "in_progress",
            TransactionStatus::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PaymentMode {
    Cash,
    OnlineTransfer,
}

impl PaymentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMode::Cash => "Cash",
            PaymentMode::OnlineTransfer => "OnlineTransfer",
        }
    }
}

/// Central entity: one reward delivery to a doctor for one period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub doctor_id: ObjectId,
    pub executive_id: Option<ObjectId>,
    pub location_id: ObjectId,
    pub amount: f64,
    pub payment_mode: PaymentMode,
    /// Reward period label, `MM/YYYY`.
    pub month_year: String,
    pub status: TransactionStatus,
    pub delivery_date: Option<DateTime>,
    pub otp: Option<String>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

/// Doctor receiving rewards. The notification email is optional and
/// resolved by lookup at send time, never assumed joined.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    /// Canonical form `+91-XXXXXXXXXX`.
    pub phone: String,
    pub email: Option<String>,
    pub location_id: ObjectId,
    pub created_at: DateTime,
}

/// Field executive. Credentials are generated server-side at creation and
/// stored as-is; they are returned to the caller exactly once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Executive {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub location_id: ObjectId,
    pub username: String,
    pub password: String,
    pub created_at: DateTime,
}

/// Staff principal (admin, superadmin, accountant, doctor) with a bcrypt
/// password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffUser {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub email: Option<String>,
    pub created_at: DateTime,
}

/// Static reference entity; a handful of rows, name is unique.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub address: String,
}

/// Process-wide singleton toggle. Exactly one document ever exists;
/// created with `is_enabled: true` on first access.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformSettings {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub is_enabled: bool,
}

/// Bearer token linking an opaque token string to a principal and expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub token: String,
    pub principal_id: ObjectId,
    pub expires_at: DateTime,
}
