// policy.rs
// Declarative authorization and scoping rules for transactions.
// Every transaction endpoint consults this table instead of carrying its
// own inline role checks.

use mongodb::bson::oid::ObjectId;

use crate::models::{Role, Transaction, TransactionStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxAction {
    Create,
    Update,
    Delete,
    List,
    View,
    VerifyOtp,
}

/// Role x action capability table.
pub fn role_allows(role: Role, action: TxAction) -> bool {
    match action {
        TxAction::Create | TxAction::Update => {
            matches!(role, Role::Admin | Role::Superadmin | Role::Accountant)
        }
        TxAction::Delete => role.is_admin_tier(),
        // Everyone may list/view; executives are narrowed by scope below.
        TxAction::List | TxAction::View => true,
        TxAction::VerifyOtp => {
            // The assigned executive, or any staff role above executive.
            matches!(
                role,
                Role::Admin | Role::Superadmin | Role::Accountant | Role::Executive
            )
        }
    }
}

/// What subset of transactions a principal may see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Unfiltered, subject only to explicit query filters.
    All,
    /// Only transactions assigned to this executive, and only once they
    /// have left `pending`.
    AssignedTo(ObjectId),
}

pub fn visibility_scope(role: Role, principal_id: &ObjectId) -> Scope {
    if role == Role::Executive {
        Scope::AssignedTo(*principal_id)
    } else {
        Scope::All
    }
}

/// Whether a single transaction is visible under a scope. An unassigned or
/// still-pending transaction is invisible to executives.
pub fn scope_permits(scope: &Scope, tx: &Transaction) -> bool {
    match scope {
        Scope::All => true,
        Scope::AssignedTo(executive_id) => {
            tx.executive_id.as_ref() == Some(executive_id)
                && matches!(
                    tx.status,
                    TransactionStatus::InProgress | TransactionStatus::Completed
                )
        }
    }
}

/// Whether a principal may attempt OTP verification on this transaction.
/// Executives must be the assigned executive; authorized staff may always
/// attempt (the state checks come afterwards).
pub fn may_verify(role: Role, principal_id: &ObjectId, tx: &Transaction) -> bool {
    if !role_allows(role, TxAction::VerifyOtp) {
        return false;
    }
    if role == Role::Executive {
        return tx.executive_id.as_ref() == Some(principal_id);
    }
    true
}
