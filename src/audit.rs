//! Write-only audit trail of admin activity. A failed audit write is logged
//! and swallowed so it can never break the operation it describes.

use chrono::Utc;
use serde_json::{json, Value};
use tracing::error;

use crate::store::{Store, AUDIT_LOGS};

#[derive(Clone, Copy, Debug)]
pub enum AuditAction {
    Login,
    Logout,
    CreateProduct,
    UpdateProduct,
    DeleteProduct,
    ToggleProduct,
    CreateCategory,
    UpdateCategory,
    DeleteCategory,
}

impl AuditAction {
    pub fn as_str(self) -> &'static str {
        match self {
            AuditAction::Login => "LOGIN",
            AuditAction::Logout => "LOGOUT",
            AuditAction::CreateProduct => "CREATE_PRODUCT",
            AuditAction::UpdateProduct => "UPDATE_PRODUCT",
            AuditAction::DeleteProduct => "DELETE_PRODUCT",
            AuditAction::ToggleProduct => "TOGGLE_PRODUCT",
            AuditAction::CreateCategory => "CREATE_CATEGORY",
            AuditAction::UpdateCategory => "UPDATE_CATEGORY",
            AuditAction::DeleteCategory => "DELETE_CATEGORY",
        }
    }
}

pub async fn record(
    store: &dyn Store,
    user_id: Option<&str>,
    action: AuditAction,
    resource: &str,
    details: Option<Value>,
    ip_address: Option<&str>,
) {
    let row = json!({
        "user_id": user_id,
        "action": action.as_str(),
        "resource": resource,
        "details": details,
        "ip_address": ip_address.unwrap_or("unknown"),
        "created_at": Utc::now(),
    });

    if let Err(e) = store.insert(AUDIT_LOGS, row).await {
        error!("Audit log write failed: {e}");
    }
}
