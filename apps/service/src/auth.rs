//! # Caller Identity and Capabilities
//!
//! Every command receives a [`Caller`] resolved by the transport in front
//! of the service and checks one [`Capability`] before touching the store.
//!
//! ## Capability Matrix
//! ```text
//! ┌────────────────────┬──────────┬──────┬───────┐
//! │ Capability         │ CUSTOMER │ CHEF │ ADMIN │
//! ├────────────────────┼──────────┼──────┼───────┤
//! │ ManageCart         │    ✓     │      │       │
//! │ PlaceOrder         │    ✓     │      │       │
//! │ ViewOwnOrders      │    ✓     │      │       │
//! │ ManageAddresses    │    ✓     │      │       │
//! │ ManageMenu         │          │  ✓   │   ✓   │
//! │ ManageKitchen      │          │  ✓   │   ✓   │
//! │ ViewAllOrders      │          │      │   ✓   │
//! │ UpdateOrderStatus  │          │      │   ✓   │
//! │ MarkPaid           │          │      │   ✓   │
//! │ ApproveKitchen     │          │      │   ✓   │
//! └────────────────────┴──────────┴──────┴───────┘
//! ```
//!
//! Browsing (`public_menu`, `list_categories`) needs no caller at all.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ApiError, ErrorCode};

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Customer,
    Chef,
    Admin,
}

/// An action a command needs permission for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    ManageCart,
    PlaceOrder,
    ViewOwnOrders,
    ManageAddresses,
    ManageMenu,
    ManageKitchen,
    ViewAllOrders,
    UpdateOrderStatus,
    MarkPaid,
    ApproveKitchen,
}

impl Role {
    /// Whether this role holds `capability`.
    pub fn can(&self, capability: Capability) -> bool {
        use Capability::*;

        match self {
            Role::Customer => matches!(
                capability,
                ManageCart | PlaceOrder | ViewOwnOrders | ManageAddresses
            ),
            Role::Chef => matches!(capability, ManageMenu | ManageKitchen),
            Role::Admin => matches!(
                capability,
                ManageMenu
                    | ManageKitchen
                    | ViewAllOrders
                    | UpdateOrderStatus
                    | MarkPaid
                    | ApproveKitchen
            ),
        }
    }
}

/// The authenticated identity behind a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Caller {
    pub user_id: String,
    pub role: Role,
}

impl Caller {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Caller {
            user_id: user_id.into(),
            role,
        }
    }

    pub fn customer(user_id: impl Into<String>) -> Self {
        Caller::new(user_id, Role::Customer)
    }

    pub fn chef(user_id: impl Into<String>) -> Self {
        Caller::new(user_id, Role::Chef)
    }

    pub fn admin(user_id: impl Into<String>) -> Self {
        Caller::new(user_id, Role::Admin)
    }

    /// Checks the caller may use `capability` and returns their user id.
    ///
    /// ## Errors
    /// - `UNAUTHORIZED` if the user id is blank
    /// - `FORBIDDEN` if the role lacks the capability
    pub fn require(&self, capability: Capability) -> Result<&str, ApiError> {
        let user_id = self.user_id.trim();

        if user_id.is_empty() {
            return Err(ApiError::new(
                ErrorCode::Unauthorized,
                "Sign in to continue",
            ));
        }

        if !self.role.can(capability) {
            warn!(user_id = %user_id, role = ?self.role, capability = ?capability, "Capability denied");
            return Err(ApiError::new(
                ErrorCode::Forbidden,
                format!("{:?} accounts cannot perform {:?}", self.role, capability),
            ));
        }

        Ok(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_customer_capabilities() {
        let caller = Caller::customer("cust-1");

        assert_eq!(caller.require(Capability::PlaceOrder).unwrap(), "cust-1");
        assert!(caller.require(Capability::ManageAddresses).is_ok());

        let err = caller.require(Capability::MarkPaid).unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
        assert!(caller.require(Capability::ManageMenu).is_err());
    }

    #[test]
    fn test_chef_cannot_order_or_approve() {
        let chef = Caller::chef("chef-1");

        assert!(chef.require(Capability::ManageMenu).is_ok());
        assert!(chef.require(Capability::ManageKitchen).is_ok());
        assert_eq!(
            chef.require(Capability::PlaceOrder).unwrap_err().code,
            ErrorCode::Forbidden
        );
        assert_eq!(
            chef.require(Capability::ApproveKitchen).unwrap_err().code,
            ErrorCode::Forbidden
        );
    }

    #[test]
    fn test_admin_runs_operations_but_has_no_cart() {
        let admin = Caller::admin("admin-1");

        for capability in [
            Capability::ViewAllOrders,
            Capability::UpdateOrderStatus,
            Capability::MarkPaid,
            Capability::ApproveKitchen,
            Capability::ManageMenu,
        ] {
            assert!(admin.require(capability).is_ok(), "{capability:?}");
        }

        assert!(admin.require(Capability::ManageCart).is_err());
    }

    #[test]
    fn test_blank_user_is_unauthorized() {
        let err = Caller::admin("  ").require(Capability::MarkPaid).unwrap_err();
        assert_eq!(err.code, ErrorCode::Unauthorized);
    }

    #[test]
    fn test_role_wire_names() {
        let caller: Caller =
            serde_json::from_str(r#"{"userId":"u-1","role":"CHEF"}"#).unwrap();
        assert_eq!(caller, Caller::chef("u-1"));
    }
}
