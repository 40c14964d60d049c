//! # Domain Types
//!
//! Core domain types used throughout Tiffin.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Catalog (external)        Mutable                 Frozen               │
//! │  ──────────────────        ───────                 ──────               │
//! │  Kitchen (one)             Cart (one/customer)     Order                │
//! │  Category ◄── MenuItem                                                  │
//! │  MenuItem ── price ──────► CartLine ── copy ─────► OrderLine            │
//! │                              unit_price_paise        price_paise        │
//! │  Address ──────────────────── copy ──────────────► DeliveryAddress      │
//! │                                                    Payment              │
//! │                                                                         │
//! │  OrderStatus:   PLACED → ACCEPTED → PREPARED → OUT_FOR_DELIVERY →       │
//! │                 DELIVERED                                               │
//! │  PaymentMode:   UPI | COD                                               │
//! │  PaymentStatus: INITIATED (UPI) | PENDING (COD) → PAID                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! A cart line captures the menu price when the item is added; the order
//! line copies that captured price. Later catalog edits never reach either.
//! The delivery address is copied into the order the same way.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;

// =============================================================================
// Order Status
// =============================================================================

/// Fulfillment status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum OrderStatus {
    /// Order created from the cart. The only initial state.
    Placed,
    /// Kitchen accepted the order.
    Accepted,
    /// Food is ready.
    Prepared,
    /// Rider picked it up.
    OutForDelivery,
    /// Handed to the customer.
    Delivered,
}

impl OrderStatus {
    /// All states in fulfillment order.
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Placed,
        OrderStatus::Accepted,
        OrderStatus::Prepared,
        OrderStatus::OutForDelivery,
        OrderStatus::Delivered,
    ];

    /// Wire name, e.g. `OUT_FOR_DELIVERY`.
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Placed => "PLACED",
            OrderStatus::Accepted => "ACCEPTED",
            OrderStatus::Prepared => "PREPARED",
            OrderStatus::OutForDelivery => "OUT_FOR_DELIVERY",
            OrderStatus::Delivered => "DELIVERED",
        }
    }

    /// The next state in the linear fulfillment order, if any.
    pub const fn next(&self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Placed => Some(OrderStatus::Accepted),
            OrderStatus::Accepted => Some(OrderStatus::Prepared),
            OrderStatus::Prepared => Some(OrderStatus::OutForDelivery),
            OrderStatus::OutForDelivery => Some(OrderStatus::Delivered),
            OrderStatus::Delivered => None,
        }
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Placed
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: OrderStatus::ALL.iter().map(|s| s.as_str().to_string()).collect(),
            })
    }
}

// =============================================================================
// Status Policy
// =============================================================================

/// Rule set for externally triggered status changes.
///
/// ## Policies
/// ```text
/// Unrestricted (default):  any status except PLACED may follow any other
/// Linear:                  only status.next() is accepted
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusPolicy {
    #[default]
    Unrestricted,
    Linear,
}

impl StatusPolicy {
    /// Checks whether an order may move from `from` to `to`.
    ///
    /// PLACED is only ever assigned at placement, so it is never a valid
    /// target under either policy.
    pub fn check(&self, from: OrderStatus, to: OrderStatus) -> CoreResult<()> {
        if to == OrderStatus::Placed {
            return Err(ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: OrderStatus::ALL[1..]
                    .iter()
                    .map(|s| s.as_str().to_string())
                    .collect(),
            }
            .into());
        }

        match self {
            StatusPolicy::Unrestricted => Ok(()),
            StatusPolicy::Linear if from.next() == Some(to) => Ok(()),
            StatusPolicy::Linear => Err(CoreError::InvalidTransition { from, to }),
        }
    }
}

// =============================================================================
// Payment Mode / Status
// =============================================================================

/// How the customer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum PaymentMode {
    /// Online UPI transfer.
    Upi,
    /// Cash on delivery.
    Cod,
}

impl PaymentMode {
    /// Wire name, `UPI` or `COD`.
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMode::Upi => "UPI",
            PaymentMode::Cod => "COD",
        }
    }

    /// Status a freshly created payment starts in.
    pub const fn initial_status(&self) -> PaymentStatus {
        match self {
            PaymentMode::Cod => PaymentStatus::Pending,
            PaymentMode::Upi => PaymentStatus::Initiated,
        }
    }
}

impl fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "UPI" => Ok(PaymentMode::Upi),
            "COD" => Ok(PaymentMode::Cod),
            _ => Err(ValidationError::NotAllowed {
                field: "paymentMode".to_string(),
                allowed: vec!["UPI".to_string(), "COD".to_string()],
            }),
        }
    }
}

/// Settlement status of a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum PaymentStatus {
    /// UPI collect request raised, not yet confirmed.
    Initiated,
    /// Cash due on delivery.
    Pending,
    /// Settled.
    Paid,
}

// =============================================================================
// Catalog: Kitchen / Category / MenuItem
// =============================================================================

/// Whether a dish contains meat, fish or egg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum FoodType {
    #[default]
    Veg,
    NonVeg,
}

impl FoodType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            FoodType::Veg => "VEG",
            FoodType::NonVeg => "NON_VEG",
        }
    }
}

impl fmt::Display for FoodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FoodType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "VEG" => Ok(FoodType::Veg),
            "NON_VEG" => Ok(FoodType::NonVeg),
            _ => Err(ValidationError::NotAllowed {
                field: "foodType".to_string(),
                allowed: vec!["VEG".to_string(), "NON_VEG".to_string()],
            }),
        }
    }
}

/// Portion size of a tiffin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum TiffinSize {
    Half,
    Full,
}

impl TiffinSize {
    pub const fn as_str(&self) -> &'static str {
        match self {
            TiffinSize::Half => "HALF",
            TiffinSize::Full => "FULL",
        }
    }
}

impl fmt::Display for TiffinSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TiffinSize {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "HALF" => Ok(TiffinSize::Half),
            "FULL" => Ok(TiffinSize::Full),
            _ => Err(ValidationError::NotAllowed {
                field: "tiffinSize".to_string(),
                allowed: vec!["HALF".to_string(), "FULL".to_string()],
            }),
        }
    }
}

/// The kitchen that prepares orders. A deployment has exactly one.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Kitchen {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    /// Set by an administrator; unapproved kitchens cannot take orders.
    pub is_approved: bool,
    /// Operator switch for temporarily closing the kitchen.
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Kitchen {
    /// Whether the kitchen may receive new orders.
    pub fn accepts_orders(&self) -> bool {
        self.is_approved && self.is_active
    }
}

/// Changes to a kitchen's profile. `None` keeps the current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct KitchenUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// A menu section such as "Thali" or "Breakfast".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub image_url: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub image_url: Option<String>,
}

/// A purchasable item on a kitchen's menu.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct MenuItem {
    pub id: String,
    pub kitchen_id: String,
    pub category_id: Option<String>,
    pub name: String,
    pub description: Option<String>,
    /// Current catalog price in paise.
    pub price_paise: i64,
    pub food_type: FoodType,
    pub tiffin_size: Option<TiffinSize>,
    pub image_url: Option<String>,
    pub is_available: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl MenuItem {
    /// A new available VEG item with no category, size or image.
    pub fn new(kitchen_id: impl Into<String>, name: impl Into<String>, price_paise: i64) -> Self {
        let now = Utc::now();
        MenuItem {
            id: uuid::Uuid::new_v4().to_string(),
            kitchen_id: kitchen_id.into(),
            category_id: None,
            name: name.into(),
            description: None,
            price_paise,
            food_type: FoodType::Veg,
            tiffin_size: None,
            image_url: None,
            is_available: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns the current price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_paise(self.price_paise)
    }
}

/// One row of a dish's nutrition table, e.g. `protein = 12 g`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct NutritionFact {
    pub key: String,
    pub value: String,
    pub unit: Option<String>,
}

/// A menu item with its category and nutrition table.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MenuItemDetail {
    pub item: MenuItem,
    pub category: Option<Category>,
    pub nutrition: Vec<NutritionFact>,
}

/// Changes to a menu item. `None` keeps the current value; `Some(vec)`
/// for `nutrition` replaces the whole table.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MenuItemUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price_paise: Option<i64>,
    pub category_id: Option<String>,
    pub food_type: Option<FoodType>,
    pub tiffin_size: Option<TiffinSize>,
    pub image_url: Option<String>,
    pub is_available: Option<bool>,
    pub nutrition: Option<Vec<NutritionFact>>,
}

/// Filters for the customer-facing menu. Only available items are listed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MenuFilter {
    pub category_id: Option<String>,
    pub food_type: Option<FoodType>,
}

// =============================================================================
// Address
// =============================================================================

/// A customer's delivery address.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Address {
    pub id: String,
    pub owner_id: String,
    pub receiver_name: String,
    pub contact_number: String,
    pub house_number: String,
    pub sector: String,
    pub landmark: Option<String>,
    pub postcode: String,
    pub map_url: Option<String>,
    pub is_default: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Changes to an address. `None` keeps the current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AddressUpdate {
    pub receiver_name: Option<String>,
    pub contact_number: Option<String>,
    pub house_number: Option<String>,
    pub sector: Option<String>,
    pub landmark: Option<String>,
    pub postcode: Option<String>,
    pub map_url: Option<String>,
    /// `Some(true)` makes this the owner's only default address.
    pub is_default: Option<bool>,
}

// =============================================================================
// Cart
// =============================================================================

/// A customer's cart. Exactly one per customer, emptied on order placement.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Cart {
    pub id: String,
    pub owner_id: String,
    /// Bumped on every line mutation and placement attempt.
    pub version: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// A line in a cart.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CartLine {
    pub id: String,
    pub cart_id: String,
    pub menu_item_id: String,
    pub quantity: i64,
    /// Menu price captured when the item was first added (frozen).
    pub unit_price_paise: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl CartLine {
    /// Returns the captured unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_paise(self.unit_price_paise)
    }

    /// Captured unit price × quantity.
    ///
    /// ## Errors
    /// - [`CoreError::TotalOverflow`] if the product overflows
    #[inline]
    pub fn line_total(&self) -> CoreResult<Money> {
        self.unit_price()
            .checked_mul(self.quantity)
            .ok_or(CoreError::TotalOverflow)
    }
}

/// A cart line joined with the current catalog state of its menu item.
///
/// The catalog columns are `None` when the menu item has been deleted.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CartLineView {
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    #[serde(flatten)]
    pub line: CartLine,
    pub menu_item_name: Option<String>,
    pub current_price_paise: Option<i64>,
    pub is_available: Option<bool>,
}

/// A cart with its lines, as returned to the customer.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartView {
    pub cart: Cart,
    pub lines: Vec<CartLineView>,
}

impl CartView {
    /// Sum of captured prices × quantities.
    pub fn subtotal(&self) -> CoreResult<Money> {
        self.lines.iter().try_fold(Money::zero(), |acc, l| {
            acc.checked_add(l.line.line_total()?)
                .ok_or(CoreError::TotalOverflow)
        })
    }

    /// Total number of units across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.line.quantity).sum()
    }

    /// Checks if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

// =============================================================================
// Order
// =============================================================================

/// An order created from a cart. Immutable except for `status`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Order {
    pub id: String,
    pub owner_id: String,
    pub kitchen_id: String,
    pub address_id: String,
    pub status: OrderStatus,
    pub subtotal_paise: i64,
    pub total_amount_paise: i64,
    pub payment_mode: PaymentMode,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Order {
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_paise(self.subtotal_paise)
    }

    #[inline]
    pub fn total_amount(&self) -> Money {
        Money::from_paise(self.total_amount_paise)
    }
}

/// A frozen copy of a cart line.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OrderLine {
    pub id: String,
    pub order_id: String,
    pub menu_item_id: String,
    /// Menu item name at time of order (frozen).
    pub name_snapshot: String,
    pub quantity: i64,
    /// Unit price in paise captured by the cart (frozen).
    pub price_paise: i64,
}

impl OrderLine {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_paise(self.price_paise)
    }

    #[inline]
    pub fn line_total(&self) -> CoreResult<Money> {
        self.price()
            .checked_mul(self.quantity)
            .ok_or(CoreError::TotalOverflow)
    }
}

/// Payment record of an order. One per order.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Payment {
    pub id: String,
    pub order_id: String,
    pub mode: PaymentMode,
    pub status: PaymentStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Where an order goes, copied from the customer's address at placement.
///
/// Later edits or deletion of the address do not change it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct DeliveryAddress {
    pub receiver_name: String,
    pub contact_number: String,
    pub house_number: String,
    pub sector: String,
    pub landmark: Option<String>,
    pub postcode: String,
    pub map_url: Option<String>,
}

/// An order with its lines, payment and delivery address.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderDetail {
    pub order: Order,
    pub lines: Vec<OrderLine>,
    pub payment: Option<Payment>,
    pub delivery: Option<DeliveryAddress>,
}
