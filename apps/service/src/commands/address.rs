//! # Address Commands
//!
//! A customer's saved delivery addresses. Orders reference one by id.

use chrono::Utc;
use serde::Deserialize;
use tiffin_core::validation::{validate_phone, validate_postcode, validate_text};
use tiffin_core::{Address, AddressUpdate};
use tracing::debug;
use uuid::Uuid;

use crate::auth::{Caller, Capability};
use crate::error::ApiError;
use crate::state::AppState;

const MAX_NAME_LEN: usize = 100;
const MAX_LINE_LEN: usize = 200;
const MAX_URL_LEN: usize = 500;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAddressRequest {
    pub receiver_name: String,
    pub contact_number: String,
    pub house_number: String,
    pub sector: String,
    pub landmark: Option<String>,
    pub postcode: String,
    pub map_url: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

impl CreateAddressRequest {
    /// Validates and trims the request into an address owned by `owner_id`.
    fn into_address(self, owner_id: &str) -> Result<Address, ApiError> {
        validate_phone(&self.contact_number)?;
        validate_postcode(&self.postcode)?;

        Ok(Address {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            receiver_name: validate_text(&self.receiver_name, "receiverName", MAX_NAME_LEN)?,
            contact_number: self.contact_number.trim().to_string(),
            house_number: validate_text(&self.house_number, "houseNumber", MAX_LINE_LEN)?,
            sector: validate_text(&self.sector, "sector", MAX_LINE_LEN)?,
            landmark: optional_text(self.landmark, "landmark", MAX_LINE_LEN)?,
            postcode: self.postcode.trim().to_string(),
            map_url: optional_text(self.map_url, "mapUrl", MAX_URL_LEN)?,
            is_default: self.is_default,
            created_at: Utc::now(),
        })
    }
}

/// Unset or blank fields keep their stored value. `isDefault: true` makes
/// this the caller's only default address.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAddressRequest {
    pub address_id: String,
    pub receiver_name: Option<String>,
    pub contact_number: Option<String>,
    pub house_number: Option<String>,
    pub sector: Option<String>,
    pub landmark: Option<String>,
    pub postcode: Option<String>,
    pub map_url: Option<String>,
    pub is_default: Option<bool>,
}

impl UpdateAddressRequest {
    fn into_update(self) -> Result<AddressUpdate, ApiError> {
        let contact_number = optional_text(self.contact_number, "contactNumber", MAX_NAME_LEN)?;
        if let Some(phone) = &contact_number {
            validate_phone(phone)?;
        }

        let postcode = optional_text(self.postcode, "postcode", MAX_NAME_LEN)?;
        if let Some(postcode) = &postcode {
            validate_postcode(postcode)?;
        }

        Ok(AddressUpdate {
            receiver_name: optional_text(self.receiver_name, "receiverName", MAX_NAME_LEN)?,
            contact_number,
            house_number: optional_text(self.house_number, "houseNumber", MAX_LINE_LEN)?,
            sector: optional_text(self.sector, "sector", MAX_LINE_LEN)?,
            landmark: optional_text(self.landmark, "landmark", MAX_LINE_LEN)?,
            postcode,
            map_url: optional_text(self.map_url, "mapUrl", MAX_URL_LEN)?,
            is_default: self.is_default,
        })
    }
}

/// Blank optional fields are stored as `None`.
fn optional_text(value: Option<String>, field: &str, max: usize) -> Result<Option<String>, ApiError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(Some(validate_text(&v, field, max)?)),
        _ => Ok(None),
    }
}

/// Saves a new delivery address. A default address replaces the previous one.
pub async fn create_address(
    state: &AppState,
    caller: &Caller,
    request: CreateAddressRequest,
) -> Result<Address, ApiError> {
    let customer_id = caller.require(Capability::ManageAddresses)?;
    debug!(customer_id = %customer_id, is_default = request.is_default, "create_address command");

    let address = request.into_address(customer_id)?;
    state.db().addresses().create(&address).await?;

    Ok(address)
}

/// Edits one of the caller's addresses. Someone else's address is
/// reported as not found.
pub async fn update_address(
    state: &AppState,
    caller: &Caller,
    request: UpdateAddressRequest,
) -> Result<Address, ApiError> {
    let customer_id = caller.require(Capability::ManageAddresses)?;
    debug!(customer_id = %customer_id, address_id = %request.address_id, "update_address command");

    let address_id = request.address_id.clone();
    let update = request.into_update()?;

    Ok(state
        .db()
        .addresses()
        .update(&address_id, customer_id, &update)
        .await?)
}

/// The caller's addresses, newest first.
pub async fn list_addresses(state: &AppState, caller: &Caller) -> Result<Vec<Address>, ApiError> {
    let customer_id = caller.require(Capability::ManageAddresses)?;
    debug!(customer_id = %customer_id, "list_addresses command");

    Ok(state.db().addresses().list_for_owner(customer_id).await?)
}

/// Deletes one of the caller's addresses. Past orders keep their address id.
pub async fn delete_address(
    state: &AppState,
    caller: &Caller,
    address_id: &str,
) -> Result<(), ApiError> {
    let customer_id = caller.require(Capability::ManageAddresses)?;
    debug!(customer_id = %customer_id, address_id = %address_id, "delete_address command");

    state.db().addresses().delete(address_id, customer_id).await?;
    Ok(())
}
