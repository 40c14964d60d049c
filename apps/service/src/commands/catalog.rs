//! # Catalog Commands
//!
//! The kitchen, its menu categories and its menu. Chefs and admins edit
//! the menu; only admins approve the kitchen. The public menu and the
//! category list need no caller.

use std::str::FromStr;

use serde::Deserialize;
use tiffin_core::validation::validate_text;
use tiffin_core::{
    Category, CategoryUpdate, FoodType, Kitchen, KitchenUpdate, MenuFilter, MenuItem,
    MenuItemDetail, MenuItemUpdate, NutritionFact, TiffinSize,
};
use tracing::{debug, info};

use crate::auth::{Caller, Capability};
use crate::error::ApiError;
use crate::state::AppState;

const MAX_NAME_LEN: usize = 100;
const MAX_DESCRIPTION_LEN: usize = 500;
const MAX_URL_LEN: usize = 500;
const MAX_NUTRITION_ROWS: usize = 20;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateKitchenRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateKitchenRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryRequest {
    pub name: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoryRequest {
    pub category_id: String,
    pub name: Option<String>,
    pub image_url: Option<String>,
}

/// A nutrition table row, e.g. `{ "key": "Protein", "value": "12", "unit": "g" }`.
#[derive(Debug, Clone, Deserialize)]
pub struct NutritionRow {
    pub key: String,
    pub value: String,
    pub unit: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMenuItemRequest {
    pub kitchen_id: String,
    pub name: String,
    pub description: Option<String>,
    pub price_paise: i64,
    pub category_id: Option<String>,
    /// `VEG` (default) or `NON_VEG`
    pub food_type: Option<String>,
    /// `HALF` or `FULL`
    pub tiffin_size: Option<String>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub nutrition: Vec<NutritionRow>,
    /// Defaults to true
    pub is_available: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMenuItemPriceRequest {
    pub menu_item_id: String,
    pub price_paise: i64,
}

/// Unset fields keep their stored value. `nutrition`, when present,
/// replaces the whole table.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMenuItemRequest {
    pub menu_item_id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price_paise: Option<i64>,
    pub category_id: Option<String>,
    pub food_type: Option<String>,
    pub tiffin_size: Option<String>,
    pub image_url: Option<String>,
    pub is_available: Option<bool>,
    pub nutrition: Option<Vec<NutritionRow>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicMenuRequest {
    pub category_id: Option<String>,
    pub food_type: Option<String>,
}

/// Blank optional text is treated as absent.
fn optional_text(value: Option<String>, field: &str, max: usize) -> Result<Option<String>, ApiError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(Some(validate_text(&v, field, max)?)),
        _ => Ok(None),
    }
}

fn optional_id(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_optional<T>(value: Option<String>) -> Result<Option<T>, ApiError>
where
    T: FromStr,
    ApiError: From<T::Err>,
{
    match value {
        Some(v) if !v.trim().is_empty() => Ok(Some(v.parse::<T>()?)),
        _ => Ok(None),
    }
}

fn nutrition_facts(rows: Vec<NutritionRow>) -> Result<Vec<NutritionFact>, ApiError> {
    if rows.len() > MAX_NUTRITION_ROWS {
        return Err(ApiError::validation(format!(
            "nutrition has {} rows, at most {MAX_NUTRITION_ROWS} allowed",
            rows.len()
        )));
    }

    rows.into_iter()
        .map(|row| {
            Ok(NutritionFact {
                key: validate_text(&row.key, "nutrition.key", MAX_NAME_LEN)?,
                value: validate_text(&row.value, "nutrition.value", MAX_NAME_LEN)?,
                unit: optional_text(row.unit, "nutrition.unit", MAX_NAME_LEN)?,
            })
        })
        .collect()
}

// =============================================================================
// Kitchen
// =============================================================================

/// Registers the kitchen. It takes no orders until an admin approves it,
/// and a second kitchen is refused.
pub async fn create_kitchen(
    state: &AppState,
    caller: &Caller,
    request: CreateKitchenRequest,
) -> Result<Kitchen, ApiError> {
    let user_id = caller.require(Capability::ManageKitchen)?;
    let name = validate_text(&request.name, "name", MAX_NAME_LEN)?;
    let description = optional_text(request.description, "description", MAX_DESCRIPTION_LEN)?;
    debug!(user_id = %user_id, name = %name, "create_kitchen command");

    Ok(state
        .db()
        .kitchens()
        .create(&name, description.as_deref())
        .await?)
}

/// Renames or re-describes the serving kitchen.
pub async fn update_kitchen(
    state: &AppState,
    caller: &Caller,
    request: UpdateKitchenRequest,
) -> Result<Kitchen, ApiError> {
    let user_id = caller.require(Capability::ManageKitchen)?;
    debug!(user_id = %user_id, kitchen_id = %state.kitchen_id(), "update_kitchen command");

    let update = KitchenUpdate {
        name: optional_text(request.name, "name", MAX_NAME_LEN)?,
        description: optional_text(request.description, "description", MAX_DESCRIPTION_LEN)?,
    };

    Ok(state
        .db()
        .kitchens()
        .update(state.kitchen_id(), &update)
        .await?)
}

pub async fn approve_kitchen(
    state: &AppState,
    caller: &Caller,
    kitchen_id: &str,
) -> Result<Kitchen, ApiError> {
    let admin_id = caller.require(Capability::ApproveKitchen)?;
    debug!(admin_id = %admin_id, kitchen_id = %kitchen_id, "approve_kitchen command");

    let kitchen = state.db().kitchens().approve(kitchen_id).await?;
    info!(admin_id = %admin_id, kitchen_id = %kitchen_id, "Kitchen approved");

    Ok(kitchen)
}

// =============================================================================
// Categories
// =============================================================================

pub async fn create_category(
    state: &AppState,
    caller: &Caller,
    request: CreateCategoryRequest,
) -> Result<Category, ApiError> {
    let user_id = caller.require(Capability::ManageMenu)?;
    let name = validate_text(&request.name, "name", MAX_NAME_LEN)?;
    let image_url = optional_text(request.image_url, "imageUrl", MAX_URL_LEN)?;
    debug!(user_id = %user_id, name = %name, "create_category command");

    Ok(state
        .db()
        .categories()
        .create(&name, image_url.as_deref())
        .await?)
}

/// All categories, oldest first.
pub async fn list_categories(state: &AppState) -> Result<Vec<Category>, ApiError> {
    debug!("list_categories command");

    Ok(state.db().categories().list().await?)
}

pub async fn update_category(
    state: &AppState,
    caller: &Caller,
    request: UpdateCategoryRequest,
) -> Result<Category, ApiError> {
    let user_id = caller.require(Capability::ManageMenu)?;
    debug!(user_id = %user_id, category_id = %request.category_id, "update_category command");

    let update = CategoryUpdate {
        name: optional_text(request.name, "name", MAX_NAME_LEN)?,
        image_url: optional_text(request.image_url, "imageUrl", MAX_URL_LEN)?,
    };

    Ok(state
        .db()
        .categories()
        .update(&request.category_id, &update)
        .await?)
}

// =============================================================================
// Menu
// =============================================================================

/// Adds an item to a kitchen's menu.
pub async fn create_menu_item(
    state: &AppState,
    caller: &Caller,
    request: CreateMenuItemRequest,
) -> Result<MenuItem, ApiError> {
    let user_id = caller.require(Capability::ManageMenu)?;
    debug!(user_id = %user_id, kitchen_id = %request.kitchen_id, "create_menu_item command");

    let name = validate_text(&request.name, "name", MAX_NAME_LEN)?;
    let mut item = MenuItem::new(request.kitchen_id, name, request.price_paise);
    item.description = optional_text(request.description, "description", MAX_DESCRIPTION_LEN)?;
    item.category_id = optional_id(request.category_id);
    item.food_type = parse_optional::<FoodType>(request.food_type)?.unwrap_or_default();
    item.tiffin_size = parse_optional::<TiffinSize>(request.tiffin_size)?;
    item.image_url = optional_text(request.image_url, "imageUrl", MAX_URL_LEN)?;
    item.is_available = request.is_available.unwrap_or(true);

    let nutrition = nutrition_facts(request.nutrition)?;
    state
        .db()
        .menu()
        .insert_with_nutrition(&item, &nutrition)
        .await?;

    Ok(item)
}

/// Edits any menu item fields in one step.
pub async fn update_menu_item(
    state: &AppState,
    caller: &Caller,
    request: UpdateMenuItemRequest,
) -> Result<MenuItemDetail, ApiError> {
    let user_id = caller.require(Capability::ManageMenu)?;
    debug!(user_id = %user_id, menu_item_id = %request.menu_item_id, "update_menu_item command");

    let update = MenuItemUpdate {
        name: optional_text(request.name, "name", MAX_NAME_LEN)?,
        description: optional_text(request.description, "description", MAX_DESCRIPTION_LEN)?,
        price_paise: request.price_paise,
        category_id: optional_id(request.category_id),
        food_type: parse_optional::<FoodType>(request.food_type)?,
        tiffin_size: parse_optional::<TiffinSize>(request.tiffin_size)?,
        image_url: optional_text(request.image_url, "imageUrl", MAX_URL_LEN)?,
        is_available: request.is_available,
        nutrition: request.nutrition.map(nutrition_facts).transpose()?,
    };

    Ok(state
        .db()
        .menu()
        .update(&request.menu_item_id, &update)
        .await?)
}

/// Changes an item's price. Existing cart lines and orders keep the price
/// they captured.
pub async fn update_menu_item_price(
    state: &AppState,
    caller: &Caller,
    request: UpdateMenuItemPriceRequest,
) -> Result<MenuItem, ApiError> {
    let user_id = caller.require(Capability::ManageMenu)?;
    debug!(user_id = %user_id, menu_item_id = %request.menu_item_id, price_paise = request.price_paise, "update_menu_item_price command");

    Ok(state
        .db()
        .menu()
        .update_price(&request.menu_item_id, request.price_paise)
        .await?)
}

/// Switches an item on or off.
pub async fn toggle_menu_item(
    state: &AppState,
    caller: &Caller,
    menu_item_id: &str,
) -> Result<MenuItem, ApiError> {
    let user_id = caller.require(Capability::ManageMenu)?;
    debug!(user_id = %user_id, menu_item_id = %menu_item_id, "toggle_menu_item command");

    Ok(state.db().menu().toggle_availability(menu_item_id).await?)
}

/// The serving kitchen's whole menu, unavailable items included.
pub async fn kitchen_menu(state: &AppState, caller: &Caller) -> Result<Vec<MenuItemDetail>, ApiError> {
    let user_id = caller.require(Capability::ManageMenu)?;
    debug!(user_id = %user_id, "kitchen_menu command");

    Ok(state.db().menu().list_for_kitchen(state.kitchen_id()).await?)
}

/// What customers can order right now, newest first.
pub async fn public_menu(
    state: &AppState,
    request: PublicMenuRequest,
) -> Result<Vec<MenuItemDetail>, ApiError> {
    let filter = MenuFilter {
        category_id: optional_id(request.category_id),
        food_type: parse_optional::<FoodType>(request.food_type)?,
    };
    debug!(category_id = ?filter.category_id, food_type = ?filter.food_type, "public_menu command");

    Ok(state
        .db()
        .menu()
        .list_public(state.kitchen_id(), &filter)
        .await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::cart::{add_to_cart, get_cart, AddToCartRequest};
    use crate::commands::test_support::{customer, fixture};
    use crate::config::ServiceConfig;
    use crate::error::ErrorCode;
    use tiffin_db::{Database, DbConfig};

    fn row(key: &str, value: &str, unit: Option<&str>) -> NutritionRow {
        NutritionRow {
            key: key.to_string(),
            value: value.to_string(),
            unit: unit.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_kitchen_needs_admin_approval() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let kitchen = db.kitchens().create("Placeholder", None).await.unwrap();
        let mut config = ServiceConfig::default();
        config.ordering.kitchen_id = Some(kitchen.id.clone());
        let state = AppState::new(db, &config).unwrap();
        let chef = Caller::chef("chef-1");

        let renamed = update_kitchen(
            &state,
            &chef,
            UpdateKitchenRequest {
                name: Some(" Amma's Kitchen ".to_string()),
                description: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(renamed.name, "Amma's Kitchen");
        assert!(!renamed.is_approved);

        let err = approve_kitchen(&state, &chef, &kitchen.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);

        let admin = Caller::admin("admin-1");
        let approved = approve_kitchen(&state, &admin, &kitchen.id).await.unwrap();
        assert!(approved.is_approved);

        let err = approve_kitchen(&state, &admin, &kitchen.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessLogic);
    }

    #[tokio::test]
    async fn test_second_kitchen_is_refused() {
        let fx = fixture().await;

        let err = create_kitchen(
            &fx.state,
            &Caller::chef("chef-1"),
            CreateKitchenRequest {
                name: "Second Kitchen".to_string(),
                description: None,
            },
        )
        .await
        .unwrap_err();

        assert_eq!(err.code, ErrorCode::BusinessLogic);
        assert!(!err.retryable);

        let err = update_kitchen(&fx.state, &customer(), UpdateKitchenRequest::default())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
    }

    #[tokio::test]
    async fn test_categories() {
        let fx = fixture().await;
        let chef = Caller::chef("chef-1");

        let thali = create_category(
            &fx.state,
            &chef,
            CreateCategoryRequest {
                name: " Thali ".to_string(),
                image_url: Some("".to_string()),
            },
        )
        .await
        .unwrap();
        assert_eq!(thali.name, "Thali");
        assert_eq!(thali.image_url, None);

        let renamed = update_category(
            &fx.state,
            &chef,
            UpdateCategoryRequest {
                category_id: thali.id.clone(),
                name: Some("Mini Thali".to_string()),
                image_url: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(renamed.name, "Mini Thali");

        let listed = list_categories(&fx.state).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "Mini Thali");

        let err = update_category(
            &fx.state,
            &chef,
            UpdateCategoryRequest {
                category_id: "missing".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        let err = create_category(
            &fx.state,
            &customer(),
            CreateCategoryRequest {
                name: "Sweets".to_string(),
                image_url: None,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
    }

    #[tokio::test]
    async fn test_menu_item_lifecycle() {
        let fx = fixture().await;
        let chef = Caller::chef("chef-1");

        let item = create_menu_item(
            &fx.state,
            &chef,
            CreateMenuItemRequest {
                kitchen_id: fx.state.kitchen_id().to_string(),
                name: "Curd Rice".to_string(),
                description: Some("With pickle".to_string()),
                price_paise: 8_000,
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert!(item.is_available);
        assert_eq!(item.food_type, FoodType::Veg);

        let repriced = update_menu_item_price(
            &fx.state,
            &chef,
            UpdateMenuItemPriceRequest {
                menu_item_id: item.id.clone(),
                price_paise: 9_000,
            },
        )
        .await
        .unwrap();
        assert_eq!(repriced.price_paise, 9_000);

        let toggled = toggle_menu_item(&fx.state, &chef, &item.id).await.unwrap();
        assert!(!toggled.is_available);

        let err = add_to_cart(
            &fx.state,
            &customer(),
            AddToCartRequest {
                menu_item_id: item.id.clone(),
                quantity: Some(1),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotAvailable);
    }

    #[tokio::test]
    async fn test_full_menu_item_update() {
        let fx = fixture().await;
        let chef = Caller::chef("chef-1");

        let mains = create_category(
            &fx.state,
            &chef,
            CreateCategoryRequest {
                name: "Mains".to_string(),
                image_url: None,
            },
        )
        .await
        .unwrap();

        let item = create_menu_item(
            &fx.state,
            &chef,
            CreateMenuItemRequest {
                kitchen_id: fx.state.kitchen_id().to_string(),
                name: "Egg Curry".to_string(),
                price_paise: 15_000,
                food_type: Some("non-veg".to_string()),
                tiffin_size: Some("full".to_string()),
                nutrition: vec![row("Calories", "520", Some("kcal"))],
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(item.food_type, FoodType::NonVeg);
        assert_eq!(item.tiffin_size, Some(TiffinSize::Full));

        let detail = update_menu_item(
            &fx.state,
            &chef,
            UpdateMenuItemRequest {
                menu_item_id: item.id.clone(),
                price_paise: Some(16_000),
                category_id: Some(mains.id.clone()),
                tiffin_size: Some("HALF".to_string()),
                nutrition: Some(vec![
                    row("Protein", "18", Some("g")),
                    row("Spice", "Medium", None),
                ]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(detail.item.name, "Egg Curry");
        assert_eq!(detail.item.price_paise, 16_000);
        assert_eq!(detail.item.food_type, FoodType::NonVeg);
        assert_eq!(detail.item.tiffin_size, Some(TiffinSize::Half));
        assert_eq!(detail.category.map(|c| c.id), Some(mains.id));
        let keys: Vec<_> = detail.nutrition.iter().map(|n| n.key.as_str()).collect();
        assert_eq!(keys, vec!["Protein", "Spice"]);

        let err = update_menu_item(
            &fx.state,
            &chef,
            UpdateMenuItemRequest {
                menu_item_id: item.id.clone(),
                food_type: Some("VEGAN".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = update_menu_item(
            &fx.state,
            &chef,
            UpdateMenuItemRequest {
                menu_item_id: item.id.clone(),
                category_id: Some("no-such-category".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_public_menu_shows_available_items_by_filter() {
        let fx = fixture().await;
        let chef = Caller::chef("chef-1");

        let curries = create_category(
            &fx.state,
            &chef,
            CreateCategoryRequest {
                name: "Curries".to_string(),
                image_url: None,
            },
        )
        .await
        .unwrap();

        let chicken = create_menu_item(
            &fx.state,
            &chef,
            CreateMenuItemRequest {
                kitchen_id: fx.state.kitchen_id().to_string(),
                name: "Chicken Curry".to_string(),
                price_paise: 18_000,
                category_id: Some(curries.id.clone()),
                food_type: Some("NON_VEG".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        toggle_menu_item(&fx.state, &chef, &fx.item_b.id).await.unwrap();

        let everything = public_menu(&fx.state, PublicMenuRequest::default()).await.unwrap();
        let ids: Vec<_> = everything.iter().map(|d| d.item.id.clone()).collect();
        assert_eq!(ids, vec![chicken.id.clone(), fx.item_a.id.clone()]);

        let veg = public_menu(
            &fx.state,
            PublicMenuRequest {
                food_type: Some("veg".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(veg.len(), 1);
        assert_eq!(veg[0].item.id, fx.item_a.id);

        let in_curries = public_menu(
            &fx.state,
            PublicMenuRequest {
                category_id: Some(curries.id.clone()),
                food_type: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(in_curries.len(), 1);
        assert_eq!(in_curries[0].item.id, chicken.id);

        // Chefs still see the switched-off item.
        assert_eq!(kitchen_menu(&fx.state, &chef).await.unwrap().len(), 3);
        let err = kitchen_menu(&fx.state, &customer()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
    }

    #[tokio::test]
    async fn test_price_change_does_not_touch_cart() {
        let fx = fixture().await;
        add_to_cart(
            &fx.state,
            &customer(),
            AddToCartRequest {
                menu_item_id: fx.item_a.id.clone(),
                quantity: Some(2),
            },
        )
        .await
        .unwrap();

        update_menu_item_price(
            &fx.state,
            &Caller::admin("admin-1"),
            UpdateMenuItemPriceRequest {
                menu_item_id: fx.item_a.id.clone(),
                price_paise: 400,
            },
        )
        .await
        .unwrap();

        let cart = get_cart(&fx.state, &customer()).await.unwrap();
        assert_eq!(cart.lines[0].unit_price_paise, 100);
        assert_eq!(cart.lines[0].current_price_paise, Some(400));
        assert_eq!(cart.subtotal_paise, 200);
    }

    #[tokio::test]
    async fn test_menu_validation() {
        let fx = fixture().await;
        let chef = Caller::chef("chef-1");

        let request = |kitchen_id: &str, price_paise| CreateMenuItemRequest {
            kitchen_id: kitchen_id.to_string(),
            name: "Poha".to_string(),
            price_paise,
            ..Default::default()
        };

        let err = create_menu_item(&fx.state, &chef, request(fx.state.kitchen_id(), 0))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = create_menu_item(&fx.state, &chef, request(fx.state.kitchen_id(), tiffin_core::MAX_PRICE_PAISE + 1))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = create_menu_item(&fx.state, &chef, request("no-such-kitchen", 500))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        let err = create_menu_item(&fx.state, &customer(), request(fx.state.kitchen_id(), 500))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
    }
}
