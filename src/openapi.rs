use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::Modify;
use utoipa::OpenApi;

use crate::auth::SESSION_COOKIE;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Guinea Tracker API",
        version = "0.1.0",
        description = "Feeding, weighing and vitamin log for a household of guinea pigs"
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server"),
    ),
    paths(
        // Health
        crate::handlers::health::health_check,

        // Auth
        crate::handlers::auth_handler::login,
        crate::handlers::auth_handler::logout,
        crate::handlers::auth_handler::get_me,

        // Views
        crate::handlers::dashboard_handler::get_dashboard,
        crate::handlers::history_handler::get_history,
        crate::handlers::statistics_handler::get_statistics,
        crate::handlers::settings_handler::get_settings,
        crate::handlers::vitamin_handler::toggle_vitamin,

        // Animals
        crate::handlers::animals_handler::get_animals,
        crate::handlers::animals_handler::create_animal,
        crate::handlers::animals_handler::update_animal,

        // Food types
        crate::handlers::food_types_handler::get_food_types,
        crate::handlers::food_types_handler::create_food_type,
        crate::handlers::food_types_handler::update_food_type,

        // Food entries
        crate::handlers::food_entries_handler::create_food_entry,
        crate::handlers::food_entries_handler::get_food_entry,
        crate::handlers::food_entries_handler::update_food_entry,
        crate::handlers::food_entries_handler::delete_food_entry,

        // Weight entries
        crate::handlers::weight_entries_handler::create_weight_entry,
        crate::handlers::weight_entries_handler::get_weight_entry,
        crate::handlers::weight_entries_handler::update_weight_entry,
    ),
    components(
        schemas(
            crate::models::User,
            crate::models::Animal,
            crate::models::FoodType,
            crate::models::FoodEntry,
            crate::models::WeightEntry,
            crate::models::VitaminEntry,
            crate::models::VitaminStatus,
            crate::models::HistoryRecord,
            crate::models::HistoryDetail,
            crate::models::HistoryResponse,
            crate::models::FoodStatistics,
            crate::models::AnimalWeight,
            crate::models::StatisticsResponse,

            crate::models::LoginInput,
            crate::models::LoginResponse,
            crate::models::AnimalInput,
            crate::models::FoodTypeInput,
            crate::models::FoodEntryInput,
            crate::models::FoodEntryMutationResponse,
            crate::models::WeightEntryInput,

            crate::handlers::dashboard_handler::DashboardResponse,
            crate::handlers::settings_handler::SettingsResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check"),
        (name = "auth", description = "Name-based login and sessions"),
        (name = "dashboard", description = "Today's entries"),
        (name = "history", description = "Merged entry feed"),
        (name = "statistics", description = "Food statistics and latest weights"),
        (name = "settings", description = "Food types and animals"),
        (name = "vitamin", description = "Daily vitamin toggle"),
        (name = "animals", description = "Animal management"),
        (name = "food-types", description = "Food type management"),
        (name = "food-entries", description = "Food entries"),
        (name = "weight-entries", description = "Weight entries"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "cookie_auth",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(SESSION_COOKIE))),
            )
        }
    }
}
