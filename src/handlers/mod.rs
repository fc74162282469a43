pub mod animals_handler;
pub mod auth_handler;
pub mod dashboard_handler;
pub mod food_entries_handler;
pub mod food_types_handler;
pub mod health;
pub mod history_handler;
pub mod metrics;
pub mod settings_handler;
pub mod statistics_handler;
pub mod vitamin_handler;
pub mod weight_entries_handler;

pub use health::health_check;
pub use metrics::{metrics_handler, setup_metrics_recorder, MetricsState};
