//! API routes.

pub mod health;
pub mod sessions;

pub use health::{HealthResponse, health_routes};
pub use sessions::{
    SESSION_ID_HEADER, login_handler, profile_handler, refresh_handler, wrong_method_handler,
};
