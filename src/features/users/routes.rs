use crate::features::users::handlers::{change_email, delete_account, get_profile, update_profile};
use crate::features::users::services::ProfileService;
use axum::{
    routing::{get, put},
    Router,
};
use std::sync::Arc;

pub fn routes(service: Arc<ProfileService>) -> Router {
    Router::new()
        .route(
            "/users/me",
            get(get_profile).put(update_profile).delete(delete_account),
        )
        .route("/users/me/email", put(change_email))
        .with_state(service)
}
