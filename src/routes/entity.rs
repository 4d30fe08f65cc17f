//! Entity routes: one parameterized path; handlers resolve the entity by its table name.

use crate::handlers::entity::{create, delete as delete_handler, list, update};
use crate::handlers::export::export;
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn entity_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(export))
        .route("/-1", get(export))
        .route(
            "/:entity",
            get(list).post(create).patch(update).delete(delete_handler),
        )
        .with_state(state)
}
