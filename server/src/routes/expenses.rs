//! Expense collection routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use tally_engine::Expense;

use crate::error::Result;
use crate::handlers::{
    handle_create, handle_list, handle_remove, handle_replace_all, handle_update, ReplaceResponse,
};
use crate::AppState;

/// Create expense routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/expenses",
            get(list_handler).put(replace_all_handler).post(create_handler),
        )
        .route("/expenses/{id}", patch(update_handler).delete(remove_handler))
}

/// GET /expenses - Every expense, newest date first.
async fn list_handler(State(state): State<AppState>) -> Result<Json<Vec<Expense>>> {
    Ok(Json(handle_list(&state.pool).await?))
}

/// PUT /expenses - Replace the whole collection.
async fn replace_all_handler(
    State(state): State<AppState>,
    Json(expenses): Json<Vec<Expense>>,
) -> Result<Json<ReplaceResponse>> {
    Ok(Json(handle_replace_all(&state.pool, expenses).await?))
}

/// POST /expenses - Create or overwrite an expense.
async fn create_handler(
    State(state): State<AppState>,
    Json(expense): Json<Expense>,
) -> Result<(StatusCode, Json<Expense>)> {
    let stored = handle_create(&state.pool, expense).await?;
    Ok((StatusCode::CREATED, Json(stored)))
}

/// PATCH /expenses/{id} - Merge into an existing expense.
async fn update_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(expense): Json<Expense>,
) -> Result<Json<Expense>> {
    Ok(Json(handle_update(&state.pool, &id, expense).await?))
}

/// DELETE /expenses/{id} - Delete an expense.
async fn remove_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    handle_remove(&state.pool, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
