//! Order confirmation handler.

use axum::{extract::State, response::Json, routing::post, Router};

use crate::api::extractors::ValidatedJson;
use crate::api::AppState;
use crate::domain::OrderConfirmation;
use crate::errors::AppResult;
use crate::types::MessageResponse;

pub fn order_routes() -> Router<AppState> {
    Router::new().route("/confirm", post(confirm_order))
}

/// Email an order confirmation to the buyer
#[utoipa::path(
    post,
    path = "/api/orders/confirm",
    tag = "Orders",
    request_body = OrderConfirmation,
    responses(
        (status = 200, description = "Confirmation email sent", body = MessageResponse),
        (status = 400, description = "Invalid payload"),
        (status = 500, description = "Mail delivery failed")
    )
)]
pub async fn confirm_order(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<OrderConfirmation>,
) -> AppResult<Json<MessageResponse>> {
    state.order_service.send_order_confirmation(payload).await?;
    Ok(Json(MessageResponse::new("Confirmation email sent")))
}
