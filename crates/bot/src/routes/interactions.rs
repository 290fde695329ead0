//! `POST /interactions`: the Discord interactions endpoint.
//!
//! Every request is signature-checked first. Pings are answered inline,
//! help and invalid commands get an immediate message, and everything else
//! is deferred and handed to a tracked background task.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::post;
use axum::{Json, Router};

use crate::commands::handlers::{self, CommandContext};
use crate::commands::Command;
use crate::discord::interaction::{
    Interaction, InteractionResponse, MessagePayload, INTERACTION_APPLICATION_COMMAND,
    INTERACTION_PING,
};
use crate::error::{AppError, AppResult};
use crate::render;
use crate::signature::{SIGNATURE_HEADER, TIMESTAMP_HEADER};
use crate::state::AppState;

async fn interactions(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<InteractionResponse>> {
    let signature = header(&headers, SIGNATURE_HEADER)?;
    let timestamp = header(&headers, TIMESTAMP_HEADER)?;
    state
        .verifier
        .verify(timestamp, &body, signature)
        .map_err(|e| AppError::Unauthorized(e.to_string()))?;

    let interaction: Interaction = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Invalid interaction payload: {e}")))?;

    match interaction.kind {
        INTERACTION_PING => Ok(Json(InteractionResponse::pong())),
        INTERACTION_APPLICATION_COMMAND => Ok(Json(dispatch(&state, interaction)?)),
        other => Err(AppError::BadRequest(format!(
            "Unsupported interaction type {other}"
        ))),
    }
}

fn dispatch(state: &AppState, interaction: Interaction) -> AppResult<InteractionResponse> {
    let data = interaction
        .data
        .as_ref()
        .ok_or_else(|| AppError::BadRequest("Command interaction has no data".into()))?;

    let command = match Command::parse(data) {
        Ok(command) => command,
        Err(e) => {
            tracing::info!(command = %data.name, error = %e, "Command rejected");
            let message = render::truncate(&format!("❌ {e}"), render::MAX_CONTENT_CHARS);
            return Ok(InteractionResponse::message(
                MessagePayload::text(message).ephemeral(),
            ));
        }
    };

    if command == Command::Help {
        return Ok(InteractionResponse::message(MessagePayload::embed(
            render::help_embed(),
        )));
    }

    let ctx = CommandContext {
        user_id: interaction.user_id().map(str::to_string),
        token: interaction.token,
    };
    tracing::debug!(command = %data.name, interaction_id = %interaction.id, "Command deferred");

    state.tasks.spawn(handlers::execute(
        Arc::clone(&state.services),
        ctx,
        command,
        state.shutdown.child_token(),
    ));

    Ok(InteractionResponse::deferred())
}

fn header<'a>(headers: &'a HeaderMap, name: &'static str) -> AppResult<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized(format!("Missing {name} header")))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/interactions", post(interactions))
}
