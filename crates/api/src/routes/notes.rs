//! Operational note endpoints for loads, drivers, and dispatches.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use domain::models::{AddNoteRequest, Note, NoteOwner, NoteResponse};

use crate::app::AppState;
use crate::error::ApiError;

async fn add_note(
    state: &AppState,
    owner: NoteOwner,
    request: AddNoteRequest,
) -> Result<NoteResponse, ApiError> {
    request
        .validate()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let note = Note {
        note_id: Uuid::new_v4(),
        owner,
        body: request.body,
        author: request.author,
        created_at: Utc::now(),
    };
    let stored = state.notes.append(&note).await?;
    Ok(NoteResponse::from(stored))
}

async fn list_notes(
    state: &AppState,
    owner: NoteOwner,
) -> Result<Vec<NoteResponse>, ApiError> {
    let notes = state.notes.list_by_owner(owner).await?;
    Ok(notes.into_iter().map(NoteResponse::from).collect())
}

pub async fn add_load_note(
    State(state): State<AppState>,
    Path(owner_id): Path<Uuid>,
    Json(request): Json<AddNoteRequest>,
) -> Result<(StatusCode, Json<NoteResponse>), ApiError> {
    let note = add_note(&state, NoteOwner::Load(owner_id), request).await?;
    Ok((StatusCode::CREATED, Json(note)))
}

pub async fn load_notes(
    State(state): State<AppState>,
    Path(owner_id): Path<Uuid>,
) -> Result<Json<Vec<NoteResponse>>, ApiError> {
    Ok(Json(list_notes(&state, NoteOwner::Load(owner_id)).await?))
}

pub async fn add_driver_note(
    State(state): State<AppState>,
    Path(owner_id): Path<Uuid>,
    Json(request): Json<AddNoteRequest>,
) -> Result<(StatusCode, Json<NoteResponse>), ApiError> {
    let note = add_note(&state, NoteOwner::Driver(owner_id), request).await?;
    Ok((StatusCode::CREATED, Json(note)))
}

pub async fn driver_notes(
    State(state): State<AppState>,
    Path(owner_id): Path<Uuid>,
) -> Result<Json<Vec<NoteResponse>>, ApiError> {
    Ok(Json(list_notes(&state, NoteOwner::Driver(owner_id)).await?))
}

pub async fn add_dispatch_note(
    State(state): State<AppState>,
    Path(owner_id): Path<Uuid>,
    Json(request): Json<AddNoteRequest>,
) -> Result<(StatusCode, Json<NoteResponse>), ApiError> {
    let note = add_note(&state, NoteOwner::Dispatch(owner_id), request).await?;
    Ok((StatusCode::CREATED, Json(note)))
}

pub async fn dispatch_notes(
    State(state): State<AppState>,
    Path(owner_id): Path<Uuid>,
) -> Result<Json<Vec<NoteResponse>>, ApiError> {
    Ok(Json(
        list_notes(&state, NoteOwner::Dispatch(owner_id)).await?,
    ))
}
