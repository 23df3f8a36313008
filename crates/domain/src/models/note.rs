//! Free-form operational notes attached to loads, drivers, or dispatches.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// What a note is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NoteOwner {
    Load(Uuid),
    Driver(Uuid),
    Dispatch(Uuid),
}

impl NoteOwner {
    pub fn kind_str(&self) -> &'static str {
        match self {
            NoteOwner::Load(_) => "LOAD",
            NoteOwner::Driver(_) => "DRIVER",
            NoteOwner::Dispatch(_) => "DISPATCH",
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            NoteOwner::Load(id) | NoteOwner::Driver(id) | NoteOwner::Dispatch(id) => *id,
        }
    }
}

/// An operational note. Notes are append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub note_id: Uuid,
    #[serde(flatten)]
    pub owner: NoteOwner,
    pub body: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
}

/// Request payload for adding a note.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddNoteRequest {
    #[validate(length(min = 1, max = 2000, message = "Note body must be 1-2000 characters"))]
    pub body: String,

    #[validate(length(min = 1, max = 100, message = "Author must be 1-100 characters"))]
    pub author: String,
}

/// Response payload for note reads.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteResponse {
    pub note_id: Uuid,
    pub body: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
}

impl From<Note> for NoteResponse {
    fn from(n: Note) -> Self {
        Self {
            note_id: n.note_id,
            body: n.body,
            author: n.author,
            created_at: n.created_at,
        }
    }
}
