//! Note entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::error::DomainError;
use domain::models::{Note, NoteOwner};

/// Database row mapping for the notes table.
#[derive(Debug, Clone, FromRow)]
pub struct NoteEntity {
    pub note_id: Uuid,
    pub owner_kind: String,
    pub owner_id: Uuid,
    pub body: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<NoteEntity> for Note {
    type Error = DomainError;

    fn try_from(entity: NoteEntity) -> Result<Self, Self::Error> {
        let owner = match entity.owner_kind.as_str() {
            "LOAD" => NoteOwner::Load(entity.owner_id),
            "DRIVER" => NoteOwner::Driver(entity.owner_id),
            "DISPATCH" => NoteOwner::Dispatch(entity.owner_id),
            other => {
                return Err(DomainError::Persistence(format!(
                    "Corrupt notes.owner_kind column: {}",
                    other
                )))
            }
        };

        Ok(Note {
            note_id: entity.note_id,
            owner,
            body: entity.body,
            author: entity.author,
            created_at: entity.created_at,
        })
    }
}
