//! Note repository for database operations.

use sqlx::PgPool;

use domain::error::DomainError;
use domain::models::{Note, NoteOwner};
use domain::repositories::NoteRepository;

use crate::entities::NoteEntity;
use crate::metrics::QueryTimer;

use super::db_err;

const NOTE_COLUMNS: &str = "note_id, owner_kind, owner_id, body, author, created_at";

/// Repository for note database operations.
#[derive(Clone)]
pub struct PgNoteRepository {
    pool: PgPool,
}

impl PgNoteRepository {
    /// Creates a new repository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl NoteRepository for PgNoteRepository {
    async fn append(&self, note: &Note) -> Result<Note, DomainError> {
        let timer = QueryTimer::new("append_note");

        let entity = sqlx::query_as::<_, NoteEntity>(&format!(
            r#"
            INSERT INTO notes (note_id, owner_kind, owner_id, body, author, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            NOTE_COLUMNS
        ))
        .bind(note.note_id)
        .bind(note.owner.kind_str())
        .bind(note.owner.id())
        .bind(&note.body)
        .bind(&note.author)
        .bind(note.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_err("append_note", e))?;

        timer.record();
        Note::try_from(entity)
    }

    async fn list_by_owner(&self, owner: NoteOwner) -> Result<Vec<Note>, DomainError> {
        let timer = QueryTimer::new("list_notes_by_owner");

        let entities = sqlx::query_as::<_, NoteEntity>(&format!(
            r#"
            SELECT {} FROM notes
            WHERE owner_kind = $1 AND owner_id = $2
            ORDER BY created_at DESC, note_id DESC
            "#,
            NOTE_COLUMNS
        ))
        .bind(owner.kind_str())
        .bind(owner.id())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_err("list_notes_by_owner", e))?;

        timer.record();
        entities.into_iter().map(Note::try_from).collect()
    }
}
