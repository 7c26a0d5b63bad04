//! Project CRUD.

use super::models::{progress_percent, Project, ProjectInput};
use super::{found, now, Store, StoreError};
use rusqlite::{params, OptionalExtension, Row};

const COLUMNS: &str = "id, title, subtitle, genre, project_type, status, synopsis, \
     target_word_count, author_name, author_bio, author_email, author_phone, author_address, \
     agent_name, agent_email, notes, themes, setting_description, created_at, updated_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        title: row.get(1)?,
        subtitle: row.get(2)?,
        genre: row.get(3)?,
        project_type: row.get(4)?,
        status: row.get(5)?,
        synopsis: row.get(6)?,
        target_word_count: row.get(7)?,
        author_name: row.get(8)?,
        author_bio: row.get(9)?,
        author_email: row.get(10)?,
        author_phone: row.get(11)?,
        author_address: row.get(12)?,
        agent_name: row.get(13)?,
        agent_email: row.get(14)?,
        notes: row.get(15)?,
        themes: row.get(16)?,
        setting_description: row.get(17)?,
        created_at: row.get(18)?,
        updated_at: row.get(19)?,
        word_count: 0,
        progress_percent: 0.0,
        chapter_count: 0,
        chapters: None,
    })
}

impl Store {
    pub fn create_project(&self, input: &ProjectInput) -> Result<Project, StoreError> {
        let ts = now();
        let text = |v: &Option<String>| v.clone().unwrap_or_default();
        self.conn.execute(
            "INSERT INTO projects (title, subtitle, genre, project_type, status, synopsis,
                target_word_count, author_name, author_bio, author_email, author_phone,
                author_address, agent_name, agent_email, notes, themes, setting_description,
                created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?18)",
            params![
                input.title.clone().unwrap_or_else(|| "Untitled Project".to_string()),
                text(&input.subtitle),
                text(&input.genre),
                input.project_type.clone().unwrap_or_else(|| "fiction".to_string()),
                input.status.clone().unwrap_or_else(|| "draft".to_string()),
                text(&input.synopsis),
                input.target_word_count.unwrap_or(80_000),
                text(&input.author_name),
                text(&input.author_bio),
                text(&input.author_email),
                text(&input.author_phone),
                text(&input.author_address),
                text(&input.agent_name),
                text(&input.agent_email),
                text(&input.notes),
                text(&input.themes),
                text(&input.setting_description),
                ts,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        tracing::debug!(project_id = id, "created project");
        self.get_project(id, true)
    }

    /// All projects, most recently updated first.
    pub fn list_projects(&self) -> Result<Vec<Project>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {COLUMNS} FROM projects ORDER BY updated_at DESC, id DESC"))?;
        let rows = stmt.query_map([], from_row)?.collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(|p| self.with_derived(p, false)).collect()
    }

    pub fn get_project(&self, id: i64, include_chapters: bool) -> Result<Project, StoreError> {
        let row = self
            .conn
            .query_row(&format!("SELECT {COLUMNS} FROM projects WHERE id = ?1"), [id], from_row)
            .optional()?;
        self.with_derived(found(row, "project", id)?, include_chapters)
    }

    pub fn update_project(&self, id: i64, input: &ProjectInput) -> Result<Project, StoreError> {
        let current = self.get_project(id, false)?;
        let pick = |new: &Option<String>, old: &str| new.clone().unwrap_or_else(|| old.to_string());
        self.conn.execute(
            "UPDATE projects SET title = ?1, subtitle = ?2, genre = ?3, project_type = ?4,
                status = ?5, synopsis = ?6, target_word_count = ?7, author_name = ?8,
                author_bio = ?9, author_email = ?10, author_phone = ?11, author_address = ?12,
                agent_name = ?13, agent_email = ?14, notes = ?15, themes = ?16,
                setting_description = ?17, updated_at = ?18
             WHERE id = ?19",
            params![
                pick(&input.title, &current.title),
                pick(&input.subtitle, &current.subtitle),
                pick(&input.genre, &current.genre),
                pick(&input.project_type, &current.project_type),
                pick(&input.status, &current.status),
                pick(&input.synopsis, &current.synopsis),
                input.target_word_count.unwrap_or(current.target_word_count),
                pick(&input.author_name, &current.author_name),
                pick(&input.author_bio, &current.author_bio),
                pick(&input.author_email, &current.author_email),
                pick(&input.author_phone, &current.author_phone),
                pick(&input.author_address, &current.author_address),
                pick(&input.agent_name, &current.agent_name),
                pick(&input.agent_email, &current.agent_email),
                pick(&input.notes, &current.notes),
                pick(&input.themes, &current.themes),
                pick(&input.setting_description, &current.setting_description),
                now(),
                id,
            ],
        )?;
        self.get_project(id, true)
    }

    /// Delete a project and, through cascades, everything it owns.
    pub fn delete_project(&self, id: i64) -> Result<(), StoreError> {
        let deleted = self.conn.execute("DELETE FROM projects WHERE id = ?1", [id])?;
        if deleted == 0 {
            return Err(StoreError::NotFound { kind: "project", id });
        }
        Ok(())
    }

    pub(crate) fn touch_project(&self, id: i64) -> Result<(), StoreError> {
        self.conn.execute("UPDATE projects SET updated_at = ?1 WHERE id = ?2", params![now(), id])?;
        Ok(())
    }

    fn with_derived(&self, mut project: Project, include_chapters: bool) -> Result<Project, StoreError> {
        let chapters = self.list_chapters(project.id, false)?;
        project.word_count = chapters.iter().map(|c| c.word_count).sum();
        project.progress_percent = progress_percent(project.word_count, project.target_word_count);
        project.chapter_count = chapters.len();
        if include_chapters {
            project.chapters = Some(chapters);
        }
        Ok(project)
    }
}
