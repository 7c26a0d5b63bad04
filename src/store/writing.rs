//! Chapters, scenes, characters, research notes and revision history.

use super::models::{
    preview, word_count, Chapter, ChapterInput, Character, CharacterInput, NewRevision,
    ResearchNote, ResearchNoteInput, Revision, RevisionType, Scene, SceneInput,
};
use super::{found, now, Store, StoreError};
use rusqlite::{params, OptionalExtension, Row};

const CHAPTER_COLUMNS: &str = "id, project_id, title, position, status, summary, content, notes, \
     pov_character, setting, timeline_position, created_at, updated_at";
const SCENE_COLUMNS: &str =
    "id, chapter_id, title, position, content, summary, notes, scene_type, created_at, updated_at";
const CHARACTER_COLUMNS: &str = "id, project_id, name, role, description, backstory, motivations, \
     arc_description, notes, created_at";
const RESEARCH_COLUMNS: &str =
    "id, project_id, title, category, content, source_url, source_citation, tags, created_at";

const REVISION_PREVIEW_CHARS: usize = 500;
const REVISION_LIST_LIMIT: i64 = 50;

fn chapter_row(row: &Row<'_>) -> rusqlite::Result<Chapter> {
    Ok(Chapter {
        id: row.get(0)?,
        project_id: row.get(1)?,
        title: row.get(2)?,
        order: row.get(3)?,
        status: row.get(4)?,
        summary: row.get(5)?,
        content: row.get(6)?,
        notes: row.get(7)?,
        pov_character: row.get(8)?,
        setting: row.get(9)?,
        timeline_position: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
        word_count: 0,
        scene_count: 0,
        scenes: None,
    })
}

fn scene_row(row: &Row<'_>) -> rusqlite::Result<Scene> {
    let content: String = row.get(4)?;
    Ok(Scene {
        id: row.get(0)?,
        chapter_id: row.get(1)?,
        title: row.get(2)?,
        order: row.get(3)?,
        word_count: word_count(&content),
        content,
        summary: row.get(5)?,
        notes: row.get(6)?,
        scene_type: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

fn character_row(row: &Row<'_>) -> rusqlite::Result<Character> {
    Ok(Character {
        id: row.get(0)?,
        project_id: row.get(1)?,
        name: row.get(2)?,
        role: row.get(3)?,
        description: row.get(4)?,
        backstory: row.get(5)?,
        motivations: row.get(6)?,
        arc_description: row.get(7)?,
        notes: row.get(8)?,
        created_at: row.get(9)?,
    })
}

fn research_row(row: &Row<'_>) -> rusqlite::Result<ResearchNote> {
    Ok(ResearchNote {
        id: row.get(0)?,
        project_id: row.get(1)?,
        title: row.get(2)?,
        category: row.get(3)?,
        content: row.get(4)?,
        source_url: row.get(5)?,
        source_citation: row.get(6)?,
        tags: row.get(7)?,
        created_at: row.get(8)?,
    })
}

fn revision_row(row: &Row<'_>) -> rusqlite::Result<Revision> {
    let before: String = row.get(5)?;
    let after: String = row.get(6)?;
    Ok(Revision {
        id: row.get(0)?,
        project_id: row.get(1)?,
        chapter_id: row.get(2)?,
        revision_type: row.get(3)?,
        description: row.get(4)?,
        content_before: preview(&before, REVISION_PREVIEW_CHARS),
        content_after: preview(&after, REVISION_PREVIEW_CHARS),
        created_at: row.get(7)?,
    })
}

impl Store {
    // --- chapters ---

    pub fn create_chapter(&self, project_id: i64, input: &ChapterInput) -> Result<Chapter, StoreError> {
        self.get_project_exists(project_id)?;
        let next: i64 = self.conn.query_row(
            "SELECT COALESCE(MAX(position), 0) + 1 FROM chapters WHERE project_id = ?1",
            [project_id],
            |r| r.get(0),
        )?;
        let text = |v: &Option<String>| v.clone().unwrap_or_default();
        let ts = now();
        self.conn.execute(
            "INSERT INTO chapters (project_id, title, position, status, summary, content, notes,
                pov_character, setting, timeline_position, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)",
            params![
                project_id,
                input.title.clone().unwrap_or_else(|| format!("Chapter {next}")),
                input.order.unwrap_or(next),
                input.status.clone().unwrap_or_else(|| "outline".to_string()),
                text(&input.summary),
                text(&input.content),
                text(&input.notes),
                text(&input.pov_character),
                text(&input.setting),
                text(&input.timeline_position),
                ts,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.touch_project(project_id)?;
        self.get_chapter(id, false)
    }

    /// Chapters of a project in reading order.
    pub fn list_chapters(&self, project_id: i64, include_scenes: bool) -> Result<Vec<Chapter>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {CHAPTER_COLUMNS} FROM chapters WHERE project_id = ?1 ORDER BY position, id"
        ))?;
        let rows = stmt.query_map([project_id], chapter_row)?.collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(|c| self.chapter_with_scenes(c, include_scenes)).collect()
    }

    pub fn get_chapter(&self, id: i64, include_scenes: bool) -> Result<Chapter, StoreError> {
        let row = self
            .conn
            .query_row(&format!("SELECT {CHAPTER_COLUMNS} FROM chapters WHERE id = ?1"), [id], chapter_row)
            .optional()?;
        self.chapter_with_scenes(found(row, "chapter", id)?, include_scenes)
    }

    /// Update a chapter; a change of content is recorded as an `edit` revision
    /// in the same transaction as the update.
    pub fn update_chapter(&self, id: i64, input: &ChapterInput) -> Result<Chapter, StoreError> {
        let tx = self.conn.unchecked_transaction()?;
        let current = self.get_chapter(id, false)?;
        if let Some(content) = input.content.as_deref() {
            if content != current.content {
                self.record_revision(&NewRevision {
                    project_id: current.project_id,
                    chapter_id: Some(id),
                    revision_type: RevisionType::Edit,
                    description: "Manual edit",
                    content_before: &current.content,
                    content_after: content,
                })?;
            }
        }
        let pick = |new: &Option<String>, old: &str| new.clone().unwrap_or_else(|| old.to_string());
        self.conn.execute(
            "UPDATE chapters SET title = ?1, position = ?2, status = ?3, summary = ?4, content = ?5,
                notes = ?6, pov_character = ?7, setting = ?8, timeline_position = ?9, updated_at = ?10
             WHERE id = ?11",
            params![
                pick(&input.title, &current.title),
                input.order.unwrap_or(current.order),
                pick(&input.status, &current.status),
                pick(&input.summary, &current.summary),
                pick(&input.content, &current.content),
                pick(&input.notes, &current.notes),
                pick(&input.pov_character, &current.pov_character),
                pick(&input.setting, &current.setting),
                pick(&input.timeline_position, &current.timeline_position),
                now(),
                id,
            ],
        )?;
        self.touch_project(current.project_id)?;
        tx.commit()?;
        self.get_chapter(id, true)
    }

    /// Replace a chapter's content with generated prose. The chapter moves to
    /// `draft` and the change is recorded as an `expand` revision, atomically.
    pub fn save_expanded_chapter(&self, id: i64, content: &str) -> Result<Chapter, StoreError> {
        let tx = self.conn.unchecked_transaction()?;
        let current = self.get_chapter(id, false)?;
        self.record_revision(&NewRevision {
            project_id: current.project_id,
            chapter_id: Some(id),
            revision_type: RevisionType::Expand,
            description: "Chapter expanded from outline via AI",
            content_before: &current.content,
            content_after: content,
        })?;
        self.conn.execute(
            "UPDATE chapters SET content = ?1, status = 'draft', updated_at = ?2 WHERE id = ?3",
            params![content, now(), id],
        )?;
        self.touch_project(current.project_id)?;
        tx.commit()?;
        self.get_chapter(id, false)
    }

    pub fn delete_chapter(&self, id: i64) -> Result<(), StoreError> {
        let chapter = self.get_chapter(id, false)?;
        self.conn.execute("DELETE FROM chapters WHERE id = ?1", [id])?;
        self.touch_project(chapter.project_id)
    }

    fn chapter_with_scenes(&self, mut chapter: Chapter, include_scenes: bool) -> Result<Chapter, StoreError> {
        let scenes = self.list_scenes(chapter.id)?;
        chapter.word_count = if chapter.content.is_empty() {
            scenes.iter().map(|s| s.word_count).sum()
        } else {
            word_count(&chapter.content)
        };
        chapter.scene_count = scenes.len();
        if include_scenes {
            chapter.scenes = Some(scenes);
        }
        Ok(chapter)
    }

    fn get_project_exists(&self, project_id: i64) -> Result<(), StoreError> {
        let exists = self
            .conn
            .query_row("SELECT 1 FROM projects WHERE id = ?1", [project_id], |_| Ok(()))
            .optional()?;
        found(exists, "project", project_id)
    }

    // --- scenes ---

    pub fn create_scene(&self, chapter_id: i64, input: &SceneInput) -> Result<Scene, StoreError> {
        let chapter = self.get_chapter(chapter_id, false)?;
        let next: i64 = self.conn.query_row(
            "SELECT COALESCE(MAX(position), 0) + 1 FROM scenes WHERE chapter_id = ?1",
            [chapter_id],
            |r| r.get(0),
        )?;
        let text = |v: &Option<String>| v.clone().unwrap_or_default();
        self.conn.execute(
            "INSERT INTO scenes (chapter_id, title, position, content, summary, notes, scene_type,
                created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
            params![
                chapter_id,
                text(&input.title),
                input.order.unwrap_or(next),
                text(&input.content),
                text(&input.summary),
                text(&input.notes),
                input.scene_type.clone().unwrap_or_else(|| "action".to_string()),
                now(),
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.touch_project(chapter.project_id)?;
        self.get_scene(id)
    }

    pub fn list_scenes(&self, chapter_id: i64) -> Result<Vec<Scene>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {SCENE_COLUMNS} FROM scenes WHERE chapter_id = ?1 ORDER BY position, id"
        ))?;
        let rows = stmt.query_map([chapter_id], scene_row)?.collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn get_scene(&self, id: i64) -> Result<Scene, StoreError> {
        let row = self
            .conn
            .query_row(&format!("SELECT {SCENE_COLUMNS} FROM scenes WHERE id = ?1"), [id], scene_row)
            .optional()?;
        found(row, "scene", id)
    }

    pub fn update_scene(&self, id: i64, input: &SceneInput) -> Result<Scene, StoreError> {
        let current = self.get_scene(id)?;
        let pick = |new: &Option<String>, old: &str| new.clone().unwrap_or_else(|| old.to_string());
        self.conn.execute(
            "UPDATE scenes SET title = ?1, position = ?2, content = ?3, summary = ?4, notes = ?5,
                scene_type = ?6, updated_at = ?7
             WHERE id = ?8",
            params![
                pick(&input.title, &current.title),
                input.order.unwrap_or(current.order),
                pick(&input.content, &current.content),
                pick(&input.summary, &current.summary),
                pick(&input.notes, &current.notes),
                pick(&input.scene_type, &current.scene_type),
                now(),
                id,
            ],
        )?;
        self.get_scene(id)
    }

    pub fn delete_scene(&self, id: i64) -> Result<(), StoreError> {
        let deleted = self.conn.execute("DELETE FROM scenes WHERE id = ?1", [id])?;
        if deleted == 0 {
            return Err(StoreError::NotFound { kind: "scene", id });
        }
        Ok(())
    }

    // --- characters ---

    pub fn create_character(&self, project_id: i64, input: &CharacterInput) -> Result<Character, StoreError> {
        self.get_project_exists(project_id)?;
        let text = |v: &Option<String>| v.clone().unwrap_or_default();
        self.conn.execute(
            "INSERT INTO characters (project_id, name, role, description, backstory, motivations,
                arc_description, notes, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                project_id,
                input.name.clone().unwrap_or_else(|| "Unnamed Character".to_string()),
                input.role.clone().unwrap_or_else(|| "supporting".to_string()),
                text(&input.description),
                text(&input.backstory),
                text(&input.motivations),
                text(&input.arc_description),
                text(&input.notes),
                now(),
            ],
        )?;
        self.get_character(self.conn.last_insert_rowid())
    }

    pub fn list_characters(&self, project_id: i64) -> Result<Vec<Character>, StoreError> {
        self.get_project_exists(project_id)?;
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {CHARACTER_COLUMNS} FROM characters WHERE project_id = ?1 ORDER BY id"
        ))?;
        let rows = stmt.query_map([project_id], character_row)?.collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn get_character(&self, id: i64) -> Result<Character, StoreError> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {CHARACTER_COLUMNS} FROM characters WHERE id = ?1"),
                [id],
                character_row,
            )
            .optional()?;
        found(row, "character", id)
    }

    pub fn update_character(&self, id: i64, input: &CharacterInput) -> Result<Character, StoreError> {
        let current = self.get_character(id)?;
        let pick = |new: &Option<String>, old: &str| new.clone().unwrap_or_else(|| old.to_string());
        self.conn.execute(
            "UPDATE characters SET name = ?1, role = ?2, description = ?3, backstory = ?4,
                motivations = ?5, arc_description = ?6, notes = ?7
             WHERE id = ?8",
            params![
                pick(&input.name, &current.name),
                pick(&input.role, &current.role),
                pick(&input.description, &current.description),
                pick(&input.backstory, &current.backstory),
                pick(&input.motivations, &current.motivations),
                pick(&input.arc_description, &current.arc_description),
                pick(&input.notes, &current.notes),
                id,
            ],
        )?;
        self.get_character(id)
    }

    pub fn delete_character(&self, id: i64) -> Result<(), StoreError> {
        let deleted = self.conn.execute("DELETE FROM characters WHERE id = ?1", [id])?;
        if deleted == 0 {
            return Err(StoreError::NotFound { kind: "character", id });
        }
        Ok(())
    }

    // --- research notes ---

    pub fn create_research_note(
        &self,
        project_id: i64,
        input: &ResearchNoteInput,
    ) -> Result<ResearchNote, StoreError> {
        self.get_project_exists(project_id)?;
        let text = |v: &Option<String>| v.clone().unwrap_or_default();
        self.conn.execute(
            "INSERT INTO research_notes (project_id, title, category, content, source_url,
                source_citation, tags, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                project_id,
                input.title.clone().unwrap_or_else(|| "Research Note".to_string()),
                input.category.clone().unwrap_or_else(|| "general".to_string()),
                text(&input.content),
                text(&input.source_url),
                text(&input.source_citation),
                text(&input.tags),
                now(),
            ],
        )?;
        self.get_research_note(self.conn.last_insert_rowid())
    }

    /// Research notes, newest first.
    pub fn list_research_notes(&self, project_id: i64) -> Result<Vec<ResearchNote>, StoreError> {
        self.get_project_exists(project_id)?;
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {RESEARCH_COLUMNS} FROM research_notes WHERE project_id = ?1
             ORDER BY created_at DESC, id DESC"
        ))?;
        let rows = stmt.query_map([project_id], research_row)?.collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn get_research_note(&self, id: i64) -> Result<ResearchNote, StoreError> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {RESEARCH_COLUMNS} FROM research_notes WHERE id = ?1"),
                [id],
                research_row,
            )
            .optional()?;
        found(row, "research note", id)
    }

    pub fn update_research_note(
        &self,
        id: i64,
        input: &ResearchNoteInput,
    ) -> Result<ResearchNote, StoreError> {
        let current = self.get_research_note(id)?;
        let pick = |new: &Option<String>, old: &str| new.clone().unwrap_or_else(|| old.to_string());
        self.conn.execute(
            "UPDATE research_notes SET title = ?1, category = ?2, content = ?3, source_url = ?4,
                source_citation = ?5, tags = ?6
             WHERE id = ?7",
            params![
                pick(&input.title, &current.title),
                pick(&input.category, &current.category),
                pick(&input.content, &current.content),
                pick(&input.source_url, &current.source_url),
                pick(&input.source_citation, &current.source_citation),
                pick(&input.tags, &current.tags),
                id,
            ],
        )?;
        self.get_research_note(id)
    }

    pub fn delete_research_note(&self, id: i64) -> Result<(), StoreError> {
        let deleted = self.conn.execute("DELETE FROM research_notes WHERE id = ?1", [id])?;
        if deleted == 0 {
            return Err(StoreError::NotFound { kind: "research note", id });
        }
        Ok(())
    }

    // --- revisions ---

    pub fn record_revision(&self, revision: &NewRevision<'_>) -> Result<i64, StoreError> {
        self.conn.execute(
            "INSERT INTO revision_history (project_id, chapter_id, revision_type, description,
                content_before, content_after, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                revision.project_id,
                revision.chapter_id,
                revision.revision_type.as_str(),
                revision.description,
                revision.content_before,
                revision.content_after,
                now(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// The 50 most recent revisions of a project.
    pub fn list_revisions(&self, project_id: i64) -> Result<Vec<Revision>, StoreError> {
        self.get_project_exists(project_id)?;
        let mut stmt = self.conn.prepare(
            "SELECT id, project_id, chapter_id, revision_type, description, content_before,
                content_after, created_at
             FROM revision_history WHERE project_id = ?1
             ORDER BY created_at DESC, id DESC LIMIT ?2",
        )?;
        let rows = stmt
            .query_map(params![project_id, REVISION_LIST_LIMIT], revision_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::models::ProjectInput;

    fn setup() -> (Store, i64) {
        let store = Store::open_in_memory().expect("store");
        let project = store.create_project(&ProjectInput::default()).expect("project");
        (store, project.id)
    }

    #[test]
    fn chapters_default_to_next_order_and_title() {
        let (store, pid) = setup();
        let first = store.create_chapter(pid, &ChapterInput::default()).expect("c1");
        let second = store.create_chapter(pid, &ChapterInput::default()).expect("c2");
        assert_eq!((first.order, first.title.as_str()), (1, "Chapter 1"));
        assert_eq!((second.order, second.title.as_str()), (2, "Chapter 2"));
        assert_eq!(first.status, "outline");
    }

    #[test]
    fn chapter_for_missing_project_is_not_found() {
        let (store, _) = setup();
        let err = store.create_chapter(999, &ChapterInput::default()).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { kind: "project", id: 999 }));
    }

    #[test]
    fn chapter_word_count_falls_back_to_scenes() {
        let (store, pid) = setup();
        let chapter = store.create_chapter(pid, &ChapterInput::default()).expect("chapter");
        store
            .create_scene(chapter.id, &SceneInput { content: Some("a b c".into()), ..SceneInput::default() })
            .expect("s1");
        store
            .create_scene(chapter.id, &SceneInput { content: Some("d e".into()), ..SceneInput::default() })
            .expect("s2");

        let chapter = store.get_chapter(chapter.id, true).expect("get");
        assert_eq!(chapter.word_count, 5);
        assert_eq!(chapter.scene_count, 2);
        let orders: Vec<i64> = chapter.scenes.expect("scenes").iter().map(|s| s.order).collect();
        assert_eq!(orders, vec![1, 2]);

        let chapter = store
            .update_chapter(chapter.id, &ChapterInput { content: Some("x y".into()), ..ChapterInput::default() })
            .expect("update");
        assert_eq!(chapter.word_count, 2);
    }

    #[test]
    fn content_change_records_revision_with_preview() {
        let (store, pid) = setup();
        let chapter = store
            .create_chapter(pid, &ChapterInput { content: Some("old".into()), ..ChapterInput::default() })
            .expect("chapter");
        let long = "w".repeat(600);
        store
            .update_chapter(chapter.id, &ChapterInput { content: Some(long), ..ChapterInput::default() })
            .expect("update");
        store
            .update_chapter(chapter.id, &ChapterInput { title: Some("Renamed".into()), ..ChapterInput::default() })
            .expect("title only");

        let revisions = store.list_revisions(pid).expect("revisions");
        assert_eq!(revisions.len(), 1);
        assert_eq!(revisions[0].revision_type, "edit");
        assert_eq!(revisions[0].content_before, "old");
        assert_eq!(revisions[0].content_after.len(), 503);
        assert_eq!(revisions[0].chapter_id, Some(chapter.id));
    }

    #[test]
    fn expanded_chapter_is_draft_with_one_expand_revision() {
        let (store, pid) = setup();
        let chapter = store
            .create_chapter(pid, &ChapterInput { summary: Some("They meet.".into()), ..ChapterInput::default() })
            .expect("chapter");
        let saved = store.save_expanded_chapter(chapter.id, "Rain fell on the pier.").expect("save");
        assert_eq!(saved.status, "draft");
        assert_eq!(saved.content, "Rain fell on the pier.");

        let revisions = store.list_revisions(pid).expect("revisions");
        assert_eq!(revisions.len(), 1);
        assert_eq!(revisions[0].revision_type, "expand");
        assert_eq!(revisions[0].description, "Chapter expanded from outline via AI");
        assert_eq!(revisions[0].content_before, "");
    }

    fn reject_chapter_updates(store: &Store) {
        store
            .conn
            .execute_batch(
                "CREATE TRIGGER no_chapter_updates BEFORE UPDATE ON chapters
                 BEGIN SELECT RAISE(ABORT, 'chapters are read-only'); END;",
            )
            .expect("trigger");
    }

    #[test]
    fn failed_chapter_update_leaves_no_revision() {
        let (store, pid) = setup();
        let chapter = store
            .create_chapter(pid, &ChapterInput { content: Some("old text".into()), ..ChapterInput::default() })
            .expect("chapter");
        reject_chapter_updates(&store);

        let edit = ChapterInput { content: Some("new text".into()), ..ChapterInput::default() };
        assert!(store.update_chapter(chapter.id, &edit).is_err());
        assert!(store.save_expanded_chapter(chapter.id, "generated").is_err());

        assert!(store.list_revisions(pid).expect("revisions").is_empty());
        assert_eq!(store.get_chapter(chapter.id, false).expect("chapter").content, "old text");
    }

    #[test]
    fn deleting_project_cascades() {
        let (store, pid) = setup();
        let chapter = store.create_chapter(pid, &ChapterInput::default()).expect("chapter");
        let scene = store.create_scene(chapter.id, &SceneInput::default()).expect("scene");
        let character = store.create_character(pid, &CharacterInput::default()).expect("character");
        store.delete_project(pid).expect("delete");

        assert!(matches!(store.get_chapter(chapter.id, false), Err(StoreError::NotFound { .. })));
        assert!(matches!(store.get_scene(scene.id), Err(StoreError::NotFound { .. })));
        assert!(matches!(store.get_character(character.id), Err(StoreError::NotFound { .. })));
    }

    #[test]
    fn character_and_research_crud() {
        let (store, pid) = setup();
        let character = store
            .create_character(pid, &CharacterInput { name: Some("Mara".into()), ..CharacterInput::default() })
            .expect("character");
        assert_eq!(character.role, "supporting");
        let updated = store
            .update_character(character.id, &CharacterInput { role: Some("protagonist".into()), ..CharacterInput::default() })
            .expect("update");
        assert_eq!((updated.name.as_str(), updated.role.as_str()), ("Mara", "protagonist"));

        let first = store.create_research_note(pid, &ResearchNoteInput::default()).expect("r1");
        let second = store
            .create_research_note(pid, &ResearchNoteInput { title: Some("Tides".into()), ..ResearchNoteInput::default() })
            .expect("r2");
        assert_eq!(first.title, "Research Note");
        assert_eq!(first.category, "general");
        let ids: Vec<i64> = store.list_research_notes(pid).expect("list").iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);

        store.delete_research_note(first.id).expect("delete");
        assert!(matches!(store.get_research_note(first.id), Err(StoreError::NotFound { .. })));
    }
}
