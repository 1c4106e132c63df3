//! SQLite note store.
//!
//! Notes live in three tables:
//!
//! - `records`: one row per note, holding its path and text
//! - `tags`: one row per tag (`value` NULL) or field (`value` set)
//! - `config`: named settings; saved queries use category `queries`
//!
//! `tags.value` has no declared type, so numbers stay REAL and text stays
//! TEXT. Every note that is changed or deleted is appended to the archive
//! first.

pub mod types;

pub use types::*;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use regex::Regex;
use rusqlite::functions::FunctionFlags;
use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, OptionalExtension, ToSql};
use tracing::{debug, info, warn};

use crate::archive::Archiver;
use crate::error::{Error, Result};
use crate::note::{Directive, FieldValue, Note, NoteMap};
use crate::query::{compile, SearchRequest};
use crate::sort::sorted_paths;
use crate::time::{now_local, timestamp_for_logging};

/// Default database file name.
pub const DATABASE_FILENAME: &str = "notes.sqlite3";

/// `config.category` of saved queries.
const QUERY_CATEGORY: &str = "queries";

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS records (
        id INTEGER PRIMARY KEY,
        path TEXT NOT NULL UNIQUE,
        text TEXT
    );
    CREATE TABLE IF NOT EXISTS tags (
        id INTEGER,
        name TEXT,
        value
    );
    CREATE TABLE IF NOT EXISTS config (
        category TEXT,
        name TEXT,
        value TEXT
    );
    CREATE INDEX IF NOT EXISTS records_path ON records (path);
    CREATE INDEX IF NOT EXISTS tags_name ON tags (name);
    CREATE INDEX IF NOT EXISTS tags_value ON tags (value);
    CREATE INDEX IF NOT EXISTS config_category_name ON config (category, name);
";

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Database connection wrapper.
///
/// Thread-safe via internal Mutex. All database operations acquire the lock.
pub struct Database {
    conn: Mutex<Connection>,
    path: PathBuf,
    archiver: Archiver,
}

impl Database {
    /// Open (creating if needed) the database at `path`, archiving to `archive_path`.
    ///
    /// A database held by another program fails with [`Error::DatabaseLocked`]
    /// instead of waiting.
    pub fn open(path: impl AsRef<Path>, archive_path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(&path)?;
        conn.busy_timeout(Duration::ZERO)?;
        register_regexp(&conn)?;
        conn.execute_batch(&format!("BEGIN; {} COMMIT;", SCHEMA))?;

        debug!(database = %path.display(), "opened note database");
        Ok(Self {
            conn: Mutex::new(conn),
            path,
            archiver: Archiver::new(archive_path),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn archive_path(&self) -> &Path {
        self.archiver.path()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| Error::LockPoisoned)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Saving
    // ─────────────────────────────────────────────────────────────────────────

    /// Save a batch of notes in one transaction, each according to its directive.
    ///
    /// Notes are applied in notepath order. An `add` onto a path already in
    /// use commits the notes before it and then fails with
    /// [`Error::DuplicatePath`]; any other error rolls back the whole batch.
    pub fn save_notes(&self, notes: &NoteMap) -> Result<SaveReport> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let stamp = timestamp_for_logging(&now_local());

        let mut batch = SaveBatch {
            conn: &tx,
            archiver: &self.archiver,
            stamp: &stamp,
            report: SaveReport::default(),
        };
        for path in sorted_paths(notes.keys()) {
            match batch.save(notes[path].clone()) {
                Ok(()) => {}
                Err(Error::DuplicatePath(path)) => {
                    drop(batch);
                    tx.commit()?;
                    return Err(Error::DuplicatePath(path));
                }
                Err(e) => return Err(e),
            }
        }

        let report = batch.report;
        tx.commit()?;
        info!(
            inserted = report.inserted,
            merged = report.merged,
            replaced = report.replaced,
            deleted = report.deleted,
            archived = report.archived,
            "saved notes"
        );
        Ok(report)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Reading
    // ─────────────────────────────────────────────────────────────────────────

    /// The stored notes at `paths`; paths with no note are left out.
    pub fn notes_by_path(&self, paths: &[&str]) -> Result<NoteMap> {
        let conn = self.lock()?;
        let mut ids = Vec::new();
        for path in paths {
            ids.extend(ids_for_path(&conn, path)?);
        }
        notes_by_id(&conn, &ids)
    }

    pub fn note_by_path(&self, path: &str) -> Result<Option<Note>> {
        Ok(self.notes_by_path(&[path])?.remove(path))
    }

    pub fn note_count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Run `sql`, which must select record ids, and load the matching notes.
    ///
    /// Blank SQL selects nothing.
    pub fn run_query(&self, sql: &str) -> Result<NoteMap> {
        if sql.trim().is_empty() {
            return Ok(NoteMap::new());
        }

        let conn = self.lock()?;
        debug!(sql, "running query");
        let mut stmt = conn.prepare(sql)?;
        let ids = stmt
            .query_map([], |row| row.get::<_, i64>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        notes_by_id(&conn, &ids)
    }

    /// Find the notes matching `request`.
    ///
    /// A named saved query takes the place of the other criteria. With
    /// `save_as` set, the compiled criteria are also saved under that name.
    pub fn search(&self, request: &SearchRequest) -> Result<NoteMap> {
        if let Some(name) = &request.saved_query {
            return self.run_saved_query(name);
        }

        let sql = compile(request).sql();
        if let Some(name) = &request.save_as {
            if sql.is_empty() {
                warn!(name = %name, "cannot save query with no parameters");
            } else {
                self.save_query(name, &sql)?;
            }
        }
        self.run_query(&sql)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Saved queries
    // ─────────────────────────────────────────────────────────────────────────

    /// Save `sql` under `name`, replacing any query already saved there.
    pub fn save_query(&self, name: &str, sql: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() || sql.trim().is_empty() {
            return Ok(());
        }

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM config WHERE category = ?1 AND name = ?2",
            params![QUERY_CATEGORY, name],
        )?;
        tx.execute(
            "INSERT INTO config (category, name, value) VALUES (?1, ?2, ?3)",
            params![QUERY_CATEGORY, name, sql],
        )?;
        tx.commit()?;
        info!(name, "saved query");
        Ok(())
    }

    /// Remove the query saved under `name`; false if there was none.
    pub fn remove_saved_query(&self, name: &str) -> Result<bool> {
        let conn = self.lock()?;
        let removed = conn.execute(
            "DELETE FROM config WHERE category = ?1 AND name = ?2",
            params![QUERY_CATEGORY, name.trim()],
        )?;
        Ok(removed > 0)
    }

    /// Names of all saved queries, alphabetically.
    pub fn saved_query_names(&self) -> Result<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT name FROM config WHERE category = ?1 ORDER BY name")?;
        let names = stmt
            .query_map(params![QUERY_CATEGORY], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(names)
    }

    pub fn saved_query(&self, name: &str) -> Result<Option<String>> {
        let conn = self.lock()?;
        let sql = conn
            .query_row(
                "SELECT value FROM config WHERE category = ?1 AND name = ?2",
                params![QUERY_CATEGORY, name.trim()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(sql)
    }

    pub fn run_saved_query(&self, name: &str) -> Result<NoteMap> {
        match self.saved_query(name)? {
            Some(sql) => self.run_query(&sql),
            None => Err(Error::SavedQueryNotFound(name.trim().to_string())),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Engine
    // ─────────────────────────────────────────────────────────────────────────

    pub fn engine_info(&self) -> Result<EngineInfo> {
        let conn = self.lock()?;
        let version: String = conn.query_row("SELECT sqlite_version()", [], |row| row.get(0))?;
        let mut stmt = conn.prepare("PRAGMA compile_options")?;
        let compile_options = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(EngineInfo {
            version,
            compile_options,
        })
    }
}

/// Per-batch state of [`Database::save_notes`].
struct SaveBatch<'a> {
    conn: &'a Connection,
    archiver: &'a Archiver,
    stamp: &'a str,
    report: SaveReport,
}

impl SaveBatch<'_> {
    fn save(&mut self, mut note: Note) -> Result<()> {
        debug!(path = %note.path, directive = %note.directive, "saving note");
        match std::mem::take(&mut note.directive) {
            Directive::Insert | Directive::Merge => self.insert_or_merge(note),
            Directive::Replace => self.replace(note),
            Directive::AddOnly => {
                if !ids_for_path(self.conn, &note.path)?.is_empty() {
                    return Err(Error::DuplicatePath(note.path));
                }
                insert_note(self.conn, &note)?;
                self.report.inserted += 1;
                Ok(())
            }
            Directive::Delete => {
                if self.take(&note.path)?.is_some() {
                    self.report.deleted += 1;
                }
                Ok(())
            }
            Directive::Rename(new_path) => {
                self.take(&note.path)?;
                note.path = new_path;
                self.report.renamed += 1;
                self.insert_or_merge(note)
            }
            Directive::Unknown(directive) => {
                warn!(path = %note.path, directive = %directive, "unknown directive; replacing note");
                self.replace(note)
            }
        }
    }

    fn insert_or_merge(&mut self, note: Note) -> Result<()> {
        match self.take(&note.path)? {
            Some(mut stored) => {
                stored.merge(&note)?;
                insert_note(self.conn, &stored)?;
                self.report.merged += 1;
            }
            None => {
                insert_note(self.conn, &note)?;
                self.report.inserted += 1;
            }
        }
        Ok(())
    }

    fn replace(&mut self, note: Note) -> Result<()> {
        if self.take(&note.path)?.is_some() {
            self.report.replaced += 1;
        } else {
            self.report.inserted += 1;
        }
        insert_note(self.conn, &note)
    }

    /// Archive and delete whatever is stored at `path`, returning it.
    fn take(&mut self, path: &str) -> Result<Option<Note>> {
        let ids = ids_for_path(self.conn, path)?;
        if ids.is_empty() {
            return Ok(None);
        }

        let mut stored = notes_by_id(self.conn, &ids)?;
        self.archiver.append_notes(&stored, self.stamp)?;
        self.report.archived += stored.len();
        delete_ids(self.conn, &ids)?;
        Ok(stored.remove(path))
    }
}

impl ToSql for FieldValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            FieldValue::Number(n) => ToSqlOutput::from(*n),
            FieldValue::Text(s) => ToSqlOutput::from(s.as_str()),
        })
    }
}

/// A `tags.value` as a field value; `None` marks a tag.
fn field_value(value: ValueRef<'_>) -> Option<FieldValue> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(FieldValue::Number(i as f64)),
        ValueRef::Real(f) => Some(FieldValue::Number(f)),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Some(FieldValue::Text(String::from_utf8_lossy(bytes).into_owned()))
        }
    }
}

/// `X REGEXP Y` calls `regexp(Y, X)`; compiled patterns are cached per statement.
fn register_regexp(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        "regexp",
        2,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let regex: Arc<Regex> = ctx.get_or_create_aux(0, |pattern| -> std::result::Result<_, BoxError> {
                Ok(Regex::new(pattern.as_str()?)?)
            })?;
            let is_match = match ctx.get_raw(1) {
                ValueRef::Null | ValueRef::Blob(_) => false,
                ValueRef::Integer(i) => regex.is_match(&i.to_string()),
                ValueRef::Real(f) => regex.is_match(&FieldValue::Number(f).to_string()),
                ValueRef::Text(bytes) => regex.is_match(&String::from_utf8_lossy(bytes)),
            };
            Ok(is_match)
        },
    )
}

fn ids_for_path(conn: &Connection, path: &str) -> Result<Vec<i64>> {
    let mut stmt = conn.prepare("SELECT id FROM records WHERE path = ?1")?;
    let ids = stmt
        .query_map(params![path], |row| row.get(0))?
        .collect::<std::result::Result<Vec<i64>, _>>()?;
    Ok(ids)
}

fn id_list(ids: &[i64]) -> String {
    ids.iter().map(i64::to_string).collect::<Vec<_>>().join(", ")
}

/// Load the notes with the given record ids.
///
/// Rows sharing a path are joined into one note, their texts separated by a
/// blank line. Tag rows with no matching record are ignored.
fn notes_by_id(conn: &Connection, ids: &[i64]) -> Result<NoteMap> {
    let mut notes = NoteMap::new();
    if ids.is_empty() {
        return Ok(notes);
    }
    let id_list = id_list(ids);

    let mut stmt = conn.prepare(&format!(
        "SELECT id, path, text FROM records WHERE id IN ({}) ORDER BY id",
        id_list
    ))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let path: String = row.get(1)?;
        let text: Option<String> = row.get(2)?;
        let text = text.unwrap_or_default();

        let note = notes
            .entry(path.clone())
            .or_insert_with(|| Note::new(path));
        if note.lines.is_empty() {
            note.set_text(&text);
        } else {
            let joined = format!("{}\n{}", note.text(), text);
            note.set_text(&joined);
        }
    }

    let mut stmt = conn.prepare(&format!(
        "SELECT records.path, tags.name, tags.value
         FROM records LEFT OUTER JOIN tags ON records.id = tags.id
         WHERE records.id IN ({})
         ORDER BY records.id, tags.rowid",
        id_list
    ))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let path: String = row.get(0)?;
        let Some(name) = row.get::<_, Option<String>>(1)? else {
            continue;
        };
        let Some(note) = notes.get_mut(&path) else {
            continue;
        };
        match field_value(row.get_ref(2)?) {
            None => {
                if !note.tags.contains(&name) {
                    note.tags.push(name);
                }
            }
            Some(value) => note.add_field(name, value),
        }
    }

    Ok(notes)
}

fn insert_note(conn: &Connection, note: &Note) -> Result<()> {
    conn.execute(
        "INSERT INTO records (path, text) VALUES (?1, ?2)",
        params![note.path, note.text()],
    )?;
    let id = conn.last_insert_rowid();

    // Row ids can be reused; drop tag rows left behind by an earlier record.
    conn.execute("DELETE FROM tags WHERE id = ?1", params![id])?;

    let mut stmt = conn.prepare_cached("INSERT INTO tags (id, name, value) VALUES (?1, ?2, ?3)")?;
    for tag in &note.tags {
        stmt.execute(params![id, tag, Option::<FieldValue>::None])?;
    }
    for (name, value) in &note.fields {
        stmt.execute(params![id, name, value])?;
    }
    Ok(())
}

fn delete_ids(conn: &Connection, ids: &[i64]) -> Result<()> {
    let id_list = id_list(ids);
    conn.execute(&format!("DELETE FROM records WHERE id IN ({})", id_list), [])?;
    conn.execute(&format!("DELETE FROM tags WHERE id IN ({})", id_list), [])?;
    Ok(())
}
