// 📄 Document uploads - blob store contract plus SQLite metadata table
//
// Blob first, metadata second. A failed metadata insert removes the blob again
// so an aborted upload leaves nothing behind.

use crate::error::{DocumentError, FieldError, StorageError};
use crate::validation::validate_document_title;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;
use tracing::{info, warn};

/// File extensions accepted for upload
pub const ALLOWED_EXTENSIONS: &[&str] = &["pdf", "doc", "docx", "txt", "jpg", "jpeg", "png"];

// ============================================================================
// BLOB STORE CONTRACT
// ============================================================================

/// BlobStore - hosted object storage treated as a black box
pub trait BlobStore: Send + Sync {
    fn upload(&self, path: &str, bytes: &[u8]) -> Result<(), StorageError>;

    fn download(&self, path: &str) -> Result<Vec<u8>, StorageError>;

    fn delete(&self, path: &str) -> Result<(), StorageError>;
}

/// Objects kept as files under a root directory
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FsBlobStore { root: root.into() }
    }

    /// Resolve an object path, refusing anything that escapes the root.
    fn resolve(&self, path: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(path);
        let safe = !path.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));

        if !safe {
            return Err(StorageError::InvalidPath(path.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

impl BlobStore for FsBlobStore {
    fn upload(&self, path: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).map_err(|source| StorageError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&full, bytes).map_err(|source| StorageError::Io { path: full, source })
    }

    fn download(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        let full = self.resolve(path)?;
        fs::read(&full).map_err(|source| match source.kind() {
            std::io::ErrorKind::NotFound => StorageError::NotFound(path.to_string()),
            _ => StorageError::Io { path: full, source },
        })
    }

    fn delete(&self, path: &str) -> Result<(), StorageError> {
        let full = self.resolve(path)?;
        fs::remove_file(&full).map_err(|source| match source.kind() {
            std::io::ErrorKind::NotFound => StorageError::NotFound(path.to_string()),
            _ => StorageError::Io { path: full, source },
        })
    }
}

/// Objects kept in a map, for tests and throwaway sessions
#[derive(Default)]
pub struct MemoryBlobStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl BlobStore for MemoryBlobStore {
    fn upload(&self, path: &str, bytes: &[u8]) -> Result<(), StorageError> {
        if path.is_empty() {
            return Err(StorageError::InvalidPath(path.to_string()));
        }
        self.objects
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(path.to_string(), bytes.to_vec());
        Ok(())
    }

    fn download(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        self.objects
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(path)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }

    fn delete(&self, path: &str) -> Result<(), StorageError> {
        self.objects
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }
}

// ============================================================================
// METADATA
// ============================================================================

/// One uploaded document, as stored in the `documents` side table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: String,
    pub owner: String,
    pub title: String,
    pub file_name: String,
    pub path: String,
    pub size: u64,
    pub mime_type: String,
    pub uploaded_at: DateTime<Utc>,
}

impl DocumentRecord {
    pub fn display_size(&self) -> String {
        format_file_size(self.size)
    }
}

pub fn setup_documents_table(conn: &Connection) -> rusqlite::Result<()> {
    // WAL is a no-op for in-memory databases
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS documents (
            id TEXT PRIMARY KEY,
            owner TEXT NOT NULL,
            title TEXT NOT NULL,
            file_name TEXT NOT NULL,
            path TEXT UNIQUE NOT NULL,
            size INTEGER NOT NULL,
            mime_type TEXT NOT NULL,
            uploaded_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_documents_owner ON documents(owner, uploaded_at)",
        [],
    )?;

    Ok(())
}

fn insert_document(conn: &Connection, doc: &DocumentRecord) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO documents (id, owner, title, file_name, path, size, mime_type, uploaded_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            doc.id,
            doc.owner,
            doc.title,
            doc.file_name,
            doc.path,
            doc.size as i64,
            doc.mime_type,
            doc.uploaded_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        ],
    )?;
    Ok(())
}

fn row_to_document(row: &Row<'_>) -> rusqlite::Result<DocumentRecord> {
    let uploaded_at: String = row.get(7)?;
    let uploaded_at = DateTime::parse_from_rfc3339(&uploaded_at)
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, Box::new(e))
        })?
        .with_timezone(&Utc);
    let size: i64 = row.get(5)?;

    Ok(DocumentRecord {
        id: row.get(0)?,
        owner: row.get(1)?,
        title: row.get(2)?,
        file_name: row.get(3)?,
        path: row.get(4)?,
        size: size.max(0) as u64,
        mime_type: row.get(6)?,
        uploaded_at,
    })
}

const SELECT_COLUMNS: &str =
    "SELECT id, owner, title, file_name, path, size, mime_type, uploaded_at FROM documents";

// ============================================================================
// DOCUMENT SERVICE
// ============================================================================

/// Upload, list, download and delete documents for a signed-in owner
pub struct DocumentService<B: BlobStore> {
    conn: Connection,
    store: B,
}

impl<B: BlobStore> DocumentService<B> {
    pub fn new(conn: Connection, store: B) -> Result<Self, DocumentError> {
        setup_documents_table(&conn)?;
        Ok(DocumentService { conn, store })
    }

    pub fn store(&self) -> &B {
        &self.store
    }

    pub fn upload(
        &self,
        owner: &str,
        title: &str,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<DocumentRecord, DocumentError> {
        let owner = validate_owner(owner)?;
        let title = validate_document_title(title)?;
        if bytes.is_empty() || file_name.trim().is_empty() {
            return Err(FieldError::new("file", "Please select a file").into());
        }
        let extension = allowed_extension(file_name)?;

        let uploaded_at = Utc::now();
        let id = uuid::Uuid::new_v4().to_string();
        let path = format!(
            "{}/{}-{}.{}",
            owner,
            uploaded_at.timestamp_millis(),
            &id[..8],
            extension
        );

        let doc = DocumentRecord {
            id,
            owner: owner.to_string(),
            title,
            file_name: file_name.trim().to_string(),
            path,
            size: bytes.len() as u64,
            mime_type: mime_type_for(&extension).to_string(),
            uploaded_at,
        };

        self.store.upload(&doc.path, bytes)?;

        if let Err(e) = insert_document(&self.conn, &doc) {
            if let Err(cleanup) = self.store.delete(&doc.path) {
                warn!(path = %doc.path, error = %cleanup, "orphaned blob after failed insert");
            }
            return Err(e.into());
        }

        info!(owner = %doc.owner, id = %doc.id, size = doc.size, "document uploaded");
        Ok(doc)
    }

    /// Owner's documents, newest first
    pub fn list(&self, owner: &str) -> Result<Vec<DocumentRecord>, DocumentError> {
        let owner = validate_owner(owner)?;
        let mut stmt = self.conn.prepare(&format!(
            "{} WHERE owner = ?1 ORDER BY uploaded_at DESC, rowid DESC",
            SELECT_COLUMNS
        ))?;

        let docs = stmt
            .query_map(params![owner], row_to_document)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(docs)
    }

    pub fn get(&self, owner: &str, id: &str) -> Result<DocumentRecord, DocumentError> {
        let owner = validate_owner(owner)?;
        self.conn
            .query_row(
                &format!("{} WHERE owner = ?1 AND id = ?2", SELECT_COLUMNS),
                params![owner, id],
                row_to_document,
            )
            .optional()?
            .ok_or_else(|| DocumentError::NotFound(id.to_string()))
    }

    pub fn download(
        &self,
        owner: &str,
        id: &str,
    ) -> Result<(DocumentRecord, Vec<u8>), DocumentError> {
        let doc = self.get(owner, id)?;
        let bytes = self.store.download(&doc.path)?;
        Ok((doc, bytes))
    }

    /// Remove the blob, then the metadata row.
    pub fn delete(&self, owner: &str, id: &str) -> Result<(), DocumentError> {
        let doc = self.get(owner, id)?;

        match self.store.delete(&doc.path) {
            Ok(()) => {}
            Err(StorageError::NotFound(path)) => {
                warn!(path = %path, "blob already gone, removing metadata");
            }
            Err(e) => return Err(e.into()),
        }

        self.conn.execute(
            "DELETE FROM documents WHERE owner = ?1 AND id = ?2",
            params![doc.owner, id],
        )?;
        info!(owner = %doc.owner, id = %id, "document deleted");
        Ok(())
    }
}

fn validate_owner(owner: &str) -> Result<&str, FieldError> {
    let owner = owner.trim();
    let safe = !owner.is_empty()
        && owner != "."
        && owner != ".."
        && !owner.contains(['/', '\\']);
    if !safe {
        return Err(FieldError::new("owner", "Please log in to upload documents"));
    }
    Ok(owner)
}

fn allowed_extension(file_name: &str) -> Result<String, FieldError> {
    let extension = Path::new(file_name.trim())
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    if ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        Ok(extension)
    } else {
        Err(FieldError::new(
            "file",
            format!("Unsupported file type; allowed: {}", ALLOWED_EXTENSIONS.join(", ")),
        ))
    }
}

pub fn mime_type_for(extension: &str) -> &'static str {
    match extension {
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "txt" => "text/plain",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        _ => "application/octet-stream",
    }
}

/// Human-readable size, 1024-based, at most two decimals ("1.5 KB").
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[unit])
}

// ============================================================================
// TESTS
// ============================================================================
