//! SQLite storage backend

use super::traits::{
    fold, required_text, CaseFilter, CaseStore, CaseSummary, CaseWindow, OpenStore, StorageError,
    StorageResult,
};
use crate::model::{
    Analysis, Case, CaseId, CaseUpdate, Document, DocumentId, NewCase, NewDocument,
    DEFAULT_STATUS, UNKNOWN_DOCUMENT_TYPE,
};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

const CASE_COLUMNS: &str =
    "c.id, c.case_name, c.client_name, c.status, c.date_opened, c.summary, c.created_at, c.updated_at";

const DOCUMENT_COLUMNS: &str = "d.id, d.case_id, d.document_name, d.storage_path, d.event_date, \
     d.document_type, d.ai_analysis, d.created_at, d.updated_at";

const EVENT_DATE_FORMAT: &str = "%Y-%m-%d";

/// SQLite-backed case store
///
/// Uses a single SQLite database file with tables for cases and documents.
/// Thread-safe via internal mutex on the connection; multi-statement
/// operations run inside a transaction while the lock is held.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

/// Raw column values of a case row, before date parsing
struct CaseRow {
    id: i64,
    case_name: String,
    client_name: String,
    status: String,
    date_opened: String,
    summary: Option<String>,
    created_at: String,
    updated_at: String,
}

impl CaseRow {
    /// Read the columns selected by `CASE_COLUMNS`, starting at index 0
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            case_name: row.get(1)?,
            client_name: row.get(2)?,
            status: row.get(3)?,
            date_opened: row.get(4)?,
            summary: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }

    fn into_case(self) -> StorageResult<Case> {
        Ok(Case {
            id: CaseId::new(self.id),
            case_name: self.case_name,
            client_name: self.client_name,
            status: self.status,
            date_opened: parse_timestamp(&self.date_opened)?,
            summary: self.summary,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

/// Raw column values of a document row
struct DocumentRow {
    id: i64,
    case_id: i64,
    document_name: String,
    storage_path: Option<String>,
    event_date: Option<String>,
    document_type: Option<String>,
    ai_analysis: Option<String>,
    created_at: String,
    updated_at: String,
}

impl DocumentRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            case_id: row.get(1)?,
            document_name: row.get(2)?,
            storage_path: row.get(3)?,
            event_date: row.get(4)?,
            document_type: row.get(5)?,
            ai_analysis: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
        })
    }

    fn into_document(self) -> StorageResult<Document> {
        let event_date = self
            .event_date
            .as_deref()
            .map(|s| {
                NaiveDate::parse_from_str(s, EVENT_DATE_FORMAT)
                    .map_err(|e| StorageError::DateParse(format!("{}: {}", s, e)))
            })
            .transpose()?;
        let ai_analysis = self
            .ai_analysis
            .as_deref()
            .map(serde_json::from_str::<Analysis>)
            .transpose()?;

        Ok(Document {
            id: DocumentId::new(self.id),
            case_id: CaseId::new(self.case_id),
            document_name: self.document_name,
            storage_path: self.storage_path,
            event_date,
            document_type: self.document_type,
            ai_analysis,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

/// Fixed-precision UTC form, so lexical order in SQL matches time order
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(s: &str) -> StorageResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StorageError::DateParse(format!("{}: {}", s, e)))
}

fn format_event_date(date: &NaiveDate) -> String {
    date.format(EVENT_DATE_FORMAT).to_string()
}

/// Clamp an unsigned window bound into SQLite's signed integer range
fn sql_int(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

impl SqliteStore {
    /// Initialize the database schema
    fn init_schema(conn: &Connection) -> StorageResult<()> {
        conn.execute_batch(
            r#"
            -- Cases table (folded columns back case-insensitive search)
            CREATE TABLE IF NOT EXISTS cases (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                case_name TEXT NOT NULL,
                client_name TEXT NOT NULL,
                status TEXT NOT NULL,
                date_opened TEXT NOT NULL,
                summary TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                name_folded TEXT NOT NULL,
                client_folded TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_cases_created
                ON cases(created_at, id);
            CREATE INDEX IF NOT EXISTS idx_cases_status
                ON cases(status);

            -- Documents table
            CREATE TABLE IF NOT EXISTS documents (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                case_id INTEGER NOT NULL,
                document_name TEXT NOT NULL,
                storage_path TEXT,
                event_date TEXT,
                document_type TEXT,
                ai_analysis TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY (case_id) REFERENCES cases(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_documents_case
                ON documents(case_id);

            -- Enable foreign keys
            PRAGMA foreign_keys = ON;

            -- Enable WAL mode for concurrent reads during writes
            PRAGMA journal_mode = WAL;
            "#,
        )?;

        Ok(())
    }

    fn from_connection(conn: Connection) -> StorageResult<Self> {
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the connection. A panic on another thread never leaves a
    /// half-applied write behind (transactions roll back on drop), so a
    /// poisoned lock is safe to reuse.
    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn load_case(conn: &Connection, id: CaseId) -> StorageResult<Option<Case>> {
        let sql = format!("SELECT {} FROM cases c WHERE c.id = ?1", CASE_COLUMNS);
        conn.query_row(&sql, params![id.get()], CaseRow::read)
            .optional()?
            .map(CaseRow::into_case)
            .transpose()
    }

    fn load_document(conn: &Connection, id: DocumentId) -> StorageResult<Option<Document>> {
        let sql = format!("SELECT {} FROM documents d WHERE d.id = ?1", DOCUMENT_COLUMNS);
        conn.query_row(&sql, params![id.get()], DocumentRow::read)
            .optional()?
            .map(DocumentRow::into_document)
            .transpose()
    }

    fn case_exists(conn: &Connection, id: CaseId) -> StorageResult<bool> {
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM cases WHERE id = ?1)",
            params![id.get()],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    fn load_timeline(conn: &Connection, case_id: CaseId) -> StorageResult<Vec<Document>> {
        let sql = format!(
            r#"
            SELECT {} FROM documents d
            WHERE d.case_id = ?1
            ORDER BY d.event_date IS NULL, d.event_date ASC, d.created_at ASC, d.id ASC
            "#,
            DOCUMENT_COLUMNS
        );
        Self::collect_documents(conn, &sql, params![case_id.get()])
    }

    fn collect_documents(
        conn: &Connection,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> StorageResult<Vec<Document>> {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
            .query_map(params, DocumentRow::read)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(DocumentRow::into_document).collect()
    }
}

impl OpenStore for SqliteStore {
    fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        Self::from_connection(Connection::open(path)?)
    }

    fn open_in_memory() -> StorageResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }
}

impl CaseStore for SqliteStore {
    // === Case Operations ===

    fn create_case(&self, new: &NewCase) -> StorageResult<Case> {
        let case_name = required_text("case name", &new.case_name)?;
        let client_name = required_text("client name", &new.client_name)?;
        let status = match new.status.as_deref() {
            Some(status) => required_text("status", status)?,
            None => DEFAULT_STATUS.to_string(),
        };
        let now = Utc::now();
        let date_opened = new.date_opened.unwrap_or(now);

        let conn = self.lock();
        conn.execute(
            r#"
            INSERT INTO cases (case_name, client_name, status, date_opened, summary,
                               created_at, updated_at, name_folded, client_folded)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6, ?7, ?8)
            "#,
            params![
                case_name,
                client_name,
                status,
                format_timestamp(&date_opened),
                new.summary,
                format_timestamp(&now),
                fold(&case_name),
                fold(&client_name),
            ],
        )?;
        let id = CaseId::new(conn.last_insert_rowid());
        debug!(case_id = %id, "inserted case");

        Self::load_case(&conn, id)?.ok_or(StorageError::CaseNotFound(id))
    }

    fn get_case(&self, id: CaseId) -> StorageResult<Option<Case>> {
        let conn = self.lock();
        Self::load_case(&conn, id)
    }

    fn update_case(&self, id: CaseId, update: &CaseUpdate) -> StorageResult<Case> {
        let case_name = update
            .case_name
            .as_deref()
            .map(|v| required_text("case name", v))
            .transpose()?;
        let client_name = update
            .client_name
            .as_deref()
            .map(|v| required_text("client name", v))
            .transpose()?;
        let status = update
            .status
            .as_deref()
            .map(|v| required_text("status", v))
            .transpose()?;

        let mut conn = self.lock();
        let tx = conn.transaction()?;
        let current = Self::load_case(&tx, id)?.ok_or(StorageError::CaseNotFound(id))?;

        let case_name = case_name.unwrap_or(current.case_name);
        let client_name = client_name.unwrap_or(current.client_name);
        let status = status.unwrap_or(current.status);
        let summary = match &update.summary {
            Some(summary) => summary.clone(),
            None => current.summary,
        };

        tx.execute(
            r#"
            UPDATE cases SET
                case_name = ?2,
                client_name = ?3,
                status = ?4,
                summary = ?5,
                updated_at = ?6,
                name_folded = ?7,
                client_folded = ?8
            WHERE id = ?1
            "#,
            params![
                id.get(),
                case_name,
                client_name,
                status,
                summary,
                format_timestamp(&Utc::now()),
                fold(&case_name),
                fold(&client_name),
            ],
        )?;
        let updated = Self::load_case(&tx, id)?.ok_or(StorageError::CaseNotFound(id))?;
        tx.commit()?;
        debug!(case_id = %id, "updated case");

        Ok(updated)
    }

    fn delete_case(&self, id: CaseId) -> StorageResult<usize> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;

        if !Self::case_exists(&tx, id)? {
            return Err(StorageError::CaseNotFound(id));
        }

        // The foreign key cascades as well; deleting explicitly keeps the
        // count exact and the removal inside this transaction.
        let documents = tx.execute("DELETE FROM documents WHERE case_id = ?1", params![id.get()])?;
        tx.execute("DELETE FROM cases WHERE id = ?1", params![id.get()])?;
        tx.commit()?;
        debug!(case_id = %id, documents, "deleted case");

        Ok(documents)
    }

    fn list_cases(&self, filter: &CaseFilter, limit: u64, offset: u64) -> StorageResult<CaseWindow> {
        let search = filter.folded_search();
        let status = filter.status.clone();
        let predicate = r#"
            (?1 IS NULL OR instr(c.name_folded, ?1) > 0 OR instr(c.client_folded, ?1) > 0)
            AND (?2 IS NULL OR c.status = ?2)
        "#;

        let mut conn = self.lock();
        // One read transaction so the window and the total agree
        let tx = conn.transaction()?;

        let total: i64 = tx.query_row(
            &format!("SELECT COUNT(*) FROM cases c WHERE {}", predicate),
            params![search, status],
            |row| row.get(0),
        )?;

        let sql = format!(
            r#"
            SELECT {},
                   (SELECT COUNT(*) FROM documents d WHERE d.case_id = c.id) AS document_count
            FROM cases c
            WHERE {}
            ORDER BY c.created_at DESC, c.id DESC
            LIMIT ?3 OFFSET ?4
            "#,
            CASE_COLUMNS, predicate
        );
        let rows = {
            let mut stmt = tx.prepare(&sql)?;
            let rows = stmt
                .query_map(
                    params![search, status, sql_int(limit), sql_int(offset)],
                    |row| Ok((CaseRow::read(row)?, row.get::<_, i64>(8)?)),
                )?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        };
        tx.commit()?;

        let items = rows
            .into_iter()
            .map(|(row, count)| {
                Ok(CaseSummary {
                    case: row.into_case()?,
                    document_count: u64::try_from(count).unwrap_or(0),
                })
            })
            .collect::<StorageResult<Vec<_>>>()?;

        Ok(CaseWindow {
            items,
            total: u64::try_from(total).unwrap_or(0),
        })
    }

    // === Document Operations ===

    fn create_document(&self, new: &NewDocument) -> StorageResult<Document> {
        let document_name = required_text("document name", &new.document_name)?;
        let now = format_timestamp(&Utc::now());

        let mut conn = self.lock();
        let tx = conn.transaction()?;

        if !Self::case_exists(&tx, new.case_id)? {
            return Err(StorageError::CaseNotFound(new.case_id));
        }

        tx.execute(
            r#"
            INSERT INTO documents (case_id, document_name, storage_path, event_date,
                                   document_type, ai_analysis, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, NULL, ?6, ?6)
            "#,
            params![
                new.case_id.get(),
                document_name,
                new.storage_path,
                new.event_date.as_ref().map(format_event_date),
                new.document_type,
                now,
            ],
        )?;
        let id = DocumentId::new(tx.last_insert_rowid());
        let document = Self::load_document(&tx, id)?.ok_or(StorageError::DocumentNotFound(id))?;
        tx.commit()?;
        debug!(document_id = %id, case_id = %new.case_id, "inserted document");

        Ok(document)
    }

    fn get_document(&self, id: DocumentId) -> StorageResult<Option<Document>> {
        let conn = self.lock();
        Self::load_document(&conn, id)
    }

    fn delete_document(&self, id: DocumentId) -> StorageResult<()> {
        let conn = self.lock();
        let deleted = conn.execute("DELETE FROM documents WHERE id = ?1", params![id.get()])?;
        if deleted == 0 {
            return Err(StorageError::DocumentNotFound(id));
        }
        debug!(document_id = %id, "deleted document");
        Ok(())
    }

    fn list_documents(&self, case_id: CaseId) -> StorageResult<Vec<Document>> {
        let conn = self.lock();
        Self::load_timeline(&conn, case_id)
    }

    fn get_case_with_documents(&self, id: CaseId) -> StorageResult<Option<(Case, Vec<Document>)>> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;

        let Some(case) = Self::load_case(&tx, id)? else {
            return Ok(None);
        };
        let documents = Self::load_timeline(&tx, id)?;
        tx.commit()?;

        Ok(Some((case, documents)))
    }

    fn list_pending_documents(&self, limit: u64) -> StorageResult<Vec<Document>> {
        let conn = self.lock();
        let sql = format!(
            r#"
            SELECT {} FROM documents d
            WHERE d.ai_analysis IS NULL
            ORDER BY d.created_at ASC, d.id ASC
            LIMIT ?1
            "#,
            DOCUMENT_COLUMNS
        );
        Self::collect_documents(&conn, &sql, params![sql_int(limit)])
    }

    fn update_document_analysis(&self, id: DocumentId, analysis: &Analysis) -> StorageResult<Document> {
        let analysis_json = serde_json::to_string(analysis)?;
        // An unclassified analysis never erases an existing classification
        let classified = (analysis.document_type != UNKNOWN_DOCUMENT_TYPE
            && !analysis.document_type.trim().is_empty())
        .then_some(analysis.document_type.as_str());

        let mut conn = self.lock();
        let tx = conn.transaction()?;
        let updated = tx.execute(
            r#"
            UPDATE documents SET
                ai_analysis = ?2,
                document_type = COALESCE(?3, document_type),
                updated_at = ?4
            WHERE id = ?1
            "#,
            params![id.get(), analysis_json, classified, format_timestamp(&Utc::now())],
        )?;
        if updated == 0 {
            return Err(StorageError::DocumentNotFound(id));
        }
        let document = Self::load_document(&tx, id)?.ok_or(StorageError::DocumentNotFound(id))?;
        tx.commit()?;
        debug!(document_id = %id, "replaced document analysis");

        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn create_test_store() -> SqliteStore {
        SqliteStore::open_in_memory().unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn test_analysis(summary: &str, document_type: &str) -> Analysis {
        Analysis {
            summary: summary.to_string(),
            key_facts: vec!["fact".to_string()],
            legal_citations: vec![],
            extracted_tables: vec![],
            document_type: document_type.to_string(),
            confidence_score: 0.8,
            processing_timestamp: Utc.with_ymd_and_hms(2024, 6, 1, 9, 30, 0).unwrap(),
            raw_response: None,
        }
    }

    #[test]
    fn test_create_case_applies_defaults() {
        let store = create_test_store();
        let case = store
            .create_case(&NewCase::new("Contract Dispute Resolution", "ABC Corporation"))
            .unwrap();

        assert_eq!(case.case_name, "Contract Dispute Resolution");
        assert_eq!(case.status, DEFAULT_STATUS);
        assert_eq!(case.summary, None);
        assert_eq!(case.created_at, case.updated_at);
        assert_eq!(case.date_opened, case.created_at);
    }

    #[test]
    fn test_create_case_rejects_empty_names() {
        let store = create_test_store();

        let err = store.create_case(&NewCase::new("", "Client")).unwrap_err();
        assert!(matches!(err, StorageError::Invalid(_)));

        let err = store.create_case(&NewCase::new("Name", "  ")).unwrap_err();
        assert!(matches!(err, StorageError::Invalid(_)));

        let window = store.list_cases(&CaseFilter::new(), 10, 0).unwrap();
        assert_eq!(window.total, 0, "rejected cases are not persisted");
    }

    #[test]
    fn test_update_case_bumps_updated_at() {
        let store = create_test_store();
        let case = store
            .create_case(&NewCase::new("Estate of Ruiz", "M. Ruiz").with_summary("Probate"))
            .unwrap();

        std::thread::sleep(std::time::Duration::from_millis(2));
        let updated = store
            .update_case(
                case.id,
                &CaseUpdate::new().with_status("Closed").with_summary(None),
            )
            .unwrap();

        assert_eq!(updated.status, "Closed");
        assert_eq!(updated.summary, None);
        assert_eq!(updated.case_name, "Estate of Ruiz");
        assert_eq!(updated.created_at, case.created_at);
        assert!(updated.updated_at > case.updated_at);
    }

    #[test]
    fn test_update_missing_case() {
        let store = create_test_store();
        let err = store
            .update_case(CaseId::new(99), &CaseUpdate::new().with_status("Closed"))
            .unwrap_err();
        assert!(matches!(err, StorageError::CaseNotFound(id) if id == CaseId::new(99)));
    }

    #[test]
    fn test_create_document_requires_case() {
        let store = create_test_store();
        let err = store
            .create_document(&NewDocument::new(CaseId::new(7), "orphan.pdf"))
            .unwrap_err();
        assert!(matches!(err, StorageError::CaseNotFound(_)));
    }

    #[test]
    fn test_save_and_load_document() {
        let store = create_test_store();
        let case = store.create_case(&NewCase::new("Case", "Client")).unwrap();

        let doc = store
            .create_document(
                &NewDocument::new(case.id, "Initial_Contract_2024.pdf")
                    .with_storage_path("uploads/1/contract.pdf")
                    .with_event_date(date(2024, 1, 15))
                    .with_document_type("contract"),
            )
            .unwrap();

        let loaded = store.get_document(doc.id).unwrap().unwrap();
        assert_eq!(loaded, doc);
        assert_eq!(loaded.event_date, Some(date(2024, 1, 15)));
        assert_eq!(loaded.storage_path.as_deref(), Some("uploads/1/contract.pdf"));
        assert!(!loaded.is_analyzed());
    }

    #[test]
    fn test_delete_case_cascades_documents() {
        let store = create_test_store();
        let case = store.create_case(&NewCase::new("Case", "Client")).unwrap();
        let other = store.create_case(&NewCase::new("Other", "Client")).unwrap();

        let a = store.create_document(&NewDocument::new(case.id, "a.pdf")).unwrap();
        let b = store.create_document(&NewDocument::new(case.id, "b.pdf")).unwrap();
        let kept = store.create_document(&NewDocument::new(other.id, "c.pdf")).unwrap();

        let removed = store.delete_case(case.id).unwrap();
        assert_eq!(removed, 2);

        assert!(store.get_case(case.id).unwrap().is_none());
        assert!(store.get_document(a.id).unwrap().is_none());
        assert!(store.get_document(b.id).unwrap().is_none());
        assert!(store.get_document(kept.id).unwrap().is_some());

        let err = store.delete_case(case.id).unwrap_err();
        assert!(matches!(err, StorageError::CaseNotFound(_)));
    }

    #[test]
    fn test_documents_in_timeline_order() {
        let store = create_test_store();
        let case = store.create_case(&NewCase::new("Case", "Client")).unwrap();

        store
            .create_document(&NewDocument::new(case.id, "march").with_event_date(date(2024, 3, 1)))
            .unwrap();
        store.create_document(&NewDocument::new(case.id, "undated")).unwrap();
        store
            .create_document(&NewDocument::new(case.id, "january").with_event_date(date(2024, 1, 15)))
            .unwrap();
        store
            .create_document(&NewDocument::new(case.id, "march-later").with_event_date(date(2024, 3, 1)))
            .unwrap();

        let names: Vec<_> = store
            .list_documents(case.id)
            .unwrap()
            .into_iter()
            .map(|d| d.document_name)
            .collect();
        assert_eq!(names, vec!["january", "march", "march-later", "undated"]);
    }

    #[test]
    fn test_case_with_documents_reads_one_snapshot() {
        let store = create_test_store();
        let case = store.create_case(&NewCase::new("Case", "Client")).unwrap();
        store
            .create_document(&NewDocument::new(case.id, "later").with_event_date(date(2024, 5, 2)))
            .unwrap();
        store
            .create_document(&NewDocument::new(case.id, "earlier").with_event_date(date(2024, 2, 9)))
            .unwrap();

        let (loaded, documents) = store.get_case_with_documents(case.id).unwrap().unwrap();
        assert_eq!(loaded, case);
        let names: Vec<_> = documents.iter().map(|d| d.document_name.as_str()).collect();
        assert_eq!(names, vec!["earlier", "later"]);

        store.delete_case(case.id).unwrap();
        assert!(store.get_case_with_documents(case.id).unwrap().is_none());
    }

    #[test]
    fn test_analysis_replaced_wholesale() {
        let store = create_test_store();
        let case = store.create_case(&NewCase::new("Case", "Client")).unwrap();
        let doc = store.create_document(&NewDocument::new(case.id, "a.pdf")).unwrap();

        let mut first = test_analysis("First pass.", "contract");
        first.legal_citations = vec!["UCC 2-207".to_string()];
        store.update_document_analysis(doc.id, &first).unwrap();

        let second = test_analysis("Second pass.", "motion");
        let stored = store.update_document_analysis(doc.id, &second).unwrap();

        assert_eq!(stored.ai_analysis, Some(second));
        assert_eq!(stored.document_type.as_deref(), Some("motion"));
    }

    #[test]
    fn test_analysis_write_bumps_updated_at() {
        let store = create_test_store();
        let case = store.create_case(&NewCase::new("Case", "Client")).unwrap();
        let doc = store.create_document(&NewDocument::new(case.id, "a.pdf")).unwrap();

        // Timestamps are stored at microsecond precision
        std::thread::sleep(std::time::Duration::from_millis(2));
        let before_write = Utc::now();
        let stored = store
            .update_document_analysis(doc.id, &test_analysis("Read.", "brief"))
            .unwrap();

        assert!(stored.updated_at > doc.updated_at);
        assert!(stored.updated_at >= before_write - chrono::Duration::microseconds(1));
        assert_eq!(stored.created_at, doc.created_at);
    }

    #[test]
    fn test_unknown_analysis_type_keeps_document_type() {
        let store = create_test_store();
        let case = store.create_case(&NewCase::new("Case", "Client")).unwrap();
        let doc = store
            .create_document(&NewDocument::new(case.id, "a.pdf").with_document_type("brief"))
            .unwrap();

        let stored = store
            .update_document_analysis(doc.id, &test_analysis("Unclear.", UNKNOWN_DOCUMENT_TYPE))
            .unwrap();
        assert_eq!(stored.document_type.as_deref(), Some("brief"));
    }

    #[test]
    fn test_update_analysis_of_missing_document() {
        let store = create_test_store();
        let err = store
            .update_document_analysis(DocumentId::new(5), &test_analysis("x", "brief"))
            .unwrap_err();
        assert!(matches!(err, StorageError::DocumentNotFound(_)));
    }

    #[test]
    fn test_degraded_analysis_keeps_raw_response_verbatim() {
        let store = create_test_store();
        let case = store.create_case(&NewCase::new("Case", "Client")).unwrap();
        let doc = store.create_document(&NewDocument::new(case.id, "a.pdf")).unwrap();

        let raw = "I'm sorry, I can't produce \"JSON\" for this.\n\t{ broken";
        let mut degraded = test_analysis("Could not structure.", UNKNOWN_DOCUMENT_TYPE);
        degraded.raw_response = Some(raw.to_string());
        store.update_document_analysis(doc.id, &degraded).unwrap();

        let loaded = store.get_document(doc.id).unwrap().unwrap();
        let analysis = loaded.ai_analysis.unwrap();
        assert_eq!(analysis.raw_response.as_deref(), Some(raw));
    }

    #[test]
    fn test_list_cases_counts_documents_live() {
        let store = create_test_store();
        let case = store.create_case(&NewCase::new("Case", "Client")).unwrap();
        let doc = store.create_document(&NewDocument::new(case.id, "a.pdf")).unwrap();
        store.create_document(&NewDocument::new(case.id, "b.pdf")).unwrap();

        let window = store.list_cases(&CaseFilter::new(), 10, 0).unwrap();
        assert_eq!(window.items[0].document_count, 2);

        store.delete_document(doc.id).unwrap();
        let window = store.list_cases(&CaseFilter::new(), 10, 0).unwrap();
        assert_eq!(window.items[0].document_count, 1);
    }

    #[test]
    fn test_list_cases_search_is_case_insensitive() {
        let store = create_test_store();
        store.create_case(&NewCase::new("Acme v. Widget", "Widget LLC")).unwrap();
        store.create_case(&NewCase::new("Lease Review", "ACME Holdings")).unwrap();
        store.create_case(&NewCase::new("Lease Review", "Zenith")).unwrap();
        store.create_case(&NewCase::new("Müller Estate", "Ö. Müller")).unwrap();

        let window = store
            .list_cases(&CaseFilter::new().with_search("acme"), 10, 0)
            .unwrap();
        assert_eq!(window.total, 2);

        let window = store
            .list_cases(&CaseFilter::new().with_search("MÜLLER"), 10, 0)
            .unwrap();
        assert_eq!(window.total, 1);
    }

    #[test]
    fn test_list_cases_search_treats_wildcards_literally() {
        let store = create_test_store();
        store.create_case(&NewCase::new("100% Recovery", "Client")).unwrap();
        store.create_case(&NewCase::new("Ordinary", "Client")).unwrap();

        let window = store
            .list_cases(&CaseFilter::new().with_search("%"), 10, 0)
            .unwrap();
        assert_eq!(window.total, 1);
    }

    #[test]
    fn test_list_pending_documents() {
        let store = create_test_store();
        let case = store.create_case(&NewCase::new("Case", "Client")).unwrap();
        let a = store.create_document(&NewDocument::new(case.id, "a.pdf")).unwrap();
        let b = store.create_document(&NewDocument::new(case.id, "b.pdf")).unwrap();

        store
            .update_document_analysis(a.id, &test_analysis("Done.", "brief"))
            .unwrap();

        let pending = store.list_pending_documents(10).unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, b.id);
    }

    #[test]
    fn test_wal_mode_enabled_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(dir.path().join("nested").join("cases.db")).unwrap();
        let mode: String = store
            .lock()
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();
        assert_eq!(mode, "wal");
    }

    #[test]
    fn test_reopen_preserves_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cases.db");

        let case_id = {
            let store = SqliteStore::open(&path).unwrap();
            let case = store.create_case(&NewCase::new("Persisted", "Client")).unwrap();
            store
                .create_document(&NewDocument::new(case.id, "a.pdf"))
                .unwrap();
            case.id
        };

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.get_case(case_id).unwrap().unwrap().case_name, "Persisted");
        assert_eq!(store.list_documents(case_id).unwrap().len(), 1);
    }
}
