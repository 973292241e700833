use anyhow::Result;
use serde_json::{Map, Value};
use sqlx::sqlite::{SqliteArguments, SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{query::Query, Row, Sqlite, SqlitePool};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// A stored document: a JSON object whose `id` key is owned by the store.
pub type Document = Map<String, Value>;

pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

lazy_static::lazy_static! {
    static ref FIELD_NAME: regex::Regex = regex::Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionName {
    Admins,
    Projects,
    Experiences,
    Skills,
}

impl CollectionName {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionName::Admins => "admins",
            CollectionName::Projects => "projects",
            CollectionName::Experiences => "experiences",
            CollectionName::Skills => "skills",
        }
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Invalid document id: {0}")]
    InvalidId(String),
    #[error("Invalid field name: {0}")]
    InvalidField(String),
    #[error("Document must be a JSON object")]
    NotAnObject,
    #[error("Duplicate key")]
    Duplicate,
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Malformed document: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Equality filters on top-level fields plus sort keys, applied in order.
/// Without sort keys documents come back newest-inserted first.
#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    filters: Vec<(String, Value)>,
    sort: Vec<(String, SortOrder)>,
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters.push((field.to_string(), value.into()));
        self
    }

    pub fn sort(mut self, field: &str, order: SortOrder) -> Self {
        self.sort.push((field.to_string(), order));
        self
    }
}

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await?;

        // Run migrations
        MIGRATOR.run(&pool).await?;

        Ok(Self { pool })
    }

    /// Wraps an already migrated pool.
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn collection(&self, name: CollectionName) -> Collection {
        Collection { pool: self.pool.clone(), name }
    }

    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Handle on one named collection of the document store.
#[derive(Clone)]
pub struct Collection {
    pool: SqlitePool,
    name: CollectionName,
}

impl Collection {
    /// Inserts a document and returns the id the store assigned to it.
    pub async fn insert(&self, mut doc: Document) -> Result<String, StoreError> {
        doc.remove("id");
        let id = Uuid::new_v4().to_string();
        let sql = format!("INSERT INTO {} (id, doc) VALUES (?, ?)", self.name.as_str());

        sqlx::query(&sql)
            .bind(&id)
            .bind(Value::Object(doc).to_string())
            .execute(&self.pool)
            .await
            .map_err(map_write_error)?;

        Ok(id)
    }

    pub async fn find(&self, options: &FindOptions) -> Result<Vec<Document>, StoreError> {
        let mut sql = format!("SELECT id, doc FROM {}", self.name.as_str());
        let mut params: Vec<Value> = Vec::new();

        if !options.filters.is_empty() {
            let clauses: Vec<&str> = options.filters.iter().map(|_| "json_extract(doc, ?) = ?").collect();
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
            for (field, value) in &options.filters {
                params.push(Value::String(json_path(field)?));
                params.push(value.clone());
            }
        }

        sql.push_str(" ORDER BY ");
        for (field, order) in &options.sort {
            sql.push_str(match order {
                SortOrder::Asc => "json_extract(doc, ?) ASC, ",
                SortOrder::Desc => "json_extract(doc, ?) DESC, ",
            });
            params.push(Value::String(json_path(field)?));
        }
        sql.push_str("rowid DESC");

        let query = params.iter().fold(sqlx::query(&sql), bind_value);
        let rows = query.fetch_all(&self.pool).await?;
        rows.iter().map(row_to_document).collect()
    }

    pub async fn find_one(&self, field: &str, value: impl Into<Value>) -> Result<Option<Document>, StoreError> {
        let mut docs = self.find(&FindOptions::new().filter(field, value)).await?;
        Ok(if docs.is_empty() { None } else { Some(docs.remove(0)) })
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Document>, StoreError> {
        let id = parse_id(id)?;
        let sql = format!("SELECT id, doc FROM {} WHERE id = ?", self.name.as_str());

        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;
        row.as_ref().map(row_to_document).transpose()
    }

    /// Replaces the whole document. Returns false when no document has this id.
    pub async fn replace(&self, id: &str, mut doc: Document) -> Result<bool, StoreError> {
        let id = parse_id(id)?;
        doc.remove("id");
        let sql = format!("UPDATE {} SET doc = ? WHERE id = ?", self.name.as_str());

        let result = sqlx::query(&sql)
            .bind(Value::Object(doc).to_string())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_write_error)?;

        Ok(result.rows_affected() > 0)
    }

    /// Merges `fields` into the stored document in a single statement.
    /// A `null` value removes that field.
    pub async fn update_fields(&self, id: &str, mut fields: Document) -> Result<bool, StoreError> {
        let id = parse_id(id)?;
        fields.remove("id");
        let sql = format!("UPDATE {} SET doc = json_patch(doc, ?) WHERE id = ?", self.name.as_str());

        let result = sqlx::query(&sql)
            .bind(Value::Object(fields).to_string())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_write_error)?;

        Ok(result.rows_affected() > 0)
    }

    /// Applies each `(id, fields)` merge inside one transaction. Every id is
    /// checked before the first write, so a malformed id changes nothing.
    /// Returns how many documents were updated.
    pub async fn update_fields_many(&self, patches: Vec<(String, Document)>) -> Result<usize, StoreError> {
        let patches = patches
            .into_iter()
            .map(|(id, mut fields)| {
                fields.remove("id");
                Ok((parse_id(&id)?, fields))
            })
            .collect::<Result<Vec<_>, StoreError>>()?;
        let sql = format!("UPDATE {} SET doc = json_patch(doc, ?) WHERE id = ?", self.name.as_str());

        let mut tx = self.pool.begin().await?;
        let mut updated = 0;
        for (id, fields) in patches {
            let result = sqlx::query(&sql)
                .bind(Value::Object(fields).to_string())
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(map_write_error)?;
            if result.rows_affected() > 0 {
                updated += 1;
            }
        }
        tx.commit().await?;

        Ok(updated)
    }

    pub async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let id = parse_id(id)?;
        let sql = format!("DELETE FROM {} WHERE id = ?", self.name.as_str());

        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn count(&self) -> Result<i64, StoreError> {
        let sql = format!("SELECT COUNT(*) FROM {}", self.name.as_str());
        let count = sqlx::query_scalar::<_, i64>(&sql).fetch_one(&self.pool).await?;
        Ok(count)
    }
}

fn parse_id(id: &str) -> Result<String, StoreError> {
    Uuid::parse_str(id)
        .map(|uuid| uuid.to_string())
        .map_err(|_| StoreError::InvalidId(id.to_string()))
}

fn json_path(field: &str) -> Result<String, StoreError> {
    if !FIELD_NAME.is_match(field) {
        return Err(StoreError::InvalidField(field.to_string()));
    }
    Ok(format!("$.{}", field))
}

fn bind_value<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: &Value,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    // json_extract yields 1/0 for booleans and native numbers/strings otherwise
    match value {
        Value::Bool(b) => query.bind(*b),
        Value::Number(n) if n.is_i64() => query.bind(n.as_i64()),
        Value::Number(n) => query.bind(n.as_f64()),
        Value::String(s) => query.bind(s.clone()),
        Value::Null => query.bind(None::<String>),
        other => query.bind(other.to_string()),
    }
}

fn row_to_document(row: &SqliteRow) -> Result<Document, StoreError> {
    let id: String = row.try_get("id")?;
    let raw: String = row.try_get("doc")?;

    match serde_json::from_str::<Value>(&raw)? {
        Value::Object(mut doc) => {
            doc.insert("id".to_string(), Value::String(id));
            Ok(doc)
        }
        _ => Err(StoreError::NotAnObject),
    }
}

fn map_write_error(error: sqlx::Error) -> StoreError {
    match &error {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Duplicate,
        _ => StoreError::Database(error),
    }
}
