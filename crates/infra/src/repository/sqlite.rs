//! SQLite-backed product repository.

use core::str::FromStr;
use std::path::Path;

use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteRow,
    SqliteSynchronous,
};
use sqlx::{Row, Sqlite};
use tokio::runtime::{Builder, Runtime};
use tracing::instrument;

use shelf_core::ProductId;
use shelf_products::{DATE_FORMAT, Price, Product, parse_start_date};

use super::{InsertMode, ProductRepository, repeated_name};
use crate::error::StoreError;

const CREATE_PRODUCTS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS products (
        seq        INTEGER PRIMARY KEY AUTOINCREMENT,
        id         TEXT NOT NULL UNIQUE,
        name       TEXT NOT NULL UNIQUE CHECK (length(trim(name)) > 0),
        price      TEXT NOT NULL,
        rating     INTEGER NOT NULL,
        start_date TEXT NOT NULL
    )
"#;

/// Product repository stored in a SQLite database.
///
/// The repository API is synchronous; it drives `sqlx` on its own current-thread tokio
/// runtime. Do not call it from inside another async runtime.
///
/// Insertion order is the `seq` column order. File databases use WAL journaling with
/// `synchronous=FULL`, so a write is durable once its method returns.
#[derive(Debug)]
pub struct SqliteProductRepository {
    runtime: Runtime,
    /// Single connection: all writes are serialized, and an in-memory database lives
    /// exactly as long as this connection.
    pool: SqlitePool,
    location: String,
}

impl SqliteProductRepository {
    /// Open (creating if missing) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Full);

        Self::connect(options, path.display().to_string())
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| map_sqlx_error("parse_options", e))?;

        Self::connect(options, "memory".to_string())
    }

    fn connect(options: SqliteConnectOptions, location: String) -> Result<Self, StoreError> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| StoreError::storage("start_runtime", e))?;

        let pool = runtime.block_on(async {
            let pool = SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await
                .map_err(|e| map_sqlx_error("connect", e))?;

            sqlx::query(CREATE_PRODUCTS_TABLE)
                .execute(&pool)
                .await
                .map_err(|e| map_sqlx_error("create_schema", e))?;

            Ok::<_, StoreError>(pool)
        })?;

        tracing::debug!(%location, "sqlite product repository opened");
        Ok(Self {
            runtime,
            pool,
            location,
        })
    }

    async fn insert_batch(&self, batch: &[Product], mode: InsertMode) -> Result<usize, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        if mode == InsertMode::OnlyIfEmpty && count_rows(&mut *tx).await? > 0 {
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error("rollback", e))?;
            return Ok(0);
        }

        for product in batch {
            let inserted = sqlx::query(
                r#"
                INSERT INTO products (id, name, price, rating, start_date)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )
            .bind(product.id_typed().to_string())
            .bind(product.name())
            .bind(product.price().amount().to_string())
            .bind(product.rating())
            .bind(product.start_date().format(DATE_FORMAT).to_string())
            .execute(&mut *tx)
            .await;

            if let Err(err) = inserted {
                tx.rollback()
                    .await
                    .map_err(|e| map_sqlx_error("rollback", e))?;
                return Err(if is_unique_violation(&err) {
                    StoreError::DuplicateName(product.name().to_string())
                } else {
                    map_sqlx_error("insert_product", err)
                });
            }
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        Ok(batch.len())
    }

    async fn delete_row(&self, index: usize) -> Result<Product, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let row = sqlx::query(
            r#"
            SELECT id, name, price, rating, start_date
            FROM products
            ORDER BY seq ASC
            LIMIT 1 OFFSET ?1
            "#,
        )
        .bind(i64::try_from(index).unwrap_or(i64::MAX))
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("select_product", e))?;

        let Some(row) = row else {
            let len = count_rows(&mut *tx).await?;
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error("rollback", e))?;
            return Err(StoreError::IndexOutOfRange { index, len });
        };

        let product = product_from_row(&row)?;

        sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(product.id_typed().to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_product", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        Ok(product)
    }
}

impl ProductRepository for SqliteProductRepository {
    #[instrument(skip(self), fields(location = %self.location))]
    fn list(&self) -> Result<Vec<Product>, StoreError> {
        let rows = self
            .runtime
            .block_on(
                sqlx::query(
                    r#"
                    SELECT id, name, price, rating, start_date
                    FROM products
                    ORDER BY seq ASC
                    "#,
                )
                .fetch_all(&self.pool),
            )
            .map_err(|e| map_sqlx_error("list_products", e))?;

        rows.iter().map(product_from_row).collect()
    }

    #[instrument(skip(self), fields(location = %self.location))]
    fn find_by_name(&self, name: &str) -> Result<Vec<Product>, StoreError> {
        let rows = self
            .runtime
            .block_on(
                sqlx::query(
                    r#"
                    SELECT id, name, price, rating, start_date
                    FROM products
                    WHERE name = ?1
                    ORDER BY seq ASC
                    "#,
                )
                .bind(name)
                .fetch_all(&self.pool),
            )
            .map_err(|e| map_sqlx_error("find_by_name", e))?;

        rows.iter().map(product_from_row).collect()
    }

    fn count(&self) -> Result<usize, StoreError> {
        self.runtime.block_on(count_rows(&self.pool))
    }

    #[instrument(skip(self, products), fields(location = %self.location, batch = products.len()))]
    fn insert(&self, products: Vec<Product>, mode: InsertMode) -> Result<usize, StoreError> {
        if let Some(name) = repeated_name(&products) {
            return Err(StoreError::DuplicateName(name.to_string()));
        }

        self.runtime.block_on(self.insert_batch(&products, mode))
    }

    #[instrument(skip(self), fields(location = %self.location))]
    fn delete_at(&self, index: usize) -> Result<Product, StoreError> {
        self.runtime.block_on(self.delete_row(index))
    }

    fn location(&self) -> String {
        self.location.clone()
    }
}

impl Drop for SqliteProductRepository {
    fn drop(&mut self) {
        // Close while the runtime is still alive so the WAL is checkpointed cleanly.
        self.runtime.block_on(self.pool.close());
    }
}

async fn count_rows<'e, E>(executor: E) -> Result<usize, StoreError>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query("SELECT COUNT(*) AS total FROM products")
        .fetch_one(executor)
        .await
        .map_err(|e| map_sqlx_error("count_products", e))?;

    let total: i64 = row
        .try_get("total")
        .map_err(|e| map_sqlx_error("count_products", e))?;

    usize::try_from(total).map_err(StoreError::corrupt)
}

fn product_from_row(row: &SqliteRow) -> Result<Product, StoreError> {
    let id: String = row.try_get("id").map_err(|e| map_sqlx_error("decode_row", e))?;
    let name: String = row.try_get("name").map_err(|e| map_sqlx_error("decode_row", e))?;
    let price: String = row.try_get("price").map_err(|e| map_sqlx_error("decode_row", e))?;
    let rating: i32 = row.try_get("rating").map_err(|e| map_sqlx_error("decode_row", e))?;
    let start_date: String = row
        .try_get("start_date")
        .map_err(|e| map_sqlx_error("decode_row", e))?;

    let id = ProductId::from_str(&id).map_err(StoreError::corrupt)?;
    let price: Price = price.parse().map_err(StoreError::corrupt)?;
    let start_date = parse_start_date(&start_date).map_err(StoreError::corrupt)?;

    Product::with_id(id, name, price, rating, start_date).map_err(StoreError::corrupt)
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

fn map_sqlx_error(operation: &'static str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => StoreError::Storage {
            operation,
            message: format!("database error: {}", db_err.message()),
        },
        other => StoreError::storage(operation, other),
    }
}
