use crate::catalog::CatalogGateway;
use crate::model::{Book, BookDetails};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::instrument;

pub type Pool = SqlitePool;

pub async fn init_pool(database_url: &str) -> Result<Pool> {
    // Ensure the parent directory of a file-backed database exists.
    if let Some(path) = database_url
        .strip_prefix("sqlite://")
        .filter(|p| !p.starts_with(":memory:"))
    {
        if let Some(parent) = std::path::Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
        }
    }
    let pool = SqlitePool::connect(database_url).await?;
    // WAL and stricter durability.
    sqlx::query("PRAGMA journal_mode=WAL;")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA synchronous=FULL;")
        .execute(&pool)
        .await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &Pool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// SQLite-backed catalog. Common columns are relational; the
/// category-specific payload is stored as its serialized tagged form next
/// to an indexed `category` column.
#[derive(Debug, Clone)]
pub struct SqliteCatalog {
    pool: Pool,
}

impl SqliteCatalog {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    #[instrument(skip_all, fields(isbn = %book.isbn))]
    pub async fn add_book(&self, book: Book) -> Result<Book> {
        book.validate()?;
        if self.find_by_isbn(&book.isbn).await?.is_some() {
            return Err(anyhow!("isbn already exists: {}", book.isbn));
        }
        let details = serde_json::to_string(&book.details)?;
        let id: i64 = sqlx::query(
            "INSERT INTO books (isbn, title, author, category, stock, details) \
             VALUES (?, ?, ?, ?, ?, ?) RETURNING id",
        )
        .bind(&book.isbn)
        .bind(&book.title)
        .bind(&book.author)
        .bind(book.details.category())
        .bind(book.stock as i64)
        .bind(&details)
        .fetch_one(&self.pool)
        .await?
        .get("id");
        Ok(Book {
            id: Some(id),
            ..book
        })
    }

    pub async fn find_by_isbn(&self, isbn: &str) -> Result<Option<Book>> {
        let row = sqlx::query("SELECT * FROM books WHERE isbn = ?")
            .bind(isbn)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| book_from_row(&r)).transpose()
    }

    pub async fn find_all(&self) -> Result<Vec<Book>> {
        let rows = sqlx::query("SELECT * FROM books ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(book_from_row).collect()
    }

    pub async fn count(&self) -> Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

fn book_from_row(row: &SqliteRow) -> Result<Book> {
    let details: BookDetails = serde_json::from_str(row.get("details"))
        .context("corrupt details column")?;
    Ok(Book {
        id: Some(row.get("id")),
        isbn: row.get("isbn"),
        title: row.get("title"),
        author: row.get("author"),
        stock: row.get::<i64, _>("stock") as u32,
        details,
    })
}

#[async_trait]
impl CatalogGateway for SqliteCatalog {
    async fn list_all(&self) -> Result<Vec<Book>> {
        self.find_all().await
    }

    async fn upsert(&self, book: Book) -> Result<Book> {
        self.add_book(book).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup_catalog() -> SqliteCatalog {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        SqliteCatalog::new(pool)
    }

    fn computer_book(isbn: &str) -> Book {
        Book {
            id: None,
            isbn: isbn.into(),
            title: "Async Rust".into(),
            author: "N. Vats".into(),
            stock: 2,
            details: BookDetails::Computer {
                programming_language: "Rust".into(),
                framework: "tokio".into(),
                difficulty: "intermediate".into(),
            },
        }
    }

    #[tokio::test]
    async fn add_assigns_id_and_round_trips_details() {
        let catalog = setup_catalog().await;
        let saved = catalog.add_book(computer_book("978-1-11-111111-1")).await.unwrap();
        assert!(saved.id.is_some());

        let found = catalog
            .find_by_isbn("978-1-11-111111-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found, saved);
        assert_eq!(found.details.category(), "Computer");
    }

    #[tokio::test]
    async fn duplicate_isbn_rejected() {
        let catalog = setup_catalog().await;
        catalog.add_book(computer_book("978-1-11-111111-1")).await.unwrap();
        let err = catalog
            .add_book(computer_book("978-1-11-111111-1"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("isbn already exists"));
    }

    #[tokio::test]
    async fn invalid_book_rejected_before_insert() {
        let catalog = setup_catalog().await;
        let mut book = computer_book("978-1-11-111111-1");
        book.title = "".into();
        assert!(catalog.add_book(book).await.is_err());
        assert_eq!(catalog.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn find_all_preserves_insertion_order() {
        let catalog = setup_catalog().await;
        catalog.add_book(computer_book("978-1-11-111111-1")).await.unwrap();
        catalog.add_book(computer_book("978-2-22-222222-2")).await.unwrap();
        let all = catalog.find_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].isbn, "978-1-11-111111-1");
        assert_eq!(all[1].isbn, "978-2-22-222222-2");
    }
}
