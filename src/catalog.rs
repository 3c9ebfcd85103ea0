use crate::model::Book;
use anyhow::Result;
use async_trait::async_trait;

/// The catalog as the backup core sees it. The surrounding application owns
/// the real store; the orchestrator only reads the full record list and
/// replays records back through `upsert`.
#[async_trait]
pub trait CatalogGateway: Send + Sync {
    async fn list_all(&self) -> Result<Vec<Book>>;

    /// Persist one record and return it with its assigned id. Fails when
    /// the catalog rejects the record, e.g. a duplicate isbn.
    async fn upsert(&self, book: Book) -> Result<Book>;
}
