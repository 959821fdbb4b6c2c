pub mod memory;
pub mod postgres;
pub mod store;

pub use memory::{CatalogSeed, InMemoryCatalog};
pub use postgres::{create_pool, PgCatalogStore};
#[cfg(test)]
pub use store::MockCatalogStore;
pub use store::CatalogStore;
