pub mod catalog;
pub mod model;
pub mod query;
pub mod repo;
pub mod sqlite;

pub use catalog::Catalog;
pub use model::*;
pub use repo::*;
pub use sqlite::SqliteRepository;
