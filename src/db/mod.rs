pub mod store;
pub mod memory;
pub mod postgres;

pub use memory::InMemoryStore;
pub use postgres::{get_connection_pool, PgMatchStore};
pub use store::MatchStore;
