mod columns;
pub mod connection;
pub mod matches;
pub mod players;
pub mod setup;

pub use connection::{create_memory_pool, create_pool, get_connection, DbConn, DbPool};
