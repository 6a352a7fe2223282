/// Database layer
///
/// - `pool`: PostgreSQL connection pool with a startup health check
/// - `migrations`: Embedded schema migrations
///
/// Entity queries live next to their types in the `models` module.

pub mod migrations;
pub mod pool;
