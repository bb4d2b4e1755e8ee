pub mod blocking_queries;
pub mod schema;
