pub mod check_dups;
pub mod db;
pub mod ingest;
pub mod server;
