pub mod daily;
pub mod ingest;
pub mod operator;
pub mod report;
pub mod resolve;
