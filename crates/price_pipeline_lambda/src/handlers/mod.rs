pub mod ingest;
pub mod predict;
pub mod response;
