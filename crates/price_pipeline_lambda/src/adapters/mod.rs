pub mod alerts;
pub mod aws;
pub mod object_store;
pub mod record_table;
