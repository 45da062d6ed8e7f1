pub mod config;
pub mod ingest;
pub mod load;
pub mod read;
pub mod schema;
pub mod verify;

#[cfg(test)]
pub(crate) mod testing;
