pub mod readings_store;
pub mod statistics;

#[cfg(test)]
mod pg_tests;
