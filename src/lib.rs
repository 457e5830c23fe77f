pub mod broadcast;
pub mod clock;
pub mod config;
pub mod error;
pub mod log;
pub mod message;
pub mod registry;
pub mod routes;
pub mod scheduler;
#[cfg(test)]
pub mod test_utils;
pub mod ws;
