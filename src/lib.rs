pub mod api;
pub mod client;
pub mod config;
pub mod control;
pub mod models;
pub mod query;
pub mod session;
pub mod views;

#[cfg(test)]
mod test_support;
