pub mod aggregator;
pub mod cli;
pub mod config;
pub mod error;
pub mod github_client;
pub mod jira;
pub mod models;
pub mod slack;
pub mod summary;
pub mod window;

#[cfg(test)]
mod test_support;
