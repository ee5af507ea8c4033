pub mod app;
pub mod cli;
pub mod config;
pub mod export;
pub mod store;
pub mod view;

#[cfg(test)]
mod tests;
