pub mod app;
pub mod cli;
pub mod config;
pub mod favourites;
pub mod logging;
pub mod output;
pub mod render;
pub mod runner;
pub mod search;
pub mod source;
pub mod store;

#[cfg(test)]
mod tests;
