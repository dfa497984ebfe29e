pub mod app;
pub mod cli;
pub mod debug_hooks;
pub mod error;
pub mod export;
pub mod feed;
pub mod model;
pub mod persist;
pub mod view;
