pub mod application;
pub mod commands;
pub mod error;
pub mod forge;
pub mod http;
pub mod package;
pub mod platform;
pub mod runtime;
pub mod search_path;
pub mod vcs;
