pub mod cleanup;
pub mod commands;
pub mod config;
pub mod download;
pub mod error;
pub mod http;
pub mod launcher;
pub mod package;
pub mod platform;
pub mod runtime;
