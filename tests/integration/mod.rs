//! Integration tests for the flat repository adapter

mod archive_content;
mod change_events;
mod cli_commands;
mod history_queries;
mod repository_listing;
mod support;
mod unsupported_operations;
