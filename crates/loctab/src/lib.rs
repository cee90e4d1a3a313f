//! Command line access to compressed localized string tables.

pub mod commands;
