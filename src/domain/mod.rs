//! Domain types and DTOs

pub mod admin;
pub mod chat;
pub mod quotes;
