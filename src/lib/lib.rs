//! A small RESTful todo service.
//!
//! Requests are routed by [`adapters::HttpServer`] to a [`core::TodoService`],
//! which validates input and performs one round-trip against an injected
//! [`storage::TodoStore`] (PostgreSQL, SQLite or in-memory).

pub mod adapters;
pub mod config;
pub mod core;
pub mod storage;

#[cfg(test)]
mod tests;
