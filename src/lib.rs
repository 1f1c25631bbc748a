//! Cinebook - A movie ticket booking backend
//!
//! This library provides the core functionality for the Cinebook system.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
