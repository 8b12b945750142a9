//! Axles - commercial truck and trailer marketplace data acquisition.
//!
//! A tool for discovering product pages on manufacturer and dealer sites,
//! extracting raw specification tables, normalizing them into a fixed
//! product schema, and maintaining the marketplace tables the data feeds.

pub mod cli;
pub mod config;
pub mod discovery;
pub mod models;
pub mod normalize;
pub mod repository;
pub mod scrapers;
pub mod services;
pub mod storage;
pub mod utils;
