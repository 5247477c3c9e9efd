// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! datavault: news search with a two-tier cache, a browser dashboard,
//! a cache monitor, repository housekeeping and a small LLM CLI.

pub mod api;
pub mod cache;
pub mod cleanup;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod error;
pub mod llm;
pub mod monitor;
pub mod news;
pub mod search;
pub mod web;

pub use config::AppConfig;
pub use error::{DatavaultError, Result};
