// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Response cache: memory tier, filesystem tier and statistics

pub mod memory;
pub mod service;
pub mod stats;
pub mod storage;

pub use service::{open, CacheService, HEADLINES, SEARCH};
