// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! News search client side: API client, debouncing, history and session state

pub mod client;
pub mod debounce;
pub mod history;
pub mod session;

pub use client::SearchApiClient;
pub use debounce::Debouncer;
pub use history::{SearchHistory, SearchHistoryEntry, MAX_HISTORY};
pub use session::{SearchSession, SearchState};
