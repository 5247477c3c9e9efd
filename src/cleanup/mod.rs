// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Repository housekeeping: rule-based file moves with undo, and
//! duplicate collection removal

pub mod config;
pub mod dedupe;
pub mod journal;
pub mod planner;

pub use config::{CleanupConfig, FileMapping};
pub use dedupe::{dedupe_collections, DedupeReport};
pub use journal::{Journal, JournalEntry};
pub use planner::{execute, plan, undo, CleanupPlan, ExecutionReport, PlannedMove, SkipReason, UndoReport};
