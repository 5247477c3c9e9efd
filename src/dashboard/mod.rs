// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Browser dashboard: Pokémon lookup, news browsing and the cache monitor page

pub mod pokemon;
pub mod templates;

pub use pokemon::{random_pokemon_id, PokeApiClient, Pokemon};
pub use templates::{environment, render_dashboard, render_monitor};
