// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! PokéAPI client

use rand::Rng;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::{DatavaultError, Result};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NamedResource {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PokemonType {
    pub slot: u32,
    #[serde(rename = "type")]
    pub kind: NamedResource,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sprites {
    #[serde(default)]
    pub front_default: Option<String>,
}

/// The subset of `/pokemon/{id}` the dashboard shows
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pokemon {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub height: u32,
    #[serde(default)]
    pub weight: u32,
    #[serde(default)]
    pub types: Vec<PokemonType>,
    #[serde(default)]
    pub sprites: Sprites,
}

impl Pokemon {
    pub fn type_names(&self) -> Vec<&str> {
        self.types.iter().map(|t| t.kind.name.as_str()).collect()
    }
}

pub struct PokeApiClient {
    client: Client,
    base_url: String,
}

impl PokeApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Look a Pokémon up by name or national dex number
    pub async fn fetch(&self, name_or_id: &str) -> Result<Pokemon> {
        let key = name_or_id.trim().to_lowercase();
        if key.is_empty() {
            return Err(DatavaultError::NotFound("empty Pokémon query".to_string()));
        }

        let url = format!("{}/pokemon/{}", self.base_url, key);
        debug!("Fetching Pokémon: {}", key);

        let response = self.client.get(&url).send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => Err(DatavaultError::NotFound(format!("Pokémon '{}'", key))),
            status if !status.is_success() => Err(DatavaultError::Upstream {
                status: status.as_u16(),
                detail: format!("PokéAPI returned {}", status),
            }),
            _ => Ok(response.json().await?),
        }
    }
}

/// A random national dex number in `1..=max`
pub fn random_pokemon_id(max: u32) -> u32 {
    rand::thread_rng().gen_range(1..=max.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_id_in_range() {
        for _ in 0..500 {
            let id = random_pokemon_id(151);
            assert!((1..=151).contains(&id));
        }
        assert_eq!(random_pokemon_id(0), 1);
    }

    #[tokio::test]
    async fn test_fetch_lowercases_name() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/pokemon/pikachu")
            .with_status(200)
            .with_body(
                r#"{"id":25,"name":"pikachu","height":4,"weight":60,
                    "types":[{"slot":1,"type":{"name":"electric","url":"x"}}],
                    "sprites":{"front_default":"https://img/25.png"}}"#,
            )
            .create_async()
            .await;

        let client = PokeApiClient::new(&server.url()).unwrap();
        let pokemon = client.fetch(" Pikachu ").await.unwrap();
        assert_eq!(pokemon.id, 25);
        assert_eq!(pokemon.type_names(), vec!["electric"]);
    }

    #[tokio::test]
    async fn test_unknown_is_not_found() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/pokemon/missingno")
            .with_status(404)
            .with_body("Not Found")
            .create_async()
            .await;

        let client = PokeApiClient::new(&server.url()).unwrap();
        let err = client.fetch("missingno").await.unwrap_err();
        assert!(matches!(err, DatavaultError::NotFound(_)));
    }
}
