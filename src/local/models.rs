//! Cached entities
//!
//! Rows the cache stores, derived from remote payloads. Every entity is keyed
//! by the Pokémon's numeric id (or, for evolution chains, the chain URL) so
//! that saving is an upsert.

use crate::remote::{
    ChainLink, EvolutionChainRemote, NamedResource, PokemonDetailRemote, PokemonSpeciesRemote,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const ARTWORK_BASE_URL: &str =
    "https://raw.githubusercontent.com/PokeAPI/sprites/master/sprites/pokemon/other/official-artwork";

/// Official artwork URL for a Pokémon id
pub fn artwork_url(id: u32) -> String {
    format!("{ARTWORK_BASE_URL}/{id}.png")
}

/// One row of the browsable list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PokemonEntity {
    pub id: u32,
    pub name: String,
    pub url: String,
    pub image_url: String,
}

impl PokemonEntity {
    /// Build a list row from the list summary and its fetched detail
    pub fn from_remote(summary: &NamedResource, detail: &PokemonDetailRemote) -> Self {
        let image_url = detail
            .sprites
            .best_url()
            .map_or_else(|| artwork_url(detail.id), ToString::to_string);

        Self {
            id: detail.id,
            name: summary.name.clone(),
            url: summary.url.clone(),
            image_url,
        }
    }

    /// Pokédex number as shown to users (`#025`)
    pub fn id_formatted(&self) -> String {
        format!("#{:03}", self.id)
    }

    /// Name with the first letter of each dash-separated word capitalised
    pub fn display_name(&self) -> String {
        title_case(&self.name)
    }
}

fn title_case(name: &str) -> String {
    name.split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Persisted pagination cursor for one cached Pokémon
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteKey {
    pub pokemon_id: u32,
    /// Offset of the page before the one this Pokémon arrived in
    pub prev_offset: Option<u32>,
    /// Offset of the page after; `None` once the list is exhausted
    pub next_offset: Option<u32>,
    pub created_at: DateTime<Utc>,
}

impl RemoteKey {
    pub fn new(pokemon_id: u32, prev_offset: Option<u32>, next_offset: Option<u32>) -> Self {
        Self {
            pokemon_id,
            prev_offset,
            next_offset,
            created_at: Utc::now(),
        }
    }
}

/// Base stat value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PokemonStat {
    pub name: String,
    pub base_stat: u32,
}

/// Detail row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PokemonDetailEntity {
    pub pokemon_id: u32,
    pub height: u32,
    pub weight: u32,
    pub base_experience: Option<u32>,
    /// Type names ordered by slot
    pub types: Vec<String>,
    pub stats: Vec<PokemonStat>,
    pub sprite_url: Option<String>,
    pub species_name: String,
    pub species_url: String,
}

impl From<&PokemonDetailRemote> for PokemonDetailEntity {
    fn from(detail: &PokemonDetailRemote) -> Self {
        let mut slots: Vec<_> = detail.types.iter().collect();
        slots.sort_by_key(|slot| slot.slot);

        Self {
            pokemon_id: detail.id,
            height: detail.height,
            weight: detail.weight,
            base_experience: detail.base_experience,
            types: slots.iter().map(|slot| slot.kind.name.clone()).collect(),
            stats: detail
                .stats
                .iter()
                .map(|stat| PokemonStat {
                    name: stat.stat.name.clone(),
                    base_stat: stat.base_stat,
                })
                .collect(),
            sprite_url: detail.sprites.best_url().map(ToString::to_string),
            species_name: detail.species.name.clone(),
            species_url: detail.species.url.clone(),
        }
    }
}

/// Species row. Created bare from the detail's species link while paging and
/// enriched with flavor text and the evolution chain link on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PokemonSpeciesEntity {
    pub pokemon_id: u32,
    pub name: String,
    pub url: String,
    pub flavor_text: Option<String>,
    pub evolution_chain_url: Option<String>,
}

impl PokemonSpeciesEntity {
    /// Species link as carried by a detail payload
    pub fn from_detail(detail: &PokemonDetailRemote) -> Self {
        Self {
            pokemon_id: detail.id,
            name: detail.species.name.clone(),
            url: detail.species.url.clone(),
            flavor_text: None,
            evolution_chain_url: None,
        }
    }

    /// Species enriched from the species endpoint
    pub fn from_remote(
        pokemon_id: u32,
        url: impl Into<String>,
        species: &PokemonSpeciesRemote,
        language: &str,
    ) -> Self {
        Self {
            pokemon_id,
            name: species.name.clone(),
            url: url.into(),
            flavor_text: species.flavor_text(language),
            evolution_chain_url: species.evolution_chain.as_ref().map(|c| c.url.clone()),
        }
    }

    /// True once the species endpoint has been consulted
    pub fn is_enriched(&self) -> bool {
        self.flavor_text.is_some() || self.evolution_chain_url.is_some()
    }
}

/// One stage of an evolution chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvolutionStep {
    pub species_name: String,
    pub species_id: Option<u32>,
    pub image_url: Option<String>,
    pub min_level: Option<u32>,
    pub trigger: Option<String>,
}

impl EvolutionStep {
    pub fn display_name(&self) -> String {
        title_case(&self.species_name)
    }
}

impl From<&ChainLink> for EvolutionStep {
    fn from(link: &ChainLink) -> Self {
        let species_id = link.species.id();
        let detail = link.evolution_details.first();

        Self {
            species_name: link.species.name.clone(),
            species_id,
            image_url: species_id.map(artwork_url),
            min_level: detail.and_then(|d| d.min_level),
            trigger: detail.and_then(|d| d.trigger.as_ref().map(|t| t.name.clone())),
        }
    }
}

/// Flattened evolution chain, keyed by its URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvolutionChainEntity {
    pub url: String,
    pub id: u32,
    pub steps: Vec<EvolutionStep>,
}

impl EvolutionChainEntity {
    pub fn from_remote(url: impl Into<String>, chain: &EvolutionChainRemote) -> Self {
        Self {
            url: url.into(),
            id: chain.id,
            steps: chain
                .chain
                .flatten()
                .into_iter()
                .map(EvolutionStep::from)
                .collect(),
        }
    }
}

/// Everything the details view shows for one Pokémon
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PokemonAndDetail {
    pub pokemon: PokemonEntity,
    pub detail: PokemonDetailEntity,
    pub species: Option<PokemonSpeciesEntity>,
    pub evolution_chain: Option<EvolutionChainEntity>,
}
