//! PokeAPI response shapes
//!
//! Only the fields the cache keeps are modelled; everything else in the
//! payload is ignored by serde.

use serde::{Deserialize, Serialize};

/// A `{ name, url }` reference, PokeAPI's universal link type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedResource {
    pub name: String,
    pub url: String,
}

impl NamedResource {
    /// Create a new named resource
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }

    /// Numeric id taken from the trailing path segment
    /// (`https://pokeapi.co/api/v2/pokemon/25/` -> `25`)
    pub fn id(&self) -> Option<u32> {
        self.url
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .and_then(|segment| segment.parse().ok())
    }
}

/// One page of `GET /pokemon?limit&offset`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListPokemonRemote {
    /// Total number of Pokémon on the server
    #[serde(default)]
    pub count: u32,
    /// URL of the next page, absent on the last one
    #[serde(default)]
    pub next: Option<String>,
    /// URL of the previous page, absent on the first one
    #[serde(default)]
    pub previous: Option<String>,
    #[serde(default)]
    pub results: Vec<NamedResource>,
}

/// `GET /pokemon/{id or name}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PokemonDetailRemote {
    pub id: u32,
    pub name: String,
    /// Decimetres
    #[serde(default)]
    pub height: u32,
    /// Hectograms
    #[serde(default)]
    pub weight: u32,
    #[serde(default)]
    pub base_experience: Option<u32>,
    #[serde(default)]
    pub stats: Vec<StatSlot>,
    #[serde(default)]
    pub types: Vec<TypeSlot>,
    #[serde(default)]
    pub sprites: Sprites,
    pub species: NamedResource,
}

/// Base stat entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatSlot {
    pub base_stat: u32,
    #[serde(default)]
    pub effort: u32,
    pub stat: NamedResource,
}

/// Type entry, ordered by `slot`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeSlot {
    pub slot: u32,
    #[serde(rename = "type")]
    pub kind: NamedResource,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sprites {
    #[serde(default)]
    pub front_default: Option<String>,
    #[serde(default)]
    pub other: OtherSprites,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtherSprites {
    #[serde(rename = "official-artwork", default)]
    pub official_artwork: Option<ArtworkSprite>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtworkSprite {
    #[serde(default)]
    pub front_default: Option<String>,
}

impl Sprites {
    /// Best available image: official artwork, then the default sprite
    pub fn best_url(&self) -> Option<&str> {
        self.other
            .official_artwork
            .as_ref()
            .and_then(|art| art.front_default.as_deref())
            .or(self.front_default.as_deref())
    }
}

/// `GET /pokemon-species/{name}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PokemonSpeciesRemote {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub flavor_text_entries: Vec<FlavorTextEntry>,
    #[serde(default)]
    pub evolution_chain: Option<ApiResource>,
    #[serde(default)]
    pub color: Option<NamedResource>,
}

impl PokemonSpeciesRemote {
    /// First flavor text in the given language, with the form feeds and hard
    /// line breaks PokeAPI carries over from the games flattened to spaces
    pub fn flavor_text(&self, language: &str) -> Option<String> {
        self.flavor_text_entries
            .iter()
            .find(|entry| entry.language.name == language)
            .map(|entry| {
                entry
                    .flavor_text
                    .split(|c: char| c.is_whitespace() || c == '\u{c}')
                    .filter(|word| !word.is_empty())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlavorTextEntry {
    pub flavor_text: String,
    pub language: NamedResource,
    #[serde(default)]
    pub version: Option<NamedResource>,
}

/// An unnamed `{ url }` reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResource {
    pub url: String,
}

/// `GET /evolution-chain/{id}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvolutionChainRemote {
    pub id: u32,
    pub chain: ChainLink,
}

/// One node of the evolution tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainLink {
    pub species: NamedResource,
    #[serde(default)]
    pub evolution_details: Vec<EvolutionDetail>,
    #[serde(default)]
    pub evolves_to: Vec<ChainLink>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvolutionDetail {
    #[serde(default)]
    pub min_level: Option<u32>,
    #[serde(default)]
    pub trigger: Option<NamedResource>,
}

impl ChainLink {
    /// Depth-first walk of the tree, parents before children
    pub fn flatten(&self) -> Vec<&ChainLink> {
        let mut out = vec![self];
        for child in &self.evolves_to {
            out.extend(child.flatten());
        }
        out
    }
}
