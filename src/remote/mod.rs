//! Remote data source module
//!
//! The I/O boundary towards PokeAPI. No business logic lives here: the paging
//! mediator and the details service decide what to fetch and what to keep.

mod models;
mod source;

pub use models::{
    ApiResource, ArtworkSprite, ChainLink, EvolutionChainRemote, EvolutionDetail,
    FlavorTextEntry, ListPokemonRemote, NamedResource, OtherSprites, PokemonDetailRemote,
    PokemonSpeciesRemote, Sprites, StatSlot, TypeSlot,
};
pub use source::{PokeApiDataSource, RemoteDataSource, DEFAULT_BASE_URL};
