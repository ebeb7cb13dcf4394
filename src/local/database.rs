//! DuckDB-backed cache
//!
//! A single embedded database file (or an in-memory database for tests).
//! Each `save_all_*` batch runs in its own transaction and uses
//! `INSERT OR REPLACE`, so retries never duplicate rows. `save_page` wraps the
//! clear and all four batches of a page in one transaction. List-valued
//! columns are stored as JSON text.

use super::models::{
    EvolutionChainEntity, PokemonAndDetail, PokemonDetailEntity, PokemonEntity,
    PokemonSpeciesEntity, RemoteKey,
};
use super::store::{LocalDataSource, PageBatch};
use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use duckdb::{params, Connection};
use std::path::Path;
use std::sync::Mutex;
use tracing::debug;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS pokemon (
    id UINTEGER PRIMARY KEY,
    name VARCHAR NOT NULL,
    url VARCHAR NOT NULL,
    image_url VARCHAR NOT NULL
);
CREATE TABLE IF NOT EXISTS remote_keys (
    pokemon_id UINTEGER PRIMARY KEY,
    prev_offset UINTEGER,
    next_offset UINTEGER,
    created_at VARCHAR NOT NULL
);
CREATE TABLE IF NOT EXISTS pokemon_detail (
    pokemon_id UINTEGER PRIMARY KEY,
    height UINTEGER NOT NULL,
    weight UINTEGER NOT NULL,
    base_experience UINTEGER,
    types VARCHAR NOT NULL,
    stats VARCHAR NOT NULL,
    sprite_url VARCHAR,
    species_name VARCHAR NOT NULL,
    species_url VARCHAR NOT NULL
);
CREATE TABLE IF NOT EXISTS pokemon_species (
    pokemon_id UINTEGER PRIMARY KEY,
    name VARCHAR NOT NULL,
    url VARCHAR NOT NULL,
    flavor_text VARCHAR,
    evolution_chain_url VARCHAR
);
CREATE TABLE IF NOT EXISTS evolution_chain (
    url VARCHAR PRIMARY KEY,
    id UINTEGER NOT NULL,
    steps VARCHAR NOT NULL
);
";

const CLEAR_ALL: &str = "
DELETE FROM pokemon;
DELETE FROM remote_keys;
DELETE FROM pokemon_detail;
DELETE FROM pokemon_species;
DELETE FROM evolution_chain;
";

fn write_pokemons(conn: &Connection, rows: &[PokemonEntity]) -> Result<()> {
    let mut stmt = conn.prepare(
        "INSERT OR REPLACE INTO pokemon (id, name, url, image_url) VALUES (?, ?, ?, ?)",
    )?;
    for p in rows {
        stmt.execute(params![p.id, p.name, p.url, p.image_url])?;
    }
    Ok(())
}

fn write_remote_keys(conn: &Connection, rows: &[RemoteKey]) -> Result<()> {
    let mut stmt = conn.prepare(
        "INSERT OR REPLACE INTO remote_keys (pokemon_id, prev_offset, next_offset, created_at)
         VALUES (?, ?, ?, ?)",
    )?;
    for k in rows {
        stmt.execute(params![
            k.pokemon_id,
            k.prev_offset,
            k.next_offset,
            k.created_at.to_rfc3339()
        ])?;
    }
    Ok(())
}

fn write_details(conn: &Connection, rows: &[PokemonDetailEntity]) -> Result<()> {
    let mut stmt = conn.prepare(
        "INSERT OR REPLACE INTO pokemon_detail
         (pokemon_id, height, weight, base_experience, types, stats, sprite_url, species_name, species_url)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )?;
    for d in rows {
        let types = serde_json::to_string(&d.types)?;
        let stats = serde_json::to_string(&d.stats)?;
        stmt.execute(params![
            d.pokemon_id,
            d.height,
            d.weight,
            d.base_experience,
            types,
            stats,
            d.sprite_url,
            d.species_name,
            d.species_url
        ])?;
    }
    Ok(())
}

fn write_species(conn: &Connection, rows: &[PokemonSpeciesEntity]) -> Result<()> {
    let mut stmt = conn.prepare(
        "INSERT OR REPLACE INTO pokemon_species
         (pokemon_id, name, url, flavor_text, evolution_chain_url) VALUES (?, ?, ?, ?, ?)",
    )?;
    for s in rows {
        stmt.execute(params![
            s.pokemon_id,
            s.name,
            s.url,
            s.flavor_text,
            s.evolution_chain_url
        ])?;
    }
    Ok(())
}

/// [`LocalDataSource`] persisted with DuckDB
pub struct DuckDbStore {
    conn: Mutex<Connection>,
    location: String,
}

impl DuckDbStore {
    /// Open (or create) a database file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        Self::init(conn, path.display().to_string())
    }

    /// Open a throwaway in-memory database
    pub fn in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?, ":memory:".to_string())
    }

    fn init(conn: Connection, location: String) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        debug!(location = %location, "opened cache database");
        Ok(Self {
            conn: Mutex::new(conn),
            location,
        })
    }

    /// Where this store lives (file path or `:memory:`)
    pub fn location(&self) -> &str {
        &self.location
    }

    fn with_conn<T>(&self, f: impl FnOnce(&mut Connection) -> Result<T>) -> Result<T> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| Error::storage("cache connection lock poisoned"))?;
        f(&mut conn)
    }

    /// Run `f` in a transaction; any error rolls the whole of it back
    fn in_transaction(&self, f: impl FnOnce(&Connection) -> Result<()>) -> Result<()> {
        self.with_conn(|conn| {
            let tx = conn.transaction()?;
            f(&tx)?;
            tx.commit()?;
            Ok(())
        })
    }

    /// Raw SQL against the cache, for tests that need to corrupt it
    #[cfg(test)]
    pub(crate) fn execute_batch(&self, sql: &str) -> Result<()> {
        self.with_conn(|conn| Ok(conn.execute_batch(sql)?))
    }

    fn load_species(conn: &Connection, pokemon_id: u32) -> Result<Option<PokemonSpeciesEntity>> {
        let mut stmt = conn.prepare(
            "SELECT pokemon_id, name, url, flavor_text, evolution_chain_url
             FROM pokemon_species WHERE pokemon_id = ?",
        )?;
        let row = stmt
            .query_map(params![pokemon_id], |row| {
                Ok(PokemonSpeciesEntity {
                    pokemon_id: row.get(0)?,
                    name: row.get(1)?,
                    url: row.get(2)?,
                    flavor_text: row.get(3)?,
                    evolution_chain_url: row.get(4)?,
                })
            })?
            .next()
            .transpose()?;
        Ok(row)
    }

    fn load_chain(conn: &Connection, url: &str) -> Result<Option<EvolutionChainEntity>> {
        let mut stmt = conn.prepare("SELECT url, id, steps FROM evolution_chain WHERE url = ?")?;
        let raw = stmt
            .query_map(params![url], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, u32>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .next()
            .transpose()?;

        raw.map(|(url, id, steps)| {
            Ok(EvolutionChainEntity {
                url,
                id,
                steps: serde_json::from_str(&steps)?,
            })
        })
        .transpose()
    }
}

impl std::fmt::Debug for DuckDbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuckDbStore")
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl LocalDataSource for DuckDbStore {
    async fn save_all_pokemons(&self, pokemons: Vec<PokemonEntity>) -> Result<()> {
        if pokemons.is_empty() {
            return Ok(());
        }
        self.in_transaction(|conn| write_pokemons(conn, &pokemons))
    }

    async fn save_all_remote_keys(&self, keys: Vec<RemoteKey>) -> Result<()> {
        if keys.is_empty() {
            return Ok(());
        }
        self.in_transaction(|conn| write_remote_keys(conn, &keys))
    }

    async fn save_all_pokemon_details(&self, details: Vec<PokemonDetailEntity>) -> Result<()> {
        if details.is_empty() {
            return Ok(());
        }
        self.in_transaction(|conn| write_details(conn, &details))
    }

    async fn save_all_pokemon_species(&self, species: Vec<PokemonSpeciesEntity>) -> Result<()> {
        if species.is_empty() {
            return Ok(());
        }
        self.in_transaction(|conn| write_species(conn, &species))
    }

    async fn save_evolution_chain(&self, chain: EvolutionChainEntity) -> Result<()> {
        let steps = serde_json::to_string(&chain.steps)?;
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO evolution_chain (url, id, steps) VALUES (?, ?, ?)",
                params![chain.url, chain.id, steps],
            )?;
            Ok(())
        })
    }

    async fn remote_key(&self, pokemon_id: u32) -> Result<Option<RemoteKey>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT pokemon_id, prev_offset, next_offset, created_at
                 FROM remote_keys WHERE pokemon_id = ?",
            )?;
            let raw = stmt
                .query_map(params![pokemon_id], |row| {
                    Ok((
                        row.get::<_, u32>(0)?,
                        row.get::<_, Option<u32>>(1)?,
                        row.get::<_, Option<u32>>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                })?
                .next()
                .transpose()?;

            raw.map(|(pokemon_id, prev_offset, next_offset, created_at)| {
                let created_at = DateTime::parse_from_rfc3339(&created_at)
                    .map_err(|e| Error::storage(format!("Bad remote key timestamp: {e}")))?
                    .with_timezone(&Utc);
                Ok(RemoteKey {
                    pokemon_id,
                    prev_offset,
                    next_offset,
                    created_at,
                })
            })
            .transpose()
        })
    }

    async fn pokemons(&self, offset: usize, limit: usize) -> Result<Vec<PokemonEntity>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT id, name, url, image_url FROM pokemon ORDER BY id LIMIT {limit} OFFSET {offset}"
            ))?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(PokemonEntity {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        url: row.get(2)?,
                        image_url: row.get(3)?,
                    })
                })?
                .collect::<duckdb::Result<Vec<_>>>()?;
            Ok(rows)
        })
    }

    async fn pokemon_and_detail(&self, name: &str) -> Result<Option<PokemonAndDetail>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT p.id, p.name, p.url, p.image_url,
                        d.height, d.weight, d.base_experience, d.types, d.stats,
                        d.sprite_url, d.species_name, d.species_url
                 FROM pokemon p JOIN pokemon_detail d ON d.pokemon_id = p.id
                 WHERE p.name = ?",
            )?;
            let raw = stmt
                .query_map(params![name], |row| {
                    let pokemon = PokemonEntity {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        url: row.get(2)?,
                        image_url: row.get(3)?,
                    };
                    Ok((
                        pokemon,
                        row.get::<_, u32>(4)?,
                        row.get::<_, u32>(5)?,
                        row.get::<_, Option<u32>>(6)?,
                        row.get::<_, String>(7)?,
                        row.get::<_, String>(8)?,
                        row.get::<_, Option<String>>(9)?,
                        row.get::<_, String>(10)?,
                        row.get::<_, String>(11)?,
                    ))
                })?
                .next()
                .transpose()?;

            let Some((
                pokemon,
                height,
                weight,
                base_experience,
                types,
                stats,
                sprite_url,
                species_name,
                species_url,
            )) = raw
            else {
                return Ok(None);
            };

            let detail = PokemonDetailEntity {
                pokemon_id: pokemon.id,
                height,
                weight,
                base_experience,
                types: serde_json::from_str(&types)?,
                stats: serde_json::from_str(&stats)?,
                sprite_url,
                species_name,
                species_url,
            };
            let species = Self::load_species(conn, pokemon.id)?;
            let evolution_chain = match species
                .as_ref()
                .and_then(|s| s.evolution_chain_url.as_deref())
            {
                Some(url) => Self::load_chain(conn, url)?,
                None => None,
            };

            Ok(Some(PokemonAndDetail {
                pokemon,
                detail,
                species,
                evolution_chain,
            }))
        })
    }

    async fn count(&self) -> Result<usize> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM pokemon", [], |row| row.get(0))?;
            Ok(count as usize)
        })
    }

    async fn clear_all(&self) -> Result<()> {
        self.with_conn(|conn| Ok(conn.execute_batch(CLEAR_ALL)?))
    }

    async fn save_page(&self, batch: PageBatch, replace: bool) -> Result<()> {
        self.in_transaction(|conn| {
            if replace {
                conn.execute_batch(CLEAR_ALL)?;
            }
            write_pokemons(conn, &batch.pokemons)?;
            write_remote_keys(conn, &batch.remote_keys)?;
            write_details(conn, &batch.details)?;
            write_species(conn, &batch.species)
        })?;
        debug!(rows = batch.len(), replace, "committed page");
        Ok(())
    }
}
