//! Deterministic pseudonymization of raw field values
//!
//! Substitutes are drawn from pools that are built once from a seed. Every distinct raw value
//! consumes one pool entry the first time it is seen and is mapped to the same substitute for
//! the rest of the run.
//!
//! Pools are shuffled and UUIDs generated with [`rand::rngs::StdRng`]. Given the same seed,
//! the substitutes are stable for a given build of this crate; they are not meant to match
//! substitutes produced by other tools.
use std::{collections::HashMap, fmt::Display, str::FromStr};

use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::{Builder, Uuid};

use crate::{error::ConversionError, record::Record};

/// Source lists of the finite pools
pub mod word_lists;

/// Seed used if none is configured
pub const DEFAULT_SEED: u64 = 0x5e7d_0f_2017;

///
/// Kinds of pseudonym pools
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoolKind {
    /// Personal names (`First Last`), finite
    Name,
    /// Place names, finite
    Place,
    /// Random UUIDs, unbounded
    Uuid,
}

impl PoolKind {
    /// All pool kinds
    pub const ALL: [PoolKind; 3] = [PoolKind::Name, PoolKind::Place, PoolKind::Uuid];

    fn seed_offset(&self) -> u64 {
        match self {
            PoolKind::Name => 1,
            PoolKind::Place => 2,
            PoolKind::Uuid => 3,
        }
    }
}

impl Display for PoolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PoolKind::Name => "name",
            PoolKind::Place => "place",
            PoolKind::Uuid => "uuid",
        };
        write!(f, "{s}")
    }
}

impl FromStr for PoolKind {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "name" => Ok(PoolKind::Name),
            "place" => Ok(PoolKind::Place),
            "uuid" => Ok(PoolKind::Uuid),
            _ => Err(ConversionError::UnknownPoolKind(s.to_string())),
        }
    }
}

#[derive(Debug)]
enum PoolSource {
    Finite { entries: Vec<String>, next: usize },
    Uuid(StdRng),
}

///
/// A memoizing source of substitute values
///
#[derive(Debug)]
pub struct PseudonymPool {
    kind: PoolKind,
    source: PoolSource,
    memo: HashMap<String, String>,
}

impl PseudonymPool {
    /// Finite pool consisting of `entries`, shuffled with `seed`
    pub fn finite(kind: PoolKind, entries: Vec<String>, seed: u64) -> Self {
        let mut entries = entries;
        let mut rng = StdRng::seed_from_u64(seed);
        entries.shuffle(&mut rng);
        Self {
            kind,
            source: PoolSource::Finite { entries, next: 0 },
            memo: HashMap::new(),
        }
    }

    /// Unbounded pool generating random UUIDs from `seed`
    pub fn uuids(seed: u64) -> Self {
        Self {
            kind: PoolKind::Uuid,
            source: PoolSource::Uuid(StdRng::seed_from_u64(seed)),
            memo: HashMap::new(),
        }
    }

    /// Standard pool of the given kind
    pub fn standard(kind: PoolKind, seed: u64) -> Self {
        let seed = seed.wrapping_add(kind.seed_offset());
        match kind {
            PoolKind::Name => {
                let names = word_lists::FIRST_NAMES
                    .iter()
                    .flat_map(|first| {
                        word_lists::SURNAMES
                            .iter()
                            .map(move |last| format!("{first} {last}"))
                    })
                    .collect();
                Self::finite(kind, names, seed)
            }
            PoolKind::Place => Self::finite(
                kind,
                word_lists::PLACES.iter().map(|p| p.to_string()).collect(),
                seed,
            ),
            PoolKind::Uuid => Self::uuids(seed),
        }
    }

    /// Kind of this pool
    pub fn kind(&self) -> PoolKind {
        self.kind
    }

    /// Number of distinct raw values substituted so far
    pub fn assigned(&self) -> usize {
        self.memo.len()
    }

    ///
    /// Substitute for a raw value
    ///
    /// Returns the memoized substitute if `raw` was seen before, and otherwise consumes the next
    /// pool entry. Fails with [`ConversionError::PoolExhausted`] if a finite pool has no entries left.
    pub fn substitute(&mut self, raw: &str) -> Result<&str, ConversionError> {
        if !self.memo.contains_key(raw) {
            let next_value = match &mut self.source {
                PoolSource::Finite { entries, next } => {
                    let v = entries
                        .get(*next)
                        .cloned()
                        .ok_or_else(|| ConversionError::PoolExhausted {
                            kind: self.kind.to_string(),
                            capacity: entries.len(),
                        })?;
                    *next += 1;
                    v
                }
                PoolSource::Uuid(rng) => {
                    let bytes: [u8; 16] = rng.random();
                    Builder::from_random_bytes(bytes)
                        .into_uuid()
                        .hyphenated()
                        .to_string()
                }
            };
            self.memo.insert(raw.to_string(), next_value);
        }
        Ok(self.memo[raw].as_str())
    }
}

///
/// All pseudonym pools of one run
///
/// Constructed once (see [`PseudonymContext::new`]) and passed through the conversion.
/// There is no way to reset a pool: substitutes stay assigned for the lifetime of the context.
#[derive(Debug)]
pub struct PseudonymContext {
    pools: HashMap<PoolKind, PseudonymPool>,
}

impl PseudonymContext {
    /// Build all standard pools from `seed`
    pub fn new(seed: u64) -> Self {
        Self {
            pools: PoolKind::ALL
                .iter()
                .map(|k| (*k, PseudonymPool::standard(*k, seed)))
                .collect(),
        }
    }

    /// Replace the pool of a kind (before any value was substituted with it)
    pub fn with_pool(mut self, pool: PseudonymPool) -> Self {
        self.pools.insert(pool.kind(), pool);
        self
    }

    /// Substitute for `raw` from the pool of `kind`
    pub fn substitute(&mut self, kind: PoolKind, raw: &str) -> Result<&str, ConversionError> {
        self.pools
            .entry(kind)
            .or_insert_with(|| PseudonymPool::standard(kind, DEFAULT_SEED))
            .substitute(raw)
    }

    /// Access a pool
    pub fn pool(&self, kind: PoolKind) -> Option<&PseudonymPool> {
        self.pools.get(&kind)
    }
}

impl Default for PseudonymContext {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}

///
/// Rewrites configured record fields with substitutes from a [`PseudonymContext`]
///
#[derive(Debug)]
pub struct Pseudonymizer {
    fields: Vec<(String, PoolKind)>,
    context: PseudonymContext,
}

impl Pseudonymizer {
    /// Pseudonymizer for `fields` (raw field name, pool kind) drawing from `context`
    pub fn new(fields: Vec<(String, PoolKind)>, context: PseudonymContext) -> Self {
        Self { fields, context }
    }

    /// Whether no fields are pseudonymized
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Replace the values of all configured fields of `record`; fields without value are left alone
    pub fn apply(&mut self, record: &mut Record) -> Result<(), ConversionError> {
        for (field, kind) in &self.fields {
            if let Some(Some(value)) = record.get_mut(field) {
                let substitute = self.context.substitute(*kind, value)?;
                debug!(field = field.as_str(), %kind, "Pseudonymized field value");
                *value = substitute.to_string();
            }
        }
        Ok(())
    }

    /// The underlying context
    pub fn context(&self) -> &PseudonymContext {
        &self.context
    }
}
