//! Model-parameter containers and their static metadata.
//!
//! A [`Params`] holds one forward evaluation's parameter arrays, keyed by
//! coordinate (and optionally a per-coordinate parameter name). Containers
//! are immutable values: every "mutation" returns a new container, so views
//! can be shared across concurrent evaluations without locking.

use std::collections::HashMap;
use std::fmt;

use crate::{Error, Result};

mod bounds;
mod names;
mod scales;

pub use bounds::{ClosedBounds, ParamBounds};
pub use names::{ParamNameDecl, ParamNames};
pub use scales::{ParamScaler, ParamScalers};

/// One entry of a [`Params`] container.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamEntry<T> {
    /// A coordinate-level value, e.g. a mixture weight.
    Value(T),
    /// A group of named parameters for one coordinate, e.g. `mu`/`sigma`.
    Group(Vec<(String, T)>),
}

/// A flattened `(coordinate, parameter)` key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FlatKey {
    /// Coordinate name, possibly dotted (`stream.phi2`).
    pub coord: String,
    /// Per-coordinate parameter name; `None` for coordinate-level values.
    pub name: Option<String>,
}

impl fmt::Display for FlatKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{}.{}", self.coord, name),
            None => write!(f, "{}", self.coord),
        }
    }
}

/// Immutable ordered mapping from parameter keys to values.
#[derive(Debug, Clone, PartialEq)]
pub struct Params<T> {
    entries: Vec<(String, ParamEntry<T>)>,
    index: HashMap<String, usize>,
}

impl<T: Clone> Params<T> {
    /// Empty container.
    pub fn new() -> Self {
        Self { entries: Vec::new(), index: HashMap::new() }
    }

    fn from_entries(entries: Vec<(String, ParamEntry<T>)>) -> Result<Self> {
        let mut index = HashMap::with_capacity(entries.len());
        for (pos, (coord, _)) in entries.iter().enumerate() {
            if coord.is_empty() {
                return Err(Error::Validation("coordinate names must be non-empty".into()));
            }
            if index.insert(coord.clone(), pos).is_some() {
                return Err(Error::Validation(format!("duplicate coordinate '{coord}'")));
            }
        }
        Ok(Self { entries, index })
    }

    /// Number of coordinate entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no entries are present.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Coordinate names in declaration order.
    pub fn coords(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(c, _)| c.as_str())
    }

    /// Get the coordinate-level value under `coord`.
    pub fn get(&self, coord: &str) -> Result<&T> {
        match self.entry(coord)? {
            ParamEntry::Value(v) => Ok(v),
            ParamEntry::Group(_) => Err(Error::KeyLookup(format!(
                "'{coord}' is a parameter group, not a coordinate-level value"
            ))),
        }
    }

    /// Get the parameter `name` under coordinate `coord`.
    pub fn get_sub(&self, coord: &str, name: &str) -> Result<&T> {
        match self.entry(coord)? {
            ParamEntry::Group(group) => group
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v)
                .ok_or_else(|| Error::KeyLookup(format!("no parameter '{coord}.{name}'"))),
            ParamEntry::Value(_) => Err(Error::KeyLookup(format!(
                "'{coord}' is a coordinate-level value, not a parameter group"
            ))),
        }
    }

    /// True if a coordinate-level value exists under `coord`.
    pub fn contains(&self, coord: &str) -> bool {
        matches!(self.entry(coord), Ok(ParamEntry::Value(_)))
    }

    /// True if parameter `name` exists under coordinate `coord`.
    pub fn contains_sub(&self, coord: &str, name: &str) -> bool {
        matches!(self.entry(coord), Ok(ParamEntry::Group(g)) if g.iter().any(|(n, _)| n == name))
    }

    /// All flattened keys, in declaration order.
    pub fn flat_keys(&self) -> Vec<FlatKey> {
        let mut keys = Vec::new();
        for (coord, entry) in &self.entries {
            match entry {
                ParamEntry::Value(_) => {
                    keys.push(FlatKey { coord: coord.clone(), name: None });
                }
                ParamEntry::Group(group) => {
                    for (name, _) in group {
                        keys.push(FlatKey { coord: coord.clone(), name: Some(name.clone()) });
                    }
                }
            }
        }
        keys
    }

    /// Sub-container of entries whose coordinate starts with `name.`, with
    /// that prefix stripped. Non-matching entries are excluded. The original
    /// is untouched.
    pub fn get_prefixed(&self, name: &str) -> Self {
        let prefix = format!("{name}.");
        let entries: Vec<(String, ParamEntry<T>)> = self
            .entries
            .iter()
            .filter_map(|(coord, entry)| {
                coord
                    .strip_prefix(&prefix)
                    .map(|stripped| (stripped.to_string(), entry.clone()))
            })
            .collect();
        let index = entries
            .iter()
            .enumerate()
            .map(|(pos, (coord, _))| (coord.clone(), pos))
            .collect::<HashMap<_, _>>();
        Self { entries, index }
    }

    /// Copy with the coordinate-level value under `coord` replaced or added.
    pub fn set(&self, coord: impl Into<String>, value: T) -> Self {
        let mut builder = self.unfreeze();
        builder.insert(coord, value);
        builder.freeze_unchecked()
    }

    /// Copy with the parameter `coord.name` replaced or added.
    pub fn set_sub(&self, coord: impl Into<String>, name: impl Into<String>, value: T) -> Self {
        let mut builder = self.unfreeze();
        builder.insert_sub(coord, name, value);
        builder.freeze_unchecked()
    }

    /// Mutable builder seeded with this container's entries.
    pub fn unfreeze(&self) -> ParamsBuilder<T> {
        ParamsBuilder { entries: self.entries.clone() }
    }

    fn entry(&self, coord: &str) -> Result<&ParamEntry<T>> {
        let pos = self
            .index
            .get(coord)
            .copied()
            .ok_or_else(|| Error::KeyLookup(format!("no coordinate '{coord}'")))?;
        Ok(&self.entries[pos].1)
    }
}

impl<T: Clone> Default for Params<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Mutable staging area for building a [`Params`].
#[derive(Debug, Clone)]
pub struct ParamsBuilder<T> {
    entries: Vec<(String, ParamEntry<T>)>,
}

impl<T: Clone> ParamsBuilder<T> {
    /// Empty builder.
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Insert or replace a coordinate-level value.
    pub fn insert(&mut self, coord: impl Into<String>, value: T) -> &mut Self {
        let coord = coord.into();
        match self.entries.iter_mut().find(|(c, _)| *c == coord) {
            Some((_, entry)) => *entry = ParamEntry::Value(value),
            None => self.entries.push((coord, ParamEntry::Value(value))),
        }
        self
    }

    /// Insert or replace a parameter inside a coordinate group.
    pub fn insert_sub(
        &mut self,
        coord: impl Into<String>,
        name: impl Into<String>,
        value: T,
    ) -> &mut Self {
        let coord = coord.into();
        let name = name.into();
        match self.entries.iter_mut().find(|(c, _)| *c == coord) {
            Some((_, ParamEntry::Group(group))) => {
                match group.iter_mut().find(|(n, _)| *n == name) {
                    Some((_, v)) => *v = value,
                    None => group.push((name, value)),
                }
            }
            Some((_, entry @ ParamEntry::Value(_))) => {
                *entry = ParamEntry::Group(vec![(name, value)]);
            }
            None => {
                self.entries.push((coord, ParamEntry::Group(vec![(name, value)])));
            }
        }
        self
    }

    /// Freeze into an immutable container.
    pub fn freeze(self) -> Result<Params<T>> {
        Params::from_entries(self.entries)
    }

    fn freeze_unchecked(self) -> Params<T> {
        // Entries come from an already-frozen container plus replace-or-append
        // inserts, so coordinates stay unique.
        let index = self
            .entries
            .iter()
            .enumerate()
            .map(|(pos, (coord, _))| (coord.clone(), pos))
            .collect();
        Params { entries: self.entries, index }
    }
}

impl<T: Clone> Default for ParamsBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}
