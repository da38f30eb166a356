//! Construction-time declaration of a model's parameter structure.

use crate::{Error, Result};

/// One declared entry: a coordinate-level parameter or a coordinate group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamNameDecl {
    /// A coordinate-level parameter, e.g. `weight`.
    Coord(String),
    /// A coordinate with named parameters, e.g. `phi2` with `mu`/`sigma`.
    WithSub {
        /// Coordinate name.
        coord: String,
        /// Parameter names under this coordinate, in declaration order.
        params: Vec<String>,
    },
}

/// Ordered index of the parameters a model declares.
///
/// The flat form joins coordinate and parameter names with `.` and fixes the
/// column order of forward-pass outputs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParamNames {
    decls: Vec<ParamNameDecl>,
    flat: Vec<String>,
}

impl ParamNames {
    /// Build from declarations, validating names and flat uniqueness.
    pub fn new(decls: Vec<ParamNameDecl>) -> Result<Self> {
        let mut flat = Vec::new();
        for decl in &decls {
            match decl {
                ParamNameDecl::Coord(coord) => {
                    if coord.is_empty() {
                        return Err(Error::Validation("parameter names must be non-empty".into()));
                    }
                    flat.push(coord.clone());
                }
                ParamNameDecl::WithSub { coord, params } => {
                    if coord.is_empty() || params.is_empty() {
                        return Err(Error::Validation(format!(
                            "coordinate '{coord}' must declare at least one named parameter"
                        )));
                    }
                    for name in params {
                        if name.is_empty() {
                            return Err(Error::Validation(format!(
                                "coordinate '{coord}' declares an empty parameter name"
                            )));
                        }
                        flat.push(format!("{coord}.{name}"));
                    }
                }
            }
        }
        for (i, name) in flat.iter().enumerate() {
            if flat[..i].contains(name) {
                return Err(Error::Validation(format!("duplicate parameter '{name}'")));
            }
        }
        Ok(Self { decls, flat })
    }

    /// Declarations in order.
    pub fn decls(&self) -> &[ParamNameDecl] {
        &self.decls
    }

    /// Flat dotted names, in declaration order.
    pub fn flat(&self) -> &[String] {
        &self.flat
    }

    /// Number of flat parameters (forward-pass output width).
    pub fn n_flat(&self) -> usize {
        self.flat.len()
    }

    /// Position of a flat dotted name, if declared.
    pub fn flat_index(&self, name: &str) -> Option<usize> {
        self.flat.iter().position(|n| n == name)
    }

    /// True if a coordinate-level parameter `coord` is declared.
    pub fn contains_coord(&self, coord: &str) -> bool {
        self.decls.iter().any(|d| matches!(d, ParamNameDecl::Coord(c) if c == coord))
    }

    /// True if `coord.name` is declared.
    pub fn contains_sub(&self, coord: &str, name: &str) -> bool {
        self.decls.iter().any(|d| {
            matches!(d, ParamNameDecl::WithSub { coord: c, params } if c == coord && params.iter().any(|p| p == name))
        })
    }

    /// Copy with every coordinate prefixed as `prefix.coord`.
    pub fn with_prefix(&self, prefix: &str) -> Self {
        let decls = self
            .decls
            .iter()
            .map(|decl| match decl {
                ParamNameDecl::Coord(coord) => ParamNameDecl::Coord(format!("{prefix}.{coord}")),
                ParamNameDecl::WithSub { coord, params } => ParamNameDecl::WithSub {
                    coord: format!("{prefix}.{coord}"),
                    params: params.clone(),
                },
            })
            .collect();
        let flat = self.flat.iter().map(|name| format!("{prefix}.{name}")).collect();
        Self { decls, flat }
    }

    /// Merge several declaration sets, preserving order.
    pub fn merged(parts: impl IntoIterator<Item = Self>) -> Result<Self> {
        let decls = parts.into_iter().flat_map(|p| p.decls).collect();
        Self::new(decls)
    }
}
