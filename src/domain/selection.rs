//! Selection of documents inside a collection.
//!
//! Callers may target one document, a list of documents or every document.
//! All forms are normalized into [`Selection`] once, at the API boundary.

use crate::error::{ManagerError, ManagerResult};

/// The documents an operation targets, by position in the collection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    /// Every document currently in the collection.
    #[default]
    All,

    /// The listed positions, in the order given.
    Indices(Vec<usize>),
}

impl Selection {
    /// Selects every document.
    pub fn all() -> Self {
        Self::All
    }

    /// Selects a single document.
    pub fn one(index: usize) -> Self {
        Self::Indices(vec![index])
    }

    /// Resolves the selection against a collection of `len` documents.
    ///
    /// Returns the selected positions in the order they were given. Any
    /// position outside `0..len` is reported as [`ManagerError::Selection`].
    pub fn resolve(&self, len: usize) -> ManagerResult<Vec<usize>> {
        match self {
            Self::All => Ok((0..len).collect()),
            Self::Indices(indices) => {
                if let Some(&index) = indices.iter().find(|&&i| i >= len) {
                    return Err(ManagerError::Selection { index, len });
                }
                Ok(indices.clone())
            }
        }
    }

    /// Returns true if position `index` is targeted.
    pub fn contains(&self, index: usize) -> bool {
        match self {
            Self::All => true,
            Self::Indices(indices) => indices.contains(&index),
        }
    }
}

impl From<usize> for Selection {
    fn from(index: usize) -> Self {
        Self::one(index)
    }
}

impl From<Vec<usize>> for Selection {
    fn from(indices: Vec<usize>) -> Self {
        Self::Indices(indices)
    }
}

impl From<&[usize]> for Selection {
    fn from(indices: &[usize]) -> Self {
        Self::Indices(indices.to_vec())
    }
}

impl<const N: usize> From<[usize; N]> for Selection {
    fn from(indices: [usize; N]) -> Self {
        Self::Indices(indices.to_vec())
    }
}

impl<T: Into<Selection>> From<Option<T>> for Selection {
    fn from(selection: Option<T>) -> Self {
        selection.map_or(Self::All, Into::into)
    }
}
