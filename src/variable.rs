//! The variable name to vector index mapping shared by all aggregators.
//!
//! Every observation carries one value per variable, in the order fixed by
//! the [`VariableContext`] at the start of a binning run. Aggregators
//! resolve the names they reference against this context once, at
//! construction time, and index into observation values from then on.

use crate::error::{GridbinError, Result};

/// Immutable, ordered mapping from variable name to observation index.
///
/// Indices are stable for the lifetime of the context. Duplicate names are
/// rejected at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableContext {
    names: Vec<String>,
}

impl VariableContext {
    /// Create a context from an ordered list of unique variable names.
    pub fn new<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();

        for (i, name) in names.iter().enumerate() {
            if names[..i].contains(name) {
                return Err(GridbinError::Config {
                    message: format!("Duplicate variable name: {}", name),
                });
            }
        }

        Ok(Self { names })
    }

    /// Number of variables in the context.
    pub fn size(&self) -> usize {
        self.names.len()
    }

    /// Name of the variable at the given index.
    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// Index of the named variable, or `None` if it is not part of the
    /// context.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// All variable names in index order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Resolve a name to its index, failing with an unknown-variable error.
    pub fn require_index(&self, name: &str) -> Result<usize> {
        self.index_of(name).ok_or_else(|| GridbinError::UnknownVariable {
            name: name.to_string(),
        })
    }
}
