//! Field selection for tabular extractors.
//!
//! Every tabular extractor declares the columns it can produce and the ones
//! it returns when the caller doesn't ask for any.

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy)]
pub struct FieldSet {
    pub allowed: &'static [&'static str],
    pub defaults: &'static [&'static str],
}

impl FieldSet {
    /// All allowed fields are returned by default
    pub const fn new(allowed: &'static [&'static str]) -> Self {
        FieldSet {
            allowed,
            defaults: allowed,
        }
    }

    pub const fn with_defaults(allowed: &'static [&'static str], defaults: &'static [&'static str]) -> Self {
        FieldSet { allowed, defaults }
    }

    pub fn contains(&self, field: &str) -> bool {
        self.allowed.contains(&field)
    }

    /// Validates `requested` and returns the fields to produce, in the
    /// caller's order with duplicates removed
    pub fn select<'f>(&self, requested: &[&'f str]) -> Result<Vec<&'f str>> {
        if requested.is_empty() {
            return Ok(self.defaults.to_vec());
        }
        let mut res: Vec<&'f str> = Vec::with_capacity(requested.len());
        for field in requested {
            if !self.contains(field) {
                return Err(Error::value(format!(
                    "invalid field {:?}, available fields: {}",
                    field,
                    self.allowed.join(", ")
                )));
            }
            if !res.contains(field) {
                res.push(*field);
            }
        }
        Ok(res)
    }
}

/// `selected` plus the helper fields an extractor needs internally
pub fn with_helpers<'f>(selected: &[&'f str], helpers: &[&'f str]) -> Vec<&'f str> {
    let mut res = selected.to_vec();
    for h in helpers {
        if !res.contains(h) {
            res.push(*h);
        }
    }
    res
}
