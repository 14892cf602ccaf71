//! Tag collections attached to nodes and edges
//!
//! A tag is a bare name (`t1`) or a name/value pair (`t2=v2`). Insertion
//! order is preserved so the text form round-trips. Names compare
//! case-insensitively, matching search filters; values are kept verbatim.

use super::types::wildcard_match;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered tag-name -> optional value map
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tags(IndexMap<String, Option<String>>);

impl Tags {
    pub fn new() -> Self {
        Tags(IndexMap::new())
    }

    /// Parse the comma separated text form (`t1,t2=v2`)
    pub fn parse(text: &str) -> Self {
        let mut tags = Tags::new();
        for part in text.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            match part.split_once('=') {
                Some((name, value)) => tags.set(name.trim(), Some(value.trim().to_string())),
                None => tags.set(part, None),
            }
        }
        tags
    }

    /// Position of `name`, compared case-insensitively
    fn find(&self, name: &str) -> Option<usize> {
        self.0.get_index_of(name).or_else(|| {
            let folded = name.to_lowercase();
            self.0.keys().position(|k| k.to_lowercase() == folded)
        })
    }

    /// Insert or replace a tag
    ///
    /// Names are case-insensitive: replacing keeps the stored spelling and
    /// position.
    pub fn set(&mut self, name: impl Into<String>, value: Option<String>) {
        let name = name.into();
        match self.find(&name) {
            Some(index) => self.0[index] = value,
            None => {
                self.0.insert(name, value);
            }
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Option<String>> {
        let index = self.find(name)?;
        self.0.shift_remove_index(index).map(|(_, value)| value)
    }

    pub fn get(&self, name: &str) -> Option<&Option<String>> {
        self.find(name).map(|index| &self.0[index])
    }

    pub fn has(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    pub fn has_value(&self, name: &str, value: &str) -> bool {
        matches!(self.get(name), Some(Some(v)) if v == value)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Option<String>)> {
        self.0.iter()
    }

    /// Union with `other`; values from `other` win on collision
    pub fn merge(&self, other: &Tags) -> Tags {
        let mut merged = self.clone();
        for (name, value) in other.iter() {
            merged.set(name.clone(), value.clone());
        }
        merged
    }

    /// Apply an update tag set: `-name` removes `name`, anything else is merged
    pub fn apply(&self, update: &Tags) -> Tags {
        let mut result = self.clone();
        for (name, value) in update.iter() {
            match name.strip_prefix('-') {
                Some(removed) => {
                    result.remove(removed);
                }
                None => result.set(name.clone(), value.clone()),
            }
        }
        result
    }

    /// True when every tag of `filter` is present here
    ///
    /// Filter names and values honour the trailing `*` wildcard; a filter tag
    /// without a value only requires the name.
    pub fn matches(&self, filter: &Tags) -> bool {
        filter.iter().all(|(name, value)| {
            if name == "*" {
                return true;
            }

            self.iter().any(|(tag, tag_value)| {
                if !wildcard_match(name, tag) {
                    return false;
                }
                match (value, tag_value) {
                    (None, _) => true,
                    (Some(expected), Some(actual)) => wildcard_match(expected, actual),
                    (Some(_), None) => false,
                }
            })
        })
    }
}

impl fmt::Display for Tags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (name, value) in self.iter() {
            if !first {
                f.write_str(",")?;
            }
            first = false;
            match value {
                Some(v) => write!(f, "{}={}", name, v)?,
                None => f.write_str(name)?,
            }
        }
        Ok(())
    }
}

impl From<&str> for Tags {
    fn from(text: &str) -> Self {
        Tags::parse(text)
    }
}

impl<K: Into<String>> FromIterator<(K, Option<String>)> for Tags {
    fn from_iter<I: IntoIterator<Item = (K, Option<String>)>>(iter: I) -> Self {
        let mut tags = Tags::new();
        for (name, value) in iter {
            tags.set(name, value);
        }
        tags
    }
}
