//! Name-keyed lookup over a model's entity lists.

use super::DiffError;
use crate::model::{ChangeCategory, Event, Function, Import, Modifier, Variable};
use std::collections::HashMap;

/// An entity addressable by name within its model.
pub trait Keyed {
    fn key(&self) -> &str;
}

impl Keyed for Function {
    fn key(&self) -> &str {
        Function::key(self)
    }
}

impl Keyed for Event {
    fn key(&self) -> &str {
        &self.name
    }
}

impl Keyed for Variable {
    fn key(&self) -> &str {
        &self.name
    }
}

impl Keyed for Modifier {
    fn key(&self) -> &str {
        &self.name
    }
}

impl Keyed for Import {
    fn key(&self) -> &str {
        &self.path
    }
}

impl Keyed for String {
    fn key(&self) -> &str {
        self
    }
}

/// Lookup table built from an entity list.
///
/// A duplicate key keeps its first position but resolves to the last
/// entry. Entities with an empty key cannot be addressed and are reported
/// as malformed at build time.
pub struct NameIndex<'a, T> {
    category: ChangeCategory,
    order: Vec<&'a str>,
    entries: HashMap<&'a str, &'a T>,
}

impl<'a, T: Keyed> NameIndex<'a, T> {
    pub fn build(category: ChangeCategory, items: &'a [T]) -> (Self, Vec<DiffError>) {
        let mut order = Vec::with_capacity(items.len());
        let mut entries = HashMap::with_capacity(items.len());
        let mut malformed = Vec::new();

        for item in items {
            let key = item.key();
            if key.is_empty() {
                malformed.push(DiffError::MalformedModel {
                    category,
                    name: "<unnamed>".to_owned(),
                });
                continue;
            }
            if entries.insert(key, item).is_none() {
                order.push(key);
            }
        }

        (
            Self {
                category,
                order,
                entries,
            },
            malformed,
        )
    }

    /// Keys in first-declaration order.
    pub fn keys(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.order.iter().copied()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&'a T> {
        self.entries.get(key).copied()
    }

    /// Resolve a key that is expected to be present.
    pub fn require(&self, key: &str) -> Result<&'a T, DiffError> {
        self.get(key).ok_or_else(|| DiffError::MalformedModel {
            category: self.category,
            name: key.to_owned(),
        })
    }
}
