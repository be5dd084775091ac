//! Insertion-ordered collection keyed by fieldname.
//!
//! Output order of the compiled request follows iteration order here, so this is a
//! plain vector with lookups by name rather than a sorted or hashed map.

use crate::error::{QueryError, QueryResult};

pub trait Keyed {
    fn fieldname(&self) -> &str;
}

#[derive(Debug, Clone)]
pub struct FieldnameMap<T> {
    items: Vec<T>,
}

impl<T> Default for FieldnameMap<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Keyed> FieldnameMap<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.items.iter_mut()
    }

    pub fn first(&self) -> Option<&T> {
        self.items.first()
    }

    pub fn position(&self, fieldname: &str) -> Option<usize> {
        self.items.iter().position(|item| item.fieldname() == fieldname)
    }

    pub fn get(&self, fieldname: &str) -> Option<&T> {
        self.items.iter().find(|item| item.fieldname() == fieldname)
    }

    pub(crate) fn get_mut(&mut self, fieldname: &str) -> Option<&mut T> {
        self.items.iter_mut().find(|item| item.fieldname() == fieldname)
    }

    pub fn contains(&self, fieldname: &str) -> bool {
        self.position(fieldname).is_some()
    }

    pub fn fieldnames(&self) -> Vec<String> {
        self.items.iter().map(|item| item.fieldname().to_string()).collect()
    }

    /// Appends `item`, returning the index it landed at.
    pub(crate) fn push(&mut self, item: T) -> QueryResult<usize> {
        if self.contains(item.fieldname()) {
            return Err(QueryError::DuplicateFieldname(item.fieldname().to_string()));
        }
        self.items.push(item);
        Ok(self.items.len() - 1)
    }

    pub(crate) fn remove(&mut self, fieldname: &str) -> Option<(usize, T)> {
        let index = self.position(fieldname)?;
        Some((index, self.items.remove(index)))
    }

    /// Replaces the whole collection. Nothing changes if `items` repeats a fieldname.
    pub(crate) fn reset(&mut self, items: Vec<T>) -> QueryResult<()> {
        for (i, item) in items.iter().enumerate() {
            if items[..i].iter().any(|other| other.fieldname() == item.fieldname()) {
                return Err(QueryError::DuplicateFieldname(item.fieldname().to_string()));
            }
        }
        self.items = items;
        Ok(())
    }
}

impl<'a, T> IntoIterator for &'a FieldnameMap<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
