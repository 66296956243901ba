//! crates/marketplace_core/src/paging.rs
//!
//! An ordered, id-unique collection that grows page by page.

use crate::domain::{Car, Report};

/// Anything with a stable identity that collections can deduplicate on.
pub trait Identified {
    fn id(&self) -> &str;
}

impl Identified for Car {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Identified for Report {
    fn id(&self) -> &str {
        &self.id
    }
}

/// A paginated collection. `items` never holds two entries with the same id.
#[derive(Debug, Clone, PartialEq)]
pub struct PagedCollection<T> {
    items: Vec<T>,
    page: u32,
    total_pages: Option<u32>,
    has_more: bool,
}

impl<T> Default for PagedCollection<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            page: 0,
            total_pages: None,
            has_more: true,
        }
    }
}

impl<T: Identified> PagedCollection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a collection that already holds a fully loaded list.
    pub fn from_items(items: Vec<T>) -> Self {
        let mut collection = Self::new();
        collection.items = Vec::with_capacity(items.len());
        collection.merge(items);
        collection.page = 1;
        collection.total_pages = Some(1);
        collection.has_more = false;
        collection
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn total_pages(&self) -> Option<u32> {
        self.total_pages
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    /// Replaces the whole collection with the first page.
    pub fn replace(&mut self, items: Vec<T>, limit: u32, total_pages: Option<u32>) {
        let returned = items.len();
        self.items.clear();
        self.merge(items);
        self.record_page(1, returned, limit, total_pages);
    }

    /// Merges page `page` into the collection. A duplicate id takes the newer
    /// value but keeps the slot of the existing entry.
    pub fn append(&mut self, page: u32, items: Vec<T>, limit: u32, total_pages: Option<u32>) {
        let returned = items.len();
        self.merge(items);
        self.record_page(page, returned, limit, total_pages);
    }

    /// Applies `f` to the item with `id`. Returns whether an item matched.
    pub fn patch(&mut self, id: &str, f: impl FnOnce(&mut T)) -> bool {
        match self.items.iter_mut().find(|item| item.id() == id) {
            Some(item) => {
                f(item);
                true
            }
            None => false,
        }
    }

    /// Applies `f` to every item matching `pred`; returns how many matched.
    pub fn patch_where(&mut self, pred: impl Fn(&T) -> bool, mut f: impl FnMut(&mut T)) -> usize {
        let mut touched = 0;
        for item in self.items.iter_mut().filter(|item| pred(item)) {
            f(item);
            touched += 1;
        }
        touched
    }

    pub fn remove(&mut self, id: &str) -> Option<T> {
        let index = self.items.iter().position(|item| item.id() == id)?;
        Some(self.items.remove(index))
    }

    /// Keeps only the items matching `pred`; returns how many were dropped.
    pub fn retain(&mut self, pred: impl Fn(&T) -> bool) -> usize {
        let before = self.items.len();
        self.items.retain(|item| pred(item));
        before - self.items.len()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    fn merge(&mut self, incoming: Vec<T>) {
        for item in incoming {
            match self.items.iter().position(|existing| existing.id() == item.id()) {
                Some(index) => self.items[index] = item,
                None => self.items.push(item),
            }
        }
    }

    fn record_page(&mut self, page: u32, returned: usize, limit: u32, total_pages: Option<u32>) {
        self.page = page;
        self.total_pages = total_pages;
        self.has_more = match total_pages {
            Some(total) => page < total,
            // Known limitation: an exactly full last page reads as "more".
            None => returned >= limit as usize && returned > 0,
        };
    }
}
