//! Local mirror of the wishlist with O(1) membership.

use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use teeshop_core::{Product, ProductId, WishlistEntry};

#[derive(Debug, Default)]
struct WishlistState {
    items: Vec<Product>,
    index: HashSet<ProductId>,
}

impl WishlistState {
    fn reindex(&mut self) {
        self.index = self.items.iter().map(|p| p.id.clone()).collect();
    }
}

/// An entry as it was before a mutation, for rollback.
#[derive(Debug, Clone)]
pub struct EntrySnapshot {
    product_id: ProductId,
    entry: Option<(usize, Product)>,
}

/// Wishlist mirror keyed by product id. Cheap to clone; clones share state.
#[derive(Debug, Clone, Default)]
pub struct WishlistStore {
    state: Arc<RwLock<WishlistState>>,
}

impl WishlistStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, WishlistState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, WishlistState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace everything. Later duplicates of an id are dropped.
    pub fn replace(&self, items: Vec<Product>) {
        let mut seen = HashSet::with_capacity(items.len());
        let items: Vec<_> = items
            .into_iter()
            .filter(|p| seen.insert(p.id.clone()))
            .collect();

        let mut state = self.write();
        state.items = items;
        state.reindex();
    }

    /// Replace from server entries, skipping deleted products.
    pub fn replace_from_entries(&self, entries: Vec<Option<WishlistEntry>>) {
        self.replace(
            entries
                .into_iter()
                .flatten()
                .filter_map(|entry| entry.product)
                .collect(),
        );
    }

    /// Add a product. Returns `false` if it was already saved.
    pub fn add(&self, product: Product) -> bool {
        let mut state = self.write();
        if !state.index.insert(product.id.clone()) {
            return false;
        }
        state.items.push(product);
        true
    }

    /// Remove by id, returning the product. No-op when absent.
    pub fn remove_item(&self, product_id: &ProductId) -> Option<Product> {
        let mut state = self.write();
        if !state.index.remove(product_id) {
            return None;
        }
        let idx = state.items.iter().position(|p| &p.id == product_id)?;
        Some(state.items.remove(idx))
    }

    #[must_use]
    pub fn is_in_wishlist(&self, product_id: &ProductId) -> bool {
        self.read().index.contains(product_id)
    }

    #[must_use]
    pub fn items(&self) -> Vec<Product> {
        self.read().items.clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.read().items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().items.is_empty()
    }

    pub fn clear(&self) {
        let mut state = self.write();
        state.items.clear();
        state.index.clear();
    }

    #[must_use]
    pub fn snapshot(&self, product_id: &ProductId) -> EntrySnapshot {
        let entry = self
            .read()
            .items
            .iter()
            .enumerate()
            .find(|(_, p)| &p.id == product_id)
            .map(|(idx, p)| (idx, p.clone()));
        EntrySnapshot {
            product_id: product_id.clone(),
            entry,
        }
    }

    /// Put one entry back the way the snapshot saw it.
    pub fn restore(&self, snapshot: EntrySnapshot) {
        let mut state = self.write();
        state.items.retain(|p| p.id != snapshot.product_id);
        if let Some((idx, product)) = snapshot.entry {
            let idx = idx.min(state.items.len());
            state.items.insert(idx, product);
        }
        state.reindex();
    }
}
