//! Local mirror of the server cart.
//!
//! Mutations are synchronous and visible to the next read. The store never
//! calls the network; pairing a local change with its remote request (and
//! undoing it when the request fails) is the job of [`crate::sync::CartSync`].

use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use thiserror::Error;

use teeshop_core::{CartItem, CartKey, Price, ProductId, Size};

/// Contract violations rejected by the cart store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CartStoreError {
    #[error("Quantity must be at least 1, got {0}")]
    InvalidQuantity(u32),
}

#[derive(Debug, Default)]
struct CartState {
    items: Vec<CartItem>,
    total_amount: Price,
}

impl CartState {
    fn position(&self, product_id: &ProductId, size: Size) -> Option<usize> {
        self.items.iter().position(|i| i.matches(product_id, size))
    }

    fn line_mut(&mut self, product_id: &ProductId, size: Size) -> Option<&mut CartItem> {
        self.items.iter_mut().find(|i| i.matches(product_id, size))
    }

    fn recompute_total(&mut self) {
        self.total_amount = self.items.iter().map(CartItem::line_total).sum();
    }
}

/// A line as it was before a mutation, for rollback.
#[derive(Debug, Clone)]
pub struct LineSnapshot {
    key: CartKey,
    line: Option<(usize, CartItem)>,
}

impl LineSnapshot {
    #[must_use]
    pub const fn key(&self) -> &CartKey {
        &self.key
    }

    /// The line that existed, if any.
    #[must_use]
    pub fn line(&self) -> Option<&CartItem> {
        self.line.as_ref().map(|(_, item)| item)
    }
}

/// Cart mirror. Cheap to clone; clones share state.
#[derive(Debug, Clone, Default)]
pub struct CartStore {
    state: Arc<RwLock<CartState>>,
}

impl CartStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, CartState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, CartState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace everything with a server payload. Trusts the server total.
    pub fn replace(&self, items: Vec<CartItem>, total_amount: Price) {
        let mut state = self.write();
        state.items = items;
        state.total_amount = total_amount;
    }

    /// Adopt a server payload except for the `pending` keys, whose local
    /// lines (or absence) are kept until their own request settles.
    ///
    /// With nothing pending this is [`CartStore::replace`].
    pub fn reconcile(&self, items: Vec<CartItem>, total_amount: Price, pending: &HashSet<CartKey>) {
        if pending.is_empty() {
            self.replace(items, total_amount);
            return;
        }
        let mut state = self.write();
        let mut local: Vec<CartItem> = state
            .items
            .iter()
            .filter(|i| pending.contains(&i.key()))
            .cloned()
            .collect();
        let mut merged = Vec::with_capacity(items.len() + local.len());
        for item in items {
            if !pending.contains(&item.key()) {
                merged.push(item);
            } else if let Some(pos) = local.iter().position(|l| l.key() == item.key()) {
                merged.push(local.remove(pos));
            }
        }
        merged.extend(local);
        state.items = merged;
        state.recompute_total();
    }

    /// Add a line, merging into an existing one with the same product and
    /// size.
    pub fn add(&self, item: CartItem) {
        let mut state = self.write();
        if let Some(line) = state.line_mut(&item.product.id, item.size) {
            line.quantity = line.quantity.saturating_add(item.quantity);
        } else {
            state.items.push(item);
        }
        state.recompute_total();
    }

    /// Overwrite a line's quantity.
    ///
    /// Returns `Ok(false)` when no such line exists.
    ///
    /// # Errors
    ///
    /// Returns `CartStoreError::InvalidQuantity` for zero; state is left
    /// untouched.
    pub fn update_quantity(
        &self,
        product_id: &ProductId,
        size: Size,
        quantity: u32,
    ) -> Result<bool, CartStoreError> {
        if quantity < 1 {
            return Err(CartStoreError::InvalidQuantity(quantity));
        }
        let mut state = self.write();
        let Some(line) = state.line_mut(product_id, size) else {
            return Ok(false);
        };
        line.quantity = quantity;
        state.recompute_total();
        Ok(true)
    }

    /// Remove a line, returning it. No-op when absent.
    pub fn remove_item(&self, product_id: &ProductId, size: Size) -> Option<CartItem> {
        let mut state = self.write();
        let idx = state.position(product_id, size)?;
        let removed = state.items.remove(idx);
        state.recompute_total();
        Some(removed)
    }

    /// Empty the cart and zero the total.
    pub fn clear(&self) {
        let mut state = self.write();
        state.items.clear();
        state.total_amount = Price::ZERO;
    }

    #[must_use]
    pub fn items(&self) -> Vec<CartItem> {
        self.read().items.clone()
    }

    #[must_use]
    pub fn total_amount(&self) -> Price {
        self.read().total_amount
    }

    #[must_use]
    pub fn get(&self, key: &CartKey) -> Option<CartItem> {
        self.read()
            .items
            .iter()
            .find(|i| i.matches(&key.product_id, key.size))
            .cloned()
    }

    /// Units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.read()
            .items
            .iter()
            .fold(0, |n, i| n.saturating_add(i.quantity))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().items.is_empty()
    }

    /// Sum of line totals from the embedded product prices.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.read().items.iter().map(CartItem::line_total).sum()
    }

    /// Capture one line (or its absence) before mutating it.
    #[must_use]
    pub fn snapshot_line(&self, key: &CartKey) -> LineSnapshot {
        let line = self
            .read()
            .items
            .iter()
            .enumerate()
            .find(|(_, i)| i.matches(&key.product_id, key.size))
            .map(|(idx, i)| (idx, i.clone()));
        LineSnapshot {
            key: key.clone(),
            line,
        }
    }

    /// Put a line back the way the snapshot saw it.
    ///
    /// Only the snapshot's key is touched, so changes to other lines made
    /// in the meantime survive.
    pub fn restore_line(&self, snapshot: LineSnapshot) {
        let mut state = self.write();
        if let Some(idx) = state.position(&snapshot.key.product_id, snapshot.key.size) {
            state.items.remove(idx);
        }
        if let Some((idx, item)) = snapshot.line {
            let idx = idx.min(state.items.len());
            state.items.insert(idx, item);
        }
        state.recompute_total();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;
    use teeshop_core::{Product, SizeStock};

    pub(crate) fn product(id: &str, price: i64, stock: u32) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Tee {id}"),
            slug: None,
            description: None,
            price: Price::from_rupees(price),
            image_url: String::new(),
            category: "Graphic".to_string(),
            sizes: Size::ALL
                .into_iter()
                .map(|size| SizeStock { size, stock })
                .collect(),
            sales_count: None,
            average_rating: None,
            total_ratings: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn line(id: &str, size: Size, quantity: u32) -> CartItem {
        CartItem::new(product(id, 1000, 10), size, quantity)
    }

    #[test]
    fn test_add_saturates_quantity() {
        let cart = CartStore::new();
        cart.add(line("P1", Size::Large, u32::MAX));
        cart.add(line("P1", Size::Large, 5));
        cart.add(line("P2", Size::Large, 1));

        assert_eq!(
            cart.get(&CartKey::new("P1", Size::Large)).unwrap().quantity,
            u32::MAX
        );
        assert_eq!(cart.item_count(), u32::MAX);
    }

    #[test]
    fn test_reconcile_keeps_pending_lines() {
        let cart = CartStore::new();
        cart.add(line("P1", Size::Large, 1));
        cart.add(line("P2", Size::Large, 3));
        cart.add(line("P3", Size::Large, 1));

        // Server knows P1 and an older P3; P2 is still being added and P3
        // is still being removed locally.
        cart.remove_item(&ProductId::new("P3"), Size::Large);
        let server = vec![line("P1", Size::Large, 2), line("P3", Size::Large, 1)];
        let pending = HashSet::from([
            CartKey::new("P2", Size::Large),
            CartKey::new("P3", Size::Large),
        ]);
        cart.reconcile(server, Price::from_rupees(3000), &pending);

        let lines: Vec<_> = cart
            .items()
            .iter()
            .map(|i| (i.product.id.to_string(), i.quantity))
            .collect();
        assert_eq!(lines, vec![("P1".to_string(), 2), ("P2".to_string(), 3)]);
        assert_eq!(cart.total_amount(), Price::from_rupees(5000));
    }

    #[test]
    fn test_reconcile_without_pending_trusts_server() {
        let cart = CartStore::new();
        cart.add(line("P1", Size::Large, 1));
        cart.reconcile(
            vec![line("P9", Size::Small, 2)],
            Price::from_rupees(1999),
            &HashSet::new(),
        );

        assert!(cart.get(&CartKey::new("P1", Size::Large)).is_none());
        assert_eq!(cart.total_amount(), Price::from_rupees(1999));
    }

    #[test]
    fn test_add_merges_same_key() {
        let cart = CartStore::new();
        cart.add(line("P1", Size::Large, 2));
        cart.add(line("P1", Size::Large, 3));

        let items = cart.items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 5);
        assert_eq!(cart.total_amount(), Price::from_rupees(5000));
    }

    #[test]
    fn test_add_many_sums_quantities() {
        let cart = CartStore::new();
        for qty in [1, 4, 2, 7] {
            cart.add(line("P1", Size::Small, qty));
        }
        cart.add(line("P1", Size::Large, 1));

        assert_eq!(cart.items().len(), 2);
        assert_eq!(
            cart.get(&CartKey::new("P1", Size::Small)).unwrap().quantity,
            14
        );
        assert_eq!(cart.item_count(), 15);
    }

    #[test]
    fn test_missing_key_is_noop() {
        let cart = CartStore::new();
        cart.add(line("P1", Size::Large, 2));
        let before = cart.items();

        assert!(cart.remove_item(&ProductId::new("P2"), Size::Large).is_none());
        assert!(!cart
            .update_quantity(&ProductId::new("P1"), Size::Small, 4)
            .unwrap());
        assert_eq!(cart.items(), before);
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let cart = CartStore::new();
        cart.add(line("P1", Size::Large, 2));
        let before = cart.items();

        assert_eq!(
            cart.update_quantity(&ProductId::new("P1"), Size::Large, 0),
            Err(CartStoreError::InvalidQuantity(0))
        );
        assert_eq!(cart.items(), before);
    }

    #[test]
    fn test_update_and_remove() {
        let cart = CartStore::new();
        cart.add(line("P1", Size::Large, 2));
        cart.add(line("P2", Size::Small, 1));

        assert!(cart
            .update_quantity(&ProductId::new("P1"), Size::Large, 4)
            .unwrap());
        assert_eq!(cart.total_amount(), Price::from_rupees(5000));

        let removed = cart.remove_item(&ProductId::new("P1"), Size::Large).unwrap();
        assert_eq!(removed.quantity, 4);
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.total_amount(), Price::from_rupees(1000));
    }

    #[test]
    fn test_clear_always_empties() {
        let cart = CartStore::new();
        cart.clear();
        assert!(cart.is_empty());

        cart.replace(vec![line("P1", Size::Large, 2)], Price::from_rupees(1800));
        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.total_amount(), Price::ZERO);
    }

    #[test]
    fn test_replace_trusts_server_total() {
        let cart = CartStore::new();
        cart.replace(vec![line("P1", Size::Large, 2)], Price::from_rupees(1800));
        assert_eq!(cart.total_amount(), Price::from_rupees(1800));
        assert_eq!(cart.subtotal(), Price::from_rupees(2000));
    }

    #[test]
    fn test_restore_line_puts_back_at_position() {
        let cart = CartStore::new();
        cart.add(line("P1", Size::Large, 1));
        cart.add(line("P2", Size::Large, 1));
        cart.add(line("P3", Size::Large, 1));

        let key = CartKey::new("P2", Size::Large);
        let snapshot = cart.snapshot_line(&key);
        cart.remove_item(&key.product_id, key.size);
        cart.restore_line(snapshot);

        let ids: Vec<_> = cart
            .items()
            .iter()
            .map(|i| i.product.id.to_string())
            .collect();
        assert_eq!(ids, vec!["P1", "P2", "P3"]);
        assert_eq!(cart.total_amount(), Price::from_rupees(3000));
    }

    #[test]
    fn test_restore_absent_line_removes_it() {
        let cart = CartStore::new();
        cart.add(line("P1", Size::Large, 1));

        let key = CartKey::new("P2", Size::Small);
        let snapshot = cart.snapshot_line(&key);
        assert!(snapshot.line().is_none());

        cart.add(line("P2", Size::Small, 2));
        cart.update_quantity(&ProductId::new("P1"), Size::Large, 3)
            .unwrap();
        cart.restore_line(snapshot);

        assert!(cart.get(&key).is_none());
        // The unrelated change to P1 is kept.
        assert_eq!(
            cart.get(&CartKey::new("P1", Size::Large)).unwrap().quantity,
            3
        );
    }
}
