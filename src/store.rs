//! The indexed, multi-key container described in `SPEC_FULL.md` §4.1.
//!
//! Grounded on `original_source/OrderBook/OrderBook.h`'s
//! `boost::multi_index_container<OrderData, indexed_by<hashed_unique<id>,
//! hashed_non_unique<composite_key<price, type>>>>`. Reimplemented with a `HashMap` for the
//! id index and a `BTreeMap<(Decimal, Side), BTreeSet<OrderId>>` for the price/side index.
//! Keying the inner set by `OrderId` rather than insertion order buys two things at once:
//! ascending-by-id iteration (the matching priority rule, §4.2) and ascending-by-price
//! iteration of the outer map (the snapshot builder, §4.4), without maintaining a third
//! structure.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use rust_decimal::Decimal;

use crate::order::{Order, OrderData, OrderId, Side};

/// The resting book: full three-index container (id, side via the composite key, and
/// price-ordered traversal).
#[derive(Default)]
pub struct IndexedStore {
    by_id: HashMap<OrderId, OrderData>,
    by_price_side: BTreeMap<(Decimal, Side), BTreeSet<OrderId>>,
}

impl IndexedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Precondition: `data.id` is absent. Violating this is an `InvariantViolation`.
    pub fn insert(&mut self, data: OrderData) {
        debug_assert!(
            !data.is_satisfied(),
            "invariant violation: id {} inserted into the book already satisfied",
            data.id
        );
        let key = (data.price(), data.side());
        let id = data.id;
        let prior = self.by_id.insert(id, data);
        debug_assert!(
            prior.is_none(),
            "invariant violation: id {id} inserted twice into the book"
        );
        self.by_price_side.entry(key).or_default().insert(id);
    }

    pub fn find_by_id(&self, id: OrderId) -> Option<&OrderData> {
        self.by_id.get(&id)
    }

    pub fn find_by_id_mut(&mut self, id: OrderId) -> Option<&mut OrderData> {
        self.by_id.get_mut(&id)
    }

    pub fn contains(&self, id: OrderId) -> bool {
        self.by_id.contains_key(&id)
    }

    pub fn erase_by_id(&mut self, id: OrderId) -> Option<OrderData> {
        let removed = self.by_id.remove(&id)?;
        let key = (removed.price(), removed.side());
        if let Some(set) = self.by_price_side.get_mut(&key) {
            set.remove(&id);
            if set.is_empty() {
                self.by_price_side.remove(&key);
            }
        }
        Some(removed)
    }

    /// Candidate ids at `(price, side)`, ascending by id — the priority order the matcher
    /// scans in. Does not filter by quantity; callers check satisfaction themselves, since
    /// that check must happen under the same write hold that then mutates the quantity.
    pub fn candidate_ids(&self, price: Decimal, side: Side) -> impl Iterator<Item = OrderId> + '_ {
        self.by_price_side
            .get(&(price, side))
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    /// The smallest id at `(price, side)` whose quantity is still non-zero — the priority
    /// rule from §4.2, filter-then-minimum rather than the buggy comparator it replaces.
    pub fn best_candidate(&self, price: Decimal, side: Side) -> Option<OrderId> {
        self.candidate_ids(price, side)
            .find(|id| !self.by_id[id].is_satisfied())
    }

    /// Ascending-by-price traversal of every resting order, for the snapshot builder.
    pub fn iterate_all(&self) -> impl Iterator<Item = &OrderData> + '_ {
        self.by_price_side
            .values()
            .flat_map(move |ids| ids.iter().map(move |id| &self.by_id[id]))
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// The in-flight store: orders that have been accepted by `post` but not yet processed by
/// the matcher. Only the id index is load-bearing (cancel and merge both look up by id);
/// the side is still carried per-record since `OrderData` already carries it.
#[derive(Default)]
pub struct IncomingStore {
    by_id: HashMap<OrderId, OrderData>,
}

impl IncomingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, data: OrderData) {
        let id = data.id;
        let prior = self.by_id.insert(id, data);
        debug_assert!(
            prior.is_none(),
            "invariant violation: id {id} inserted twice into incoming"
        );
    }

    pub fn find_by_id(&self, id: OrderId) -> Option<&OrderData> {
        self.by_id.get(&id)
    }

    pub fn erase_by_id(&mut self, id: OrderId) -> Option<OrderData> {
        self.by_id.remove(&id)
    }

    pub fn iterate_all(&self) -> impl Iterator<Item = &OrderData> + '_ {
        self.by_id.values()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }
}

/// The state protected by the `book` lock: the resting order store plus the id counter.
/// Bundled together because both are only ever mutated under `book`'s exclusive hold
/// (`post` bumps the counter, the matcher mutates the store) — see §5.
pub struct BookState {
    pub store: IndexedStore,
    pub next_id: OrderId,
}

impl BookState {
    pub fn new() -> Self {
        Self {
            store: IndexedStore::new(),
            next_id: OrderId::ZERO,
        }
    }

    /// Allocate the next id. Only ever called from `post`, which already holds the
    /// exclusive lock this state lives behind.
    pub fn allocate_id(&mut self) -> OrderId {
        self.next_id = self.next_id.next();
        self.next_id
    }
}

impl Default for BookState {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience used by the matcher to build a fresh `OrderData` for an id it already owns.
pub fn order_data(id: OrderId, order: Order) -> OrderData {
    OrderData::new(id, order)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(side: Side, price: i64, qty: u64) -> Order {
        Order::new(side, Decimal::new(price, 0), qty)
    }

    #[test]
    fn insert_then_find_by_id() {
        let mut store = IndexedStore::new();
        let id = OrderId::ZERO.next();
        store.insert(OrderData::new(id, order(Side::Ask, 4, 300)));
        assert_eq!(store.find_by_id(id).unwrap().order.quantity, 300);
    }

    #[test]
    fn erase_prunes_empty_price_level() {
        let mut store = IndexedStore::new();
        let id = OrderId::ZERO.next();
        store.insert(OrderData::new(id, order(Side::Ask, 4, 300)));
        store.erase_by_id(id);
        assert!(store.is_empty());
        assert!(
            store
                .candidate_ids(Decimal::new(4, 0), Side::Ask)
                .next()
                .is_none()
        );
    }

    #[test]
    fn best_candidate_skips_satisfied_ids() {
        let mut store = IndexedStore::new();
        let low = OrderId::ZERO.next();
        let high = low.next();
        // Insert both resting (quantity > 0), as `insert` requires, then drive `low` to
        // satisfied the way the matcher does: decrement its quantity in place rather than
        // ever inserting an already-zeroed record.
        store.insert(OrderData::new(low, order(Side::Bid, 4, 3)));
        store.insert(OrderData::new(high, order(Side::Bid, 4, 10)));
        store.find_by_id_mut(low).unwrap().order.quantity = 0;
        assert_eq!(
            store.best_candidate(Decimal::new(4, 0), Side::Bid),
            Some(high)
        );
    }

    #[test]
    fn iterate_all_is_price_ascending() {
        let mut store = IndexedStore::new();
        let mut next = OrderId::ZERO;
        for price in [5, 1, 10] {
            next = next.next();
            store.insert(OrderData::new(next, order(Side::Bid, price, 300)));
        }
        let prices: Vec<_> = store.iterate_all().map(|d| d.price()).collect();
        assert_eq!(
            prices,
            vec![Decimal::new(1, 0), Decimal::new(5, 0), Decimal::new(10, 0)]
        );
    }
}
