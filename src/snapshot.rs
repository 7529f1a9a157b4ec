//! The snapshot builder — `SPEC_FULL.md` §4.4.
//!
//! Grounded on `original_source/OrderBook/MarketDataSnapshot.h`: a `std::array` of two
//! price-ordered multi-index containers, one per side, built by copying every record under
//! a single multi-lock acquisition spanning both stores. Reimplemented as two plain `Vec`s —
//! `IndexedStore::iterate_all` already yields ascending-by-price order, and `IncomingStore`
//! contributes whatever hasn't reached `book` yet, so a merge sort isn't needed: every
//! incoming order is strictly newer (by id) than, and independent in price from, nothing in
//! particular — it just gets appended and the two are sorted by price together.

use crate::order::{OrderData, Side};
use crate::store::{IncomingStore, IndexedStore};

/// A consistent, independently owned view of both stores at one instant.
///
/// Every `OrderData` in here is a deep copy (`OrderData::deep_copy`) — nothing aliases live
/// store state, so callers can hold a `Snapshot` indefinitely without blocking the engine.
#[derive(Debug, Default)]
pub struct Snapshot {
    pub asks: Vec<OrderData>,
    pub bids: Vec<OrderData>,
}

impl Snapshot {
    pub fn side(&self, side: Side) -> &[OrderData] {
        match side {
            Side::Ask => &self.asks,
            Side::Bid => &self.bids,
        }
    }

    /// Build from both stores. Callers are expected to hold both locks (shared is enough)
    /// for the duration of this call — see `crate::engine::OrderBookEngine::get_snapshot`.
    pub fn build(book: &IndexedStore, incoming: &IncomingStore) -> Snapshot {
        let mut asks = Vec::new();
        let mut bids = Vec::new();

        for data in book.iterate_all() {
            push_copy(data, &mut asks, &mut bids);
        }
        for data in incoming.iterate_all() {
            push_copy(data, &mut asks, &mut bids);
        }

        asks.sort_by_key(|d| d.price());
        bids.sort_by_key(|d| d.price());

        Snapshot { asks, bids }
    }
}

fn push_copy(data: &OrderData, asks: &mut Vec<OrderData>, bids: &mut Vec<OrderData>) {
    match data.side() {
        Side::Ask => asks.push(data.deep_copy()),
        Side::Bid => bids.push(data.deep_copy()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::{Order, OrderId};
    use rust_decimal::Decimal;

    #[test]
    fn combines_book_and_incoming_price_ascending() {
        let mut book = IndexedStore::new();
        let mut incoming = IncomingStore::new();
        let mut next = OrderId::ZERO;

        for price in [5, 1] {
            next = next.next();
            book.insert(OrderData::new(
                next,
                Order::new(Side::Bid, Decimal::new(price, 0), 300),
            ));
        }
        next = next.next();
        incoming.insert(OrderData::new(
            next,
            Order::new(Side::Bid, Decimal::new(10, 0), 300),
        ));

        let snapshot = Snapshot::build(&book, &incoming);
        let prices: Vec<_> = snapshot.bids.iter().map(|d| d.price()).collect();
        assert_eq!(
            prices,
            vec![Decimal::new(1, 0), Decimal::new(5, 0), Decimal::new(10, 0)]
        );
        assert!(snapshot.asks.is_empty());
    }
}
