//! The public façade — `SPEC_FULL.md` §2, §4.5, §6.
//!
//! Grounded on `original_source/OrderBook/OrderBook.h`'s `OrderBook` class: `post`, `cancel`,
//! `get_data`, `get_snapshot` as the only four operations a caller ever sees, with matching
//! itself happening asynchronously on the task executor. The fixed lock order — `book` always
//! taken before `incoming` whenever both are needed — is documented at the two call sites that
//! need it (`post`, `get_snapshot`); `merge` (`crate::matcher`) never holds both at once, so
//! there is no third site and no possibility of a reversed-order cycle.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::matcher;
use crate::order::{Order, OrderData, OrderId};
use crate::snapshot::Snapshot;
use crate::store::{BookState, IncomingStore};
use crate::worker::TaskWorker;

/// The order book engine: resting book, in-flight incoming orders, and the worker that
/// reconciles them.
///
/// `book` and `incoming` are each wrapped in an `Arc` so `post` can hand the matcher a
/// `'static` closure to run on the worker thread without the engine needing to be wrapped
/// in an `Arc` itself at the call site.
pub struct OrderBookEngine {
    book: Arc<RwLock<BookState>>,
    incoming: Arc<RwLock<IncomingStore>>,
    worker: TaskWorker,
}

impl OrderBookEngine {
    pub fn new() -> Self {
        Self {
            book: Arc::new(RwLock::new(BookState::new())),
            incoming: Arc::new(RwLock::new(IncomingStore::new())),
            worker: TaskWorker::start(),
        }
    }

    /// Accept `order`, assign it an id, and queue it for matching. Returns immediately; the
    /// actual settlement happens on the worker thread (§4.2, §5).
    ///
    /// Lock order: `book` then `incoming`, both held exclusively for the whole of id
    /// allocation + insertion — the same fixed order `get_snapshot` uses for its shared
    /// locks below. Holding both together (rather than releasing `book` before taking
    /// `incoming`) is what makes id assignment and the `incoming` insert atomic with respect
    /// to other `post` callers, which is what gives `merge` tasks their FIFO-by-id submission
    /// order (§5 ordering guarantee #2).
    pub fn post(&self, order: Order) -> OrderId {
        let id = {
            let mut book = self.book.write();
            let mut incoming = self.incoming.write();
            let id = book.allocate_id();
            incoming.insert(OrderData::new(id, order));
            id
        };

        debug!(%id, "post: queued for matching");
        self.submit_merge(id);
        id
    }

    fn submit_merge(&self, id: OrderId) {
        let book = Arc::clone(&self.book);
        let incoming = Arc::clone(&self.incoming);
        let cancel = self.worker.cancellation_token();

        self.worker.submit(move || {
            matcher::merge(id, &book, &incoming, &cancel);
        });
    }

    /// Cancel `id` if it is still live, in either store, and hand back the order that was
    /// removed (§6: `cancel(id) -> OrderData or absent`). Idempotent: cancelling an id that
    /// has already settled or already been cancelled is not an error (§4.3), it is absent.
    ///
    /// Probes `book` before `incoming`, matching `get_data` and the fixed lock order above.
    pub fn cancel(&self, id: OrderId) -> EngineResult<OrderData> {
        if let Some(data) = self.book.write().store.erase_by_id(id) {
            return Ok(data);
        }
        if let Some(data) = self.incoming.write().erase_by_id(id) {
            return Ok(data);
        }
        Err(EngineError::NotFound(id))
    }

    /// A deep copy of one order's current state, wherever it currently lives.
    ///
    /// Probes `book` before `incoming`, per §4.3. A record with `quantity == 0` is
    /// satisfied and must be treated as absent (§4.3, §6, §9) — in the window between the
    /// matcher zeroing a candidate's quantity and the reconcile step erasing it
    /// (`crate::matcher`), a satisfied order can transiently still be present in `book`.
    pub fn get_data(&self, id: OrderId) -> EngineResult<OrderData> {
        if let Some(data) = self.book.read().store.find_by_id(id) {
            if !data.is_satisfied() {
                return Ok(data.deep_copy());
            }
        } else if let Some(data) = self.incoming.read().find_by_id(id) {
            if !data.is_satisfied() {
                return Ok(data.deep_copy());
            }
        }
        Err(EngineError::NotFound(id))
    }

    /// A consistent snapshot across both stores (§4.4).
    ///
    /// Lock order: `book` then `incoming`, both held only as shared reads for the duration
    /// of the copy — the same fixed order as `post`, so the two can never deadlock against
    /// each other.
    pub fn get_snapshot(&self) -> Snapshot {
        let book = self.book.read();
        let incoming = self.incoming.read();
        Snapshot::build(&book.store, &incoming)
    }

    /// A clone of the worker's cancellation token, for callers that want to observe or
    /// trigger shutdown alongside the engine (e.g. the CLI's ctrl-c handler).
    pub fn cancellation_token(&self) -> CancellationToken {
        self.worker.cancellation_token()
    }
}

impl Default for OrderBookEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::Side;
    use rust_decimal::Decimal;
    use std::thread;
    use std::time::Duration;

    /// The worker is single-threaded FIFO, so giving it a fixed short window after a `post`
    /// is enough for tests: every task queued before this call has already finished.
    fn settle(_engine: &OrderBookEngine, _id: OrderId) {
        thread::sleep(Duration::from_millis(50));
    }

    #[test]
    fn place_then_cancel_is_gone_after_settling() {
        let engine = OrderBookEngine::new();
        let id = engine.post(Order::new(Side::Bid, Decimal::new(10, 0), 5));
        let cancelled = engine.cancel(id).unwrap();
        assert_eq!(cancelled.order.side, Side::Bid);
        assert_eq!(cancelled.order.price, Decimal::new(10, 0));
        assert_eq!(cancelled.order.quantity, 5);
        settle(&engine, id);
        assert!(engine.get_data(id).is_err());
    }

    #[test]
    fn cancelling_an_unknown_id_is_not_found() {
        let engine = OrderBookEngine::new();
        let bogus = engine.post(Order::new(Side::Bid, Decimal::new(10, 0), 1));
        settle(&engine, bogus);
        engine.cancel(bogus).unwrap();
        assert_eq!(
            engine.cancel(bogus),
            Err(EngineError::NotFound(bogus))
        );
    }

    #[test]
    fn crossing_orders_trade_and_leave_no_residual() {
        let engine = OrderBookEngine::new();
        let ask = engine.post(Order::new(Side::Ask, Decimal::new(10, 0), 5));
        settle(&engine, ask);
        let bid = engine.post(Order::new(Side::Bid, Decimal::new(10, 0), 5));
        settle(&engine, bid);

        assert!(engine.get_data(ask).is_err());
        assert!(engine.get_data(bid).is_err());
        assert_eq!(engine.get_snapshot().asks.len(), 0);
        assert_eq!(engine.get_snapshot().bids.len(), 0);
    }

    #[test]
    fn partial_fill_leaves_residual_on_the_larger_order() {
        let engine = OrderBookEngine::new();
        let ask = engine.post(Order::new(Side::Ask, Decimal::new(10, 0), 10));
        settle(&engine, ask);
        let bid = engine.post(Order::new(Side::Bid, Decimal::new(10, 0), 4));
        settle(&engine, bid);

        assert!(engine.get_data(bid).is_err());
        let remaining = engine.get_data(ask).unwrap();
        assert_eq!(remaining.order.quantity, 6);
    }

    #[test]
    fn price_time_priority_fills_the_earlier_id_first() {
        let engine = OrderBookEngine::new();
        let first = engine.post(Order::new(Side::Ask, Decimal::new(10, 0), 5));
        settle(&engine, first);
        let second = engine.post(Order::new(Side::Ask, Decimal::new(10, 0), 5));
        settle(&engine, second);

        let bid = engine.post(Order::new(Side::Bid, Decimal::new(10, 0), 5));
        settle(&engine, bid);

        assert!(engine.get_data(first).is_err());
        let untouched = engine.get_data(second).unwrap();
        assert_eq!(untouched.order.quantity, 5);
    }

    #[test]
    fn snapshot_orders_each_side_by_price_ascending() {
        let engine = OrderBookEngine::new();
        let high = engine.post(Order::new(Side::Ask, Decimal::new(20, 0), 5));
        let low = engine.post(Order::new(Side::Ask, Decimal::new(5, 0), 5));
        settle(&engine, high);
        settle(&engine, low);

        let snapshot = engine.get_snapshot();
        let prices: Vec<_> = snapshot.asks.iter().map(|d| d.price()).collect();
        assert_eq!(prices, vec![Decimal::new(5, 0), Decimal::new(20, 0)]);
    }
}
