//! The `merge(id)` algorithm — `SPEC_FULL.md` §4.2.
//!
//! Grounded line-for-line on `original_source/OrderBook/OrderBook.cpp`'s `OrderBook::_merge`:
//! remove the arriving order from `incoming` under an exclusive hold, release it, then walk
//! the opposite side of `book` under an upgradable hold, upgrading to exclusive only to trade
//! and downgrading back before the next cancellation checkpoint. The one deliberate
//! departure from the source is the candidate-selection predicate (§4.2, §9): this filters to
//! `quantity > 0` before taking the minimum by id instead of folding both checks into one
//! comparator, which is what made the original's `std::min_element` unsound.

use parking_lot::{RwLock, RwLockUpgradableReadGuard, RwLockWriteGuard};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::order::{OrderId, other_side};
use crate::store::{BookState, IncomingStore, order_data};

/// Runs one settlement pass for `id`. Invoked by the task worker; never called directly by
/// a public operation (those only ever `submit` it).
pub fn merge(
    id: OrderId,
    book: &RwLock<BookState>,
    incoming: &RwLock<IncomingStore>,
    cancel: &CancellationToken,
) {
    // Step 1-2: pull the arriving order out of `incoming`, releasing the lock immediately.
    let mut new_order = {
        let mut incoming = incoming.write();
        match incoming.erase_by_id(id) {
            Some(data) => data,
            // The order was cancelled before we got to it. Nothing to do.
            None => {
                trace!(%id, "merge: no such order in incoming, already cancelled");
                return;
            }
        }
    };

    let opposite = other_side(new_order.side());
    let price = new_order.price();

    let mut satisfied_ids: Vec<OrderId> = Vec::new();
    let mut book_guard = book.upgradable_read();

    loop {
        if new_order.is_satisfied() {
            break;
        }
        if cancel.is_cancelled() {
            debug!(%id, "merge: interrupted mid-match, aborting without reconciling");
            return;
        }

        let mut write_guard = RwLockUpgradableReadGuard::upgrade(book_guard);
        let Some(candidate_id) = write_guard.store.best_candidate(price, opposite) else {
            book_guard = RwLockWriteGuard::downgrade_to_upgradable(write_guard);
            break;
        };

        // Both halves of the trade live in `write_guard.store` already; this is the only
        // place resting quantities are ever mutated (§5).
        let traded_out = {
            let candidate = write_guard
                .store
                .find_by_id_mut(candidate_id)
                .expect("best_candidate returned an id not present in the store");
            let quantity = new_order.order.quantity.min(candidate.order.quantity);
            new_order.order.quantity -= quantity;
            candidate.order.quantity -= quantity;
            candidate.is_satisfied()
        };
        if traded_out {
            satisfied_ids.push(candidate_id);
        }

        book_guard = RwLockWriteGuard::downgrade_to_upgradable(write_guard);
    }

    // Step 6: reconcile. One final upgrade, erase satisfied resting orders, insert the
    // residual (if any).
    let mut write_guard = RwLockUpgradableReadGuard::upgrade(book_guard);
    for satisfied_id in satisfied_ids {
        write_guard.store.erase_by_id(satisfied_id);
    }
    if new_order.order.quantity > 0 {
        write_guard
            .store
            .insert(order_data(new_order.id, new_order.order));
    }
}
