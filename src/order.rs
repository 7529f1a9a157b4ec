use rust_decimal::Decimal;
use std::fmt;

/// Which side of the book an order rests on.
///
/// Only two variants exist on purpose: [`other_side`] is an exhaustive match with no
/// wildcard arm, so adding a third side is a compile error here rather than a silent
/// matching-logic bug.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Ask,
    Bid,
}

/// The opposite side an order of `side` can merge against.
pub fn other_side(side: Side) -> Side {
    match side {
        Side::Ask => Side::Bid,
        Side::Bid => Side::Ask,
    }
}

/// A monotonically increasing order identifier.
///
/// 128 bits, not the textbook 256 — see `SPEC_FULL.md` §3 for why a literal 256-bit
/// integer type was rejected. A `u128` counter cannot realistically exhaust within the
/// lifetime of a running engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OrderId(u128);

impl OrderId {
    pub const ZERO: OrderId = OrderId(0);

    /// The id that follows this one. Only ever called under `post`'s exclusive hold.
    pub fn next(self) -> OrderId {
        OrderId(self.0 + 1)
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An immutable limit order: side, price, and quantity.
///
/// Quantity is the one field that mutates in place while the order rests in a store —
/// matching decrements it directly rather than replacing the whole `Order`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub side: Side,
    pub price: Decimal,
    pub quantity: u64,
}

impl Order {
    pub fn new(side: Side, price: Decimal, quantity: u64) -> Self {
        Self {
            side,
            price,
            quantity,
        }
    }

    pub fn is_satisfied(&self) -> bool {
        self.quantity == 0
    }
}

/// An owned `{id, order}` pair as it lives inside a store.
///
/// Move-only by convention: the only sanctioned copy path is [`OrderData::deep_copy`],
/// reserved for `get_data` and snapshot construction, mirroring `OrderData`'s explicit
/// copy constructor in the C++ source this is distilled from (a deep clone of the order,
/// never an aliasing copy of live state).
#[derive(Debug, PartialEq, Eq)]
pub struct OrderData {
    pub id: OrderId,
    pub order: Order,
}

impl OrderData {
    pub fn new(id: OrderId, order: Order) -> Self {
        Self { id, order }
    }

    pub fn price(&self) -> Decimal {
        self.order.price
    }

    pub fn side(&self) -> Side {
        self.order.side
    }

    pub fn is_satisfied(&self) -> bool {
        self.order.is_satisfied()
    }

    /// Produce an independent owned copy. Never aliases the store it was read from.
    pub fn deep_copy(&self) -> OrderData {
        OrderData {
            id: self.id,
            order: self.order.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn other_side_is_the_complement() {
        assert_eq!(other_side(Side::Ask), Side::Bid);
        assert_eq!(other_side(Side::Bid), Side::Ask);
    }

    #[test]
    fn deep_copy_does_not_alias() {
        let data = OrderData::new(
            OrderId::ZERO.next(),
            Order::new(Side::Ask, Decimal::new(40, 1), 300),
        );
        let mut copy = data.deep_copy();
        copy.order.quantity = 0;
        assert_eq!(data.order.quantity, 300);
    }

    #[test]
    fn id_sequence_is_strictly_increasing() {
        let a = OrderId::ZERO.next();
        let b = a.next();
        assert!(a < b);
    }
}
