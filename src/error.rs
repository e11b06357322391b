use crate::types::{OrderId, Side};
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors returned by `OrderBook` operations.
///
/// Every failing operation leaves the book exactly as it was before the call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderBookError {
    /// The side value is neither buy nor sell
    #[error("Invalid side: {0:?}")]
    InvalidSide(String),

    /// The size is zero or negative
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(i64),

    /// A fill is zero or larger than the order's remaining size
    #[error("Invalid fill quantity {quantity} for remaining size {remaining}")]
    InvalidFillQuantity {
        /// Quantity the caller tried to consume
        quantity: u64,
        /// Remaining size of the order
        remaining: u64,
    },

    /// The level's aggregate size would no longer fit in a `u64`
    #[error("Aggregate size of {side} level {price} would overflow")]
    QuantityOverflow {
        /// Side of the level
        side: Side,
        /// Price of the level
        price: Decimal,
    },

    /// The price is zero, negative or not representable as a decimal
    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    /// An order with this id is already live in the book
    #[error("Duplicate order id: {0}")]
    DuplicateOrderId(OrderId),

    /// No live order has this id
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// The requested 1-indexed level does not exist on that side
    #[error("Level {level} out of range for {side} side with {depth} levels")]
    LevelOutOfRange {
        /// Side that was queried
        side: Side,
        /// Requested level (1 = best)
        level: usize,
        /// Number of levels currently on that side
        depth: usize,
    },
}

/// A broken book invariant, reported by `OrderBook::check_invariants`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrityError {
    /// A level is not strictly better than the one after it
    #[error("{side} levels out of priority order at {price}")]
    UnsortedSide {
        /// Side holding the level
        side: Side,
        /// First price found out of order
        price: Decimal,
    },

    /// A level with no orders is still in its side index
    #[error("{side} level {price} is empty but still indexed")]
    EmptyLevel {
        /// Side holding the level
        side: Side,
        /// Price of the empty level
        price: Decimal,
    },

    /// A level's aggregate size differs from the sum of its queue
    #[error("{side} level {price} aggregate is {recorded}, queue holds {actual}")]
    AggregateDrift {
        /// Side holding the level
        side: Side,
        /// Price of the level
        price: Decimal,
        /// Aggregate stored on the level
        recorded: u64,
        /// Sum of the queued quantities
        actual: u64,
    },

    /// A level's order count differs from its queue length
    #[error("{side} level {price} count is {recorded}, queue holds {actual}")]
    CountDrift {
        /// Side holding the level
        side: Side,
        /// Price of the level
        price: Decimal,
        /// Count stored on the level
        recorded: usize,
        /// Number of queued orders
        actual: usize,
    },

    /// An order is queued at a level of the wrong side or price
    #[error("order {0} is queued at a level that does not match its side or price")]
    MisplacedOrder(OrderId),

    /// An order is reachable from more than one queue position
    #[error("order {0} appears in more than one queue position")]
    DuplicateHandle(OrderId),

    /// An order is in the order index but in no level queue
    #[error("order {0} is indexed but not queued at any level")]
    UnqueuedOrder(OrderId),

    /// An order is queued behind one with a later sequence number
    #[error("order {0} is queued behind a newer order")]
    SequenceRegression(OrderId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_out_of_range_message_names_side_and_depth() {
        let error = OrderBookError::LevelOutOfRange {
            side: Side::Buy,
            level: 3,
            depth: 2,
        };
        assert_eq!(
            error.to_string(),
            "Level 3 out of range for Buy side with 2 levels"
        );
    }

    #[test]
    fn invalid_fill_message_reports_values_above_i64() {
        let error = OrderBookError::InvalidFillQuantity {
            quantity: u64::MAX,
            remaining: 10,
        };
        assert_eq!(
            error.to_string(),
            "Invalid fill quantity 18446744073709551615 for remaining size 10"
        );
    }

    #[test]
    fn invalid_side_message_quotes_the_value() {
        let error = OrderBookError::InvalidSide("X".to_string());
        assert_eq!(error.to_string(), "Invalid side: \"X\"");
    }
}
