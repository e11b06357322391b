//! A single-instrument limit order book core that maintains price-time
//! priority under add, modify and remove events.
//!
//! ## Architecture
//!
//! The book keeps two indices in lockstep:
//!
//! 1. An order index that owns every live `Order`, keyed by order id. Records
//!    live in a slab arena, so each one has a stable handle.
//! 2. One side index per side, mapping prices to price levels in a `BTreeMap`.
//!    Each level keeps its aggregate size and order count next to an intrusive
//!    FIFO queue of handles into the order index.
//!
//! A level never owns an order, it only links handles. Removing an order
//! unlinks its handle from the queue before dropping the record, and a level
//! whose last order leaves is deleted on the spot.
//!
//! Time priority comes from a logical sequence counter assigned on insertion,
//! never from a wall clock.
//!
//! ## Example Usage
//!
//! ```rust
//! use limit_order_book::{OrderBook, OrderBookError, Side};
//! use rust_decimal::Decimal;
//!
//! let mut order_book = OrderBook::new("GOOG");
//!
//! order_book.add(1, Side::Buy, Decimal::new(454, 1), 100)?;
//! order_book.add(2, Side::Buy, Decimal::new(453, 1), 200)?;
//! order_book.add(3, Side::Buy, Decimal::new(454, 1), 300)?;
//! order_book.add(4, Side::Buy, Decimal::new(459, 1), 100)?;
//! order_book.add(5, Side::Buy, Decimal::new(459, 1), 10)?;
//! order_book.remove(2)?;
//!
//! assert_eq!(order_book.get_price(Side::Buy, 1)?, Decimal::new(459, 1));
//! assert_eq!(order_book.get_size(Side::Buy, 1)?, 110);
//! assert_eq!(order_book.get_price(Side::Buy, 2)?, Decimal::new(454, 1));
//! assert_eq!(order_book.get_size(Side::Buy, 2)?, 400);
//! assert!(matches!(
//!     order_book.get_price(Side::Buy, 3),
//!     Err(OrderBookError::LevelOutOfRange { .. })
//! ));
//! # Ok::<(), OrderBookError>(())
//! ```
//!
//! Mutations take `&mut self`. To share one book across threads, use
//! `SharedOrderBook`, which serializes every call behind a single lock.
//!
//! On the performance side, finding, inserting and deleting a level is
//! $O(\log{N})$ in the number of levels thanks to the `BTreeMap`, and appending
//! or cancelling an order inside a level is $O(1)$.

mod error;
mod order_book;
mod order_index;
mod price_level;
mod shared;
mod side_index;
mod types;

// Re-export public API
pub use error::{IntegrityError, OrderBookError};
pub use order_book::OrderBook;
pub use shared::SharedOrderBook;
pub use types::{price_from_f64, IntoSide, LevelSummary, Order, OrderId, Side};

// Re-export commonly used external dependencies
pub use parking_lot::Mutex;
pub use rust_decimal::Decimal;
