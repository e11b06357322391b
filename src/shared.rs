use crate::error::OrderBookError;
use crate::order_book::OrderBook;
use crate::types::{IntoSide, OrderId};
use parking_lot::{Mutex, MutexGuard};
use rust_decimal::Decimal;
use std::sync::Arc;

/// A cloneable, thread-safe handle to one `OrderBook`.
///
/// The book's invariants span both of its indices, so the whole book sits
/// behind a single exclusive lock. Each call holds the lock for its full
/// duration; `with` and `with_mut` hold it across a closure when several reads
/// or writes must see one consistent state.
///
/// The time priority counter lives inside the book, so sequence numbers are
/// serialized by the same lock.
///
/// ## Examples
///
/// ```
/// use limit_order_book::{Decimal, SharedOrderBook, Side};
/// use std::thread;
///
/// let shared_book = SharedOrderBook::new("GOOG");
///
/// let writer = {
///     let book = shared_book.clone();
///     thread::spawn(move || book.add(1, Side::Buy, Decimal::new(454, 1), 100))
/// };
/// writer.join().unwrap().unwrap();
///
/// assert_eq!(shared_book.get_size(Side::Buy, 1), Ok(100));
/// ```
#[derive(Debug, Clone)]
pub struct SharedOrderBook {
    inner: Arc<Mutex<OrderBook>>,
}

impl SharedOrderBook {
    /// Creates a shared handle to a new empty book bound to `symbol`.
    pub fn new(symbol: &str) -> Self {
        Self::from(OrderBook::new(symbol))
    }

    /// Acquires the book lock. The book stays locked until the guard drops.
    pub fn lock(&self) -> MutexGuard<'_, OrderBook> {
        self.inner.lock()
    }

    /// Runs `read` against the book under the lock.
    pub fn with<R>(&self, read: impl FnOnce(&OrderBook) -> R) -> R {
        read(&self.inner.lock())
    }

    /// Runs `write` against the book under the lock.
    pub fn with_mut<R>(&self, write: impl FnOnce(&mut OrderBook) -> R) -> R {
        write(&mut self.inner.lock())
    }

    /// Locked `OrderBook::add`.
    pub fn add(
        &self,
        order_id: OrderId,
        side: impl IntoSide,
        price: Decimal,
        size: i64,
    ) -> Result<(), OrderBookError> {
        self.inner.lock().add(order_id, side, price, size)
    }

    /// Locked `OrderBook::modify`.
    pub fn modify(&self, order_id: OrderId, new_size: i64) -> Result<(), OrderBookError> {
        self.inner.lock().modify(order_id, new_size)
    }

    /// Locked `OrderBook::remove`.
    pub fn remove(&self, order_id: OrderId) -> Result<(), OrderBookError> {
        self.inner.lock().remove(order_id)
    }

    /// Locked `OrderBook::fill`.
    pub fn fill(&self, order_id: OrderId, quantity: u64) -> Result<u64, OrderBookError> {
        self.inner.lock().fill(order_id, quantity)
    }

    /// Locked `OrderBook::get_price`.
    pub fn get_price(&self, side: impl IntoSide, level: usize) -> Result<Decimal, OrderBookError> {
        self.inner.lock().get_price(side, level)
    }

    /// Locked `OrderBook::get_size`.
    pub fn get_size(&self, side: impl IntoSide, level: usize) -> Result<u64, OrderBookError> {
        self.inner.lock().get_size(side, level)
    }
}

impl From<OrderBook> for SharedOrderBook {
    fn from(order_book: OrderBook) -> Self {
        SharedOrderBook {
            inner: Arc::new(Mutex::new(order_book)),
        }
    }
}
