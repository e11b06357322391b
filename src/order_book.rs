use crate::error::{IntegrityError, OrderBookError};
use crate::order_index::OrderIndex;
use crate::price_level::PriceLevel;
use crate::side_index::SideIndex;
use crate::types::{IntoSide, LevelSummary, Order, OrderId, Side};
use rust_decimal::Decimal;
use std::collections::HashSet;
use tracing::{debug, trace};

/// The core order book structure that maintains price-time priority for one
/// symbol.
///
/// The book owns two indices that are kept consistent by every operation:
///
/// - The order index: the only owner of each `Order`, keyed by order id
/// - One side index per side: price levels in priority order, each holding a
///   FIFO queue of handles into the order index
///
/// Every mutation validates its input before touching either index, so a
/// failed call leaves the book exactly as it was.
///
/// ### Thread Safety
///
/// Mutations take `&mut self`. To share a book between threads, wrap it in a
/// `SharedOrderBook`, which holds one exclusive lock for each call.
#[derive(Debug)]
pub struct OrderBook {
    /// The instrument this book is bound to, fixed for its lifetime
    symbol: String,
    /// Owning store of all live orders
    orders: OrderIndex,
    /// Bid side (buy orders): best is the highest price
    bids: SideIndex,
    /// Ask side (sell orders): best is the lowest price
    asks: SideIndex,
    /// Time priority counter, incremented on every accepted add
    next_sequence: u64,
}

impl OrderBook {
    /// Creates a new empty order book bound to `symbol`.
    ///
    /// ## Examples
    ///
    /// ```
    /// use limit_order_book::OrderBook;
    ///
    /// let order_book = OrderBook::new("GOOG");
    /// assert_eq!(order_book.symbol(), "GOOG");
    /// assert!(order_book.is_empty());
    /// ```
    pub fn new(symbol: &str) -> Self {
        Self::with_capacity(symbol, 0)
    }

    /// Creates a new empty order book with room for `orders` live orders
    /// before the order index reallocates.
    pub fn with_capacity(symbol: &str, orders: usize) -> Self {
        OrderBook {
            symbol: symbol.to_string(),
            orders: OrderIndex::with_capacity(orders),
            bids: SideIndex::new(Side::Buy),
            asks: SideIndex::new(Side::Sell),
            next_sequence: 0,
        }
    }

    /// Returns the symbol this book is bound to.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    fn side_index(&self, side: Side) -> &SideIndex {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    /// Adds a new order at the back of the queue for its price.
    ///
    /// The price level is created at its rank if it does not exist yet. Newer
    /// orders always queue behind older ones at the same price.
    ///
    /// ## Errors
    ///
    /// - `InvalidSide` if `side` is neither buy nor sell
    /// - `InvalidQuantity` if `size <= 0`
    /// - `InvalidPrice` if `price <= 0`
    /// - `DuplicateOrderId` if `order_id` is already live
    /// - `QuantityOverflow` if the level's aggregate size would exceed `u64::MAX`
    ///
    /// ## Examples
    ///
    /// ```
    /// use limit_order_book::{Decimal, OrderBook, OrderBookError, Side};
    ///
    /// let mut order_book = OrderBook::new("GOOG");
    /// order_book.add(1, Side::Buy, Decimal::new(454, 1), 100).unwrap();
    /// order_book.add(2, 'B', Decimal::new(454, 1), 300).unwrap();
    ///
    /// assert_eq!(order_book.get_size(Side::Buy, 1), Ok(400));
    /// assert_eq!(
    ///     order_book.add(2, Side::Sell, Decimal::new(460, 1), 10),
    ///     Err(OrderBookError::DuplicateOrderId(2))
    /// );
    /// ```
    pub fn add(
        &mut self,
        order_id: OrderId,
        side: impl IntoSide,
        price: Decimal,
        size: i64,
    ) -> Result<(), OrderBookError> {
        self.insert_order(order_id, side, price, size)
            .inspect_err(|error| {
                debug!(
                    "Order book {}: rejected add of order {}: {}",
                    self.symbol, order_id, error
                )
            })
    }

    fn insert_order(
        &mut self,
        order_id: OrderId,
        side: impl IntoSide,
        price: Decimal,
        size: i64,
    ) -> Result<(), OrderBookError> {
        let side = side.into_side()?;
        let quantity = u64::try_from(size)
            .ok()
            .filter(|quantity| *quantity > 0)
            .ok_or(OrderBookError::InvalidQuantity(size))?;
        if price <= Decimal::ZERO {
            return Err(OrderBookError::InvalidPrice(price.to_string()));
        }
        if self.orders.contains(order_id) {
            return Err(OrderBookError::DuplicateOrderId(order_id));
        }

        let price = price.normalize();
        let levels = match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };
        let resting = levels.find(price).map_or(0, PriceLevel::aggregate_size);
        if resting.checked_add(quantity).is_none() {
            return Err(OrderBookError::QuantityOverflow { side, price });
        }

        let sequence = self.next_sequence;
        let handle = self.orders.insert(Order {
            id: order_id,
            side,
            price,
            quantity,
            sequence,
        });

        let opened = levels.find(price).is_none();
        if levels
            .get_or_insert(price)
            .push_back(handle, &mut self.orders)
            .is_none()
        {
            if opened {
                levels.remove(price);
            }
            self.orders.remove(order_id);
            return Err(OrderBookError::QuantityOverflow { side, price });
        }
        self.next_sequence += 1;
        if opened {
            debug!(
                "Order book {}: opening {} level {}",
                self.symbol, side, price
            );
        }

        trace!(
            "Order book {}: added order {} {} {} @ {} (sequence {})",
            self.symbol,
            order_id,
            side,
            quantity,
            price,
            sequence
        );
        Ok(())
    }

    /// Changes the remaining size of a live order.
    ///
    /// The order keeps its place in the queue. A `new_size` of zero or less
    /// removes the order exactly like `remove`. Prices cannot be modified:
    /// remove and re-add the order instead, which also gives up its time
    /// priority.
    ///
    /// ## Errors
    ///
    /// - `OrderNotFound` if `order_id` is not live
    /// - `QuantityOverflow` if the level's aggregate size would exceed `u64::MAX`
    ///
    /// ## Examples
    ///
    /// ```
    /// use limit_order_book::{Decimal, OrderBook, Side};
    ///
    /// let mut order_book = OrderBook::new("GOOG");
    /// order_book.add(1, Side::Sell, Decimal::new(101, 0), 50).unwrap();
    ///
    /// order_book.modify(1, 20).unwrap();
    /// assert_eq!(order_book.get_size(Side::Sell, 1), Ok(20));
    ///
    /// order_book.modify(1, 0).unwrap();
    /// assert!(order_book.is_empty());
    /// ```
    pub fn modify(&mut self, order_id: OrderId, new_size: i64) -> Result<(), OrderBookError> {
        let result = if new_size <= 0 {
            self.remove_order(order_id).map(|_| ())
        } else {
            self.set_quantity(order_id, new_size.unsigned_abs())
        };
        result.inspect_err(|error| {
            debug!(
                "Order book {}: rejected modify of order {}: {}",
                self.symbol, order_id, error
            )
        })
    }

    fn set_quantity(&mut self, order_id: OrderId, quantity: u64) -> Result<(), OrderBookError> {
        let handle = self
            .orders
            .handle(order_id)
            .ok_or(OrderBookError::OrderNotFound(order_id))?;
        let (side, price) = self
            .orders
            .get(order_id)
            .map(|order| (order.side, order.price))
            .ok_or(OrderBookError::OrderNotFound(order_id))?;

        let levels = match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };
        let level = levels
            .find_mut(price)
            .ok_or(OrderBookError::OrderNotFound(order_id))?;
        let current = self
            .orders
            .node(handle)
            .map(|node| node.order.quantity)
            .ok_or(OrderBookError::OrderNotFound(order_id))?;
        if level.resized_aggregate(current, quantity).is_none() {
            return Err(OrderBookError::QuantityOverflow { side, price });
        }
        let previous = level
            .resize(handle, quantity, &mut self.orders)
            .ok_or(OrderBookError::OrderNotFound(order_id))?;

        trace!(
            "Order book {}: resized order {} from {} to {}",
            self.symbol,
            order_id,
            previous,
            quantity
        );
        Ok(())
    }

    /// Removes a live order from its queue and from the book.
    ///
    /// The orders queued behind it keep their relative order. If it was the
    /// last order at its price, the level disappears from the side.
    ///
    /// ## Errors
    ///
    /// - `OrderNotFound` if `order_id` is not live
    ///
    /// ## Examples
    ///
    /// ```
    /// use limit_order_book::{Decimal, OrderBook, OrderBookError, Side};
    ///
    /// let mut order_book = OrderBook::new("GOOG");
    /// order_book.add(7, Side::Buy, Decimal::new(99, 0), 10).unwrap();
    /// order_book.remove(7).unwrap();
    ///
    /// assert_eq!(order_book.level_count(Side::Buy), 0);
    /// assert_eq!(order_book.remove(7), Err(OrderBookError::OrderNotFound(7)));
    /// ```
    pub fn remove(&mut self, order_id: OrderId) -> Result<(), OrderBookError> {
        self.remove_order(order_id)
            .map(|_| ())
            .inspect_err(|error| {
                debug!(
                    "Order book {}: rejected remove of order {}: {}",
                    self.symbol, order_id, error
                )
            })
    }

    fn remove_order(&mut self, order_id: OrderId) -> Result<Order, OrderBookError> {
        let handle = self
            .orders
            .handle(order_id)
            .ok_or(OrderBookError::OrderNotFound(order_id))?;
        let (side, price) = self
            .orders
            .get(order_id)
            .map(|order| (order.side, order.price))
            .ok_or(OrderBookError::OrderNotFound(order_id))?;

        let levels = match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };
        let level = levels
            .find_mut(price)
            .ok_or(OrderBookError::OrderNotFound(order_id))?;
        level
            .unlink(handle, &mut self.orders)
            .ok_or(OrderBookError::OrderNotFound(order_id))?;
        if level.is_empty() {
            levels.remove(price);
            debug!(
                "Order book {}: closing {} level {}",
                self.symbol, side, price
            );
        }

        let order = self
            .orders
            .remove(order_id)
            .ok_or(OrderBookError::OrderNotFound(order_id))?;
        trace!(
            "Order book {}: removed order {} {} {} @ {}",
            self.symbol,
            order_id,
            side,
            order.quantity,
            price
        );
        Ok(order)
    }

    /// Consumes `quantity` from a live order, as an external matcher does on a
    /// partial execution, and returns the size left.
    ///
    /// The order keeps its queue position. Consuming the whole remaining size
    /// removes the order.
    ///
    /// ## Errors
    ///
    /// - `OrderNotFound` if `order_id` is not live
    /// - `InvalidFillQuantity` if `quantity` is zero or exceeds the remaining size
    ///
    /// ## Examples
    ///
    /// ```
    /// use limit_order_book::{Decimal, OrderBook, Side};
    ///
    /// let mut order_book = OrderBook::new("GOOG");
    /// order_book.add(3, Side::Sell, Decimal::new(1005, 1), 300).unwrap();
    ///
    /// assert_eq!(order_book.fill(3, 120), Ok(180));
    /// assert_eq!(order_book.fill(3, 180), Ok(0));
    /// assert!(!order_book.contains(3));
    /// ```
    pub fn fill(&mut self, order_id: OrderId, quantity: u64) -> Result<u64, OrderBookError> {
        let remaining = self.orders.get(order_id).map(|order| order.quantity);
        let result = match remaining {
            None => Err(OrderBookError::OrderNotFound(order_id)),
            Some(remaining) if quantity == 0 || quantity > remaining => {
                Err(OrderBookError::InvalidFillQuantity {
                    quantity,
                    remaining,
                })
            }
            Some(remaining) if quantity == remaining => self.remove_order(order_id).map(|_| 0),
            Some(remaining) => self
                .set_quantity(order_id, remaining - quantity)
                .map(|_| remaining - quantity),
        };
        result.inspect_err(|error| {
            debug!(
                "Order book {}: rejected fill of order {}: {}",
                self.symbol, order_id, error
            )
        })
    }

    fn level_at(&self, side: impl IntoSide, level: usize) -> Result<&PriceLevel, OrderBookError> {
        let side = side.into_side()?;
        let levels = self.side_index(side);
        level
            .checked_sub(1)
            .and_then(|rank| levels.get_by_rank(rank))
            .ok_or(OrderBookError::LevelOutOfRange {
                side,
                level,
                depth: levels.len(),
            })
    }

    /// Returns the price of the 1-indexed `level` on `side` (1 = best).
    ///
    /// ## Errors
    ///
    /// - `InvalidSide` if `side` is neither buy nor sell
    /// - `LevelOutOfRange` if `level` is 0 or deeper than the side
    ///
    /// ## Examples
    ///
    /// ```
    /// use limit_order_book::{Decimal, OrderBook, OrderBookError, Side};
    ///
    /// let mut order_book = OrderBook::new("GOOG");
    /// order_book.add(1, Side::Buy, Decimal::new(454, 1), 100).unwrap();
    /// order_book.add(2, Side::Buy, Decimal::new(459, 1), 100).unwrap();
    ///
    /// assert_eq!(order_book.get_price(Side::Buy, 1), Ok(Decimal::new(459, 1)));
    /// assert_eq!(order_book.get_price('B', 2), Ok(Decimal::new(454, 1)));
    /// assert!(matches!(
    ///     order_book.get_price('X', 1),
    ///     Err(OrderBookError::InvalidSide(_))
    /// ));
    /// ```
    pub fn get_price(&self, side: impl IntoSide, level: usize) -> Result<Decimal, OrderBookError> {
        self.level_at(side, level).map(PriceLevel::price)
    }

    /// Returns the aggregate size of the 1-indexed `level` on `side`.
    ///
    /// Fails exactly like `get_price`.
    pub fn get_size(&self, side: impl IntoSide, level: usize) -> Result<u64, OrderBookError> {
        self.level_at(side, level).map(PriceLevel::aggregate_size)
    }

    /// Returns the number of orders queued at the 1-indexed `level` on `side`.
    ///
    /// Fails exactly like `get_price`.
    pub fn get_order_count(
        &self,
        side: impl IntoSide,
        level: usize,
    ) -> Result<usize, OrderBookError> {
        self.level_at(side, level).map(PriceLevel::order_count)
    }

    /// Returns the ids queued at the 1-indexed `level` on `side`, in time
    /// priority (the order served first comes first).
    pub fn level_orders(
        &self,
        side: impl IntoSide,
        level: usize,
    ) -> Result<Vec<OrderId>, OrderBookError> {
        let price_level = self.level_at(side, level)?;
        Ok(price_level.iter(&self.orders).map(|order| order.id).collect())
    }

    /// Looks up a live order by id.
    pub fn order(&self, order_id: OrderId) -> Option<&Order> {
        self.orders.get(order_id)
    }

    /// Returns `true` if `order_id` is live in this book.
    pub fn contains(&self, order_id: OrderId) -> bool {
        self.orders.contains(order_id)
    }

    /// Returns the number of live orders on both sides.
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    /// Returns `true` if the book holds no orders.
    pub fn is_empty(&self) -> bool {
        self.orders.len() == 0
    }

    /// Returns the highest bid price, if any.
    pub fn best_bid(&self) -> Option<Decimal> {
        self.bids.best().map(PriceLevel::price)
    }

    /// Returns the lowest ask price, if any.
    pub fn best_ask(&self) -> Option<Decimal> {
        self.asks.best().map(PriceLevel::price)
    }

    /// Computes the current best bid, best ask and the spread between them.
    ///
    /// The spread is `None` unless both sides have at least one level.
    ///
    /// ## Examples
    ///
    /// ```
    /// use limit_order_book::{Decimal, OrderBook, Side};
    ///
    /// let mut order_book = OrderBook::new("GOOG");
    /// order_book.add(1, Side::Buy, Decimal::new(10050, 2), 100).unwrap();
    ///
    /// let (best_bid, best_ask, spread) = order_book.compute_spread();
    /// assert_eq!(best_bid, Some(Decimal::new(10050, 2)));
    /// assert_eq!(best_ask, None);
    /// assert_eq!(spread, None);
    /// ```
    pub fn compute_spread(&self) -> (Option<Decimal>, Option<Decimal>, Option<Decimal>) {
        let best_bid = self.best_bid();
        let best_ask = self.best_ask();
        let spread = best_bid.zip(best_ask).map(|(bid, ask)| ask - bid);

        (best_bid, best_ask, spread)
    }

    /// Returns the number of distinct price levels on `side`.
    pub fn level_count(&self, side: Side) -> usize {
        self.side_index(side).len()
    }

    /// Returns the number of orders resting at exactly `price` on `side`, or 0.
    pub fn orders_at_price_level(&self, price: Decimal, side: Side) -> usize {
        self.side_index(side)
            .find(price)
            .map(PriceLevel::order_count)
            .unwrap_or(0)
    }

    /// Returns the aggregate size resting at exactly `price` on `side`, or 0.
    pub fn size_at_price_level(&self, price: Decimal, side: Side) -> u64 {
        self.side_index(side)
            .find(price)
            .map(PriceLevel::aggregate_size)
            .unwrap_or(0)
    }

    /// Takes a snapshot of the best `max_levels` levels on `side`, best first.
    ///
    /// ## Examples
    ///
    /// ```
    /// use limit_order_book::{Decimal, LevelSummary, OrderBook, Side};
    ///
    /// let mut order_book = OrderBook::new("GOOG");
    /// order_book.add(1, Side::Sell, Decimal::new(101, 0), 5).unwrap();
    /// order_book.add(2, Side::Sell, Decimal::new(100, 0), 7).unwrap();
    /// order_book.add(3, Side::Sell, Decimal::new(100, 0), 1).unwrap();
    ///
    /// let depth = order_book.depth(Side::Sell, 1);
    /// assert_eq!(
    ///     depth,
    ///     vec![LevelSummary { price: Decimal::new(100, 0), size: 8, order_count: 2 }]
    /// );
    /// ```
    pub fn depth(&self, side: Side, max_levels: usize) -> Vec<LevelSummary> {
        self.side_index(side)
            .iter()
            .take(max_levels)
            .map(|level| LevelSummary {
                price: level.price(),
                size: level.aggregate_size(),
                order_count: level.order_count(),
            })
            .collect()
    }

    /// Audits both indices against each other.
    ///
    /// Checks that each side is strictly sorted by priority with no empty
    /// levels, that every level's aggregate and count match its queue, that
    /// queues are in sequence order and that every live order is queued
    /// exactly once at the level matching its side and price.
    ///
    /// This walks every order and is meant for tests and debugging.
    pub fn check_invariants(&self) -> Result<(), IntegrityError> {
        let mut queued = HashSet::with_capacity(self.orders.len());

        for levels in [&self.bids, &self.asks] {
            let side = levels.side();
            let mut previous_price: Option<Decimal> = None;

            for level in levels.iter() {
                let price = level.price();
                let in_priority_order = match (side, previous_price) {
                    (_, None) => true,
                    (Side::Buy, Some(previous)) => price < previous,
                    (Side::Sell, Some(previous)) => price > previous,
                };
                if !in_priority_order {
                    return Err(IntegrityError::UnsortedSide { side, price });
                }
                previous_price = Some(price);

                if level.is_empty() {
                    return Err(IntegrityError::EmptyLevel { side, price });
                }

                let mut actual_size = 0u64;
                let mut actual_count = 0usize;
                let mut last_sequence: Option<u64> = None;
                for order in level.iter(&self.orders) {
                    if order.side != side || order.price != price {
                        return Err(IntegrityError::MisplacedOrder(order.id));
                    }
                    if !queued.insert(order.id) {
                        return Err(IntegrityError::DuplicateHandle(order.id));
                    }
                    if last_sequence.is_some_and(|last| order.sequence <= last) {
                        return Err(IntegrityError::SequenceRegression(order.id));
                    }
                    last_sequence = Some(order.sequence);
                    actual_size = actual_size.saturating_add(order.quantity);
                    actual_count += 1;
                }

                if actual_size != level.aggregate_size() {
                    return Err(IntegrityError::AggregateDrift {
                        side,
                        price,
                        recorded: level.aggregate_size(),
                        actual: actual_size,
                    });
                }
                if actual_count != level.order_count() {
                    return Err(IntegrityError::CountDrift {
                        side,
                        price,
                        recorded: level.order_count(),
                        actual: actual_count,
                    });
                }
            }
        }

        match self.orders.orders().find(|order| !queued.contains(&order.id)) {
            Some(order) => Err(IntegrityError::UnqueuedOrder(order.id)),
            None => Ok(()),
        }
    }
}

impl Default for OrderBook {
    fn default() -> Self {
        Self::new("")
    }
}
