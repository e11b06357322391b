use crate::error::OrderBookError;
use rust_decimal::Decimal;
use std::fmt;

/// Caller-assigned order identifier, unique among the live orders of one book.
pub type OrderId = u64;

/// Represents the side of an order in the order book.
///
/// - `Buy` represents bids (demand side), best level is the highest price
/// - `Sell` represents asks (supply side), best level is the lowest price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// Buy side: traders willing to purchase at a given price
    Buy,
    /// Sell side: traders willing to sell at a given price
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "Buy"),
            Side::Sell => write!(f, "Sell"),
        }
    }
}

/// Conversion of a raw side value into a `Side`.
///
/// Feed handlers and drivers often carry the side as a one-letter code. The
/// book accepts those codes directly and rejects anything that is neither buy
/// nor sell with `OrderBookError::InvalidSide`.
///
/// ## Examples
///
/// ```
/// use limit_order_book::{IntoSide, OrderBookError, Side};
///
/// assert_eq!('B'.into_side(), Ok(Side::Buy));
/// assert_eq!("sell".into_side(), Ok(Side::Sell));
/// assert_eq!('X'.into_side(), Err(OrderBookError::InvalidSide("X".to_string())));
/// ```
pub trait IntoSide {
    /// Resolves the value to a side or fails with `InvalidSide`.
    fn into_side(self) -> Result<Side, OrderBookError>;
}

impl IntoSide for Side {
    fn into_side(self) -> Result<Side, OrderBookError> {
        Ok(self)
    }
}

impl IntoSide for char {
    fn into_side(self) -> Result<Side, OrderBookError> {
        match self {
            'B' | 'b' => Ok(Side::Buy),
            'S' | 's' => Ok(Side::Sell),
            other => Err(OrderBookError::InvalidSide(other.to_string())),
        }
    }
}

impl IntoSide for &str {
    fn into_side(self) -> Result<Side, OrderBookError> {
        if self.eq_ignore_ascii_case("b") || self.eq_ignore_ascii_case("buy") {
            Ok(Side::Buy)
        } else if self.eq_ignore_ascii_case("s") || self.eq_ignore_ascii_case("sell") {
            Ok(Side::Sell)
        } else {
            Err(OrderBookError::InvalidSide(self.to_string()))
        }
    }
}

/// A live order held by the book.
///
/// Identity, side and price never change once the order is in the book. The
/// remaining `quantity` is the only mutable field and the book owns the only
/// copy of each record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    /// Caller-assigned identifier
    pub id: OrderId,
    /// Whether this is a buy or sell order
    pub side: Side,
    /// Limit price (fixed-point, always positive)
    pub price: Decimal,
    /// Remaining unfilled size, always positive while the order is live
    pub quantity: u64,
    /// Insertion counter used for time priority within a price level
    pub sequence: u64,
}

/// A point-in-time view of one price level, as returned by `OrderBook::depth`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelSummary {
    /// The level price
    pub price: Decimal,
    /// Total remaining quantity queued at this price
    pub size: u64,
    /// Number of orders queued at this price
    pub order_count: usize,
}

/// Converts a floating point price coming from a driver into a `Decimal`.
///
/// `NaN` and infinities are rejected with `InvalidPrice`. Positivity is checked
/// by `OrderBook::add`, not here.
///
/// ## Examples
///
/// ```
/// use limit_order_book::{price_from_f64, Decimal};
///
/// assert_eq!(price_from_f64(45.4).unwrap(), Decimal::new(454, 1));
/// assert!(price_from_f64(f64::NAN).is_err());
/// ```
pub fn price_from_f64(price: f64) -> Result<Decimal, OrderBookError> {
    Decimal::try_from(price)
        .map(|decimal| decimal.normalize())
        .map_err(|_| OrderBookError::InvalidPrice(price.to_string()))
}
