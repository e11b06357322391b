use crate::price_level::PriceLevel;
use crate::types::Side;
use rust_decimal::Decimal;
use std::collections::btree_map::{self, BTreeMap};

/// The price levels of one side of the book, kept in priority order.
///
/// Levels are keyed by price in a `BTreeMap`, so find, insert and delete by
/// price are $O(\log{N})$ in the number of levels. The map itself is always
/// ascending; the side decides which end is best:
///
/// - `Buy`: highest price first, the map is walked from the back
/// - `Sell`: lowest price first, the map is walked from the front
///
/// Rank queries walk the priority iterator and cost $O(k)$ for rank $k$.
#[derive(Debug, Clone)]
pub(crate) struct SideIndex {
    side: Side,
    levels: BTreeMap<Decimal, PriceLevel>,
}

impl SideIndex {
    pub(crate) fn new(side: Side) -> Self {
        SideIndex {
            side,
            levels: BTreeMap::new(),
        }
    }

    pub(crate) fn side(&self) -> Side {
        self.side
    }

    pub(crate) fn len(&self) -> usize {
        self.levels.len()
    }

    pub(crate) fn find(&self, price: Decimal) -> Option<&PriceLevel> {
        self.levels.get(&price)
    }

    pub(crate) fn find_mut(&mut self, price: Decimal) -> Option<&mut PriceLevel> {
        self.levels.get_mut(&price)
    }

    /// Returns the level at `price`, creating an empty one at its rank first
    /// if none exists.
    pub(crate) fn get_or_insert(&mut self, price: Decimal) -> &mut PriceLevel {
        self.levels
            .entry(price)
            .or_insert_with(|| PriceLevel::new(price))
    }

    pub(crate) fn remove(&mut self, price: Decimal) -> Option<PriceLevel> {
        self.levels.remove(&price)
    }

    /// Level at 0-based priority `rank` (0 = best).
    pub(crate) fn get_by_rank(&self, rank: usize) -> Option<&PriceLevel> {
        self.iter().nth(rank)
    }

    pub(crate) fn best(&self) -> Option<&PriceLevel> {
        self.iter().next()
    }

    /// Iterates levels best first.
    pub(crate) fn iter(&self) -> Levels<'_> {
        Levels {
            inner: self.levels.values(),
            best_is_highest: self.side == Side::Buy,
        }
    }
}

/// Priority-ordered iterator over the levels of a `SideIndex`.
pub(crate) struct Levels<'a> {
    inner: btree_map::Values<'a, Decimal, PriceLevel>,
    best_is_highest: bool,
}

impl<'a> Iterator for Levels<'a> {
    type Item = &'a PriceLevel;

    fn next(&mut self) -> Option<Self::Item> {
        if self.best_is_highest {
            self.inner.next_back()
        } else {
            self.inner.next()
        }
    }

    fn nth(&mut self, n: usize) -> Option<Self::Item> {
        if self.best_is_highest {
            self.inner.nth_back(n)
        } else {
            self.inner.nth(n)
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Levels<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn prices(index: &SideIndex) -> Vec<Decimal> {
        index.iter().map(PriceLevel::price).collect()
    }

    fn side_with(side: Side, level_prices: &[Decimal]) -> SideIndex {
        let mut index = SideIndex::new(side);
        for price in level_prices {
            index.get_or_insert(*price);
        }
        index
    }

    #[test]
    fn buy_side_iterates_highest_price_first() {
        let index = side_with(Side::Buy, &[dec!(45.4), dec!(45.9), dec!(45.3)]);
        assert_eq!(prices(&index), vec![dec!(45.9), dec!(45.4), dec!(45.3)]);
        assert_eq!(index.best().map(PriceLevel::price), Some(dec!(45.9)));
    }

    #[test]
    fn sell_side_iterates_lowest_price_first() {
        let index = side_with(Side::Sell, &[dec!(101.2), dec!(100.9), dec!(101.0)]);
        assert_eq!(prices(&index), vec![dec!(100.9), dec!(101.0), dec!(101.2)]);
        assert_eq!(index.best().map(PriceLevel::price), Some(dec!(100.9)));
    }

    #[test]
    fn get_or_insert_reuses_an_existing_price() {
        let mut index = side_with(Side::Sell, &[dec!(10)]);
        index.get_or_insert(dec!(10.00));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn rank_lookup_follows_side_priority() {
        let bids = side_with(Side::Buy, &[dec!(1), dec!(2), dec!(3)]);
        let asks = side_with(Side::Sell, &[dec!(1), dec!(2), dec!(3)]);

        assert_eq!(bids.get_by_rank(0).map(PriceLevel::price), Some(dec!(3)));
        assert_eq!(bids.get_by_rank(2).map(PriceLevel::price), Some(dec!(1)));
        assert_eq!(asks.get_by_rank(0).map(PriceLevel::price), Some(dec!(1)));
        assert_eq!(asks.get_by_rank(2).map(PriceLevel::price), Some(dec!(3)));
        assert!(bids.get_by_rank(3).is_none());
    }

    #[test]
    fn removing_a_level_keeps_the_others_in_order() {
        let mut index = side_with(Side::Buy, &[dec!(5), dec!(7), dec!(6)]);
        assert!(index.remove(dec!(6)).is_some());
        assert!(index.remove(dec!(6)).is_none());
        assert_eq!(prices(&index), vec![dec!(7), dec!(5)]);
        assert!(index.find(dec!(6)).is_none());
    }
}
