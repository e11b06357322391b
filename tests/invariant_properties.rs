use limit_order_book::{Decimal, OrderBook, OrderBookError, OrderId, Side};
use proptest::prelude::*;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
enum Operation {
    Add {
        order_id: OrderId,
        side: Side,
        ticks: i64,
        size: i64,
    },
    Modify {
        order_id: OrderId,
        new_size: i64,
    },
    Remove {
        order_id: OrderId,
    },
    Fill {
        order_id: OrderId,
        quantity: u64,
    },
}

fn arb_side() -> impl Strategy<Value = Side> {
    prop_oneof![Just(Side::Buy), Just(Side::Sell)]
}

// Mostly small sizes, with the occasional maximum to push level aggregates
// to the edge of u64
fn arb_size() -> impl Strategy<Value = i64> {
    prop_oneof![8 => -2i64..300, 1 => Just(i64::MAX), 1 => Just(i64::MAX - 1)]
}

fn arb_new_size() -> impl Strategy<Value = i64> {
    prop_oneof![8 => -20i64..300, 1 => Just(i64::MAX), 1 => Just(i64::MIN)]
}

fn arb_fill_quantity() -> impl Strategy<Value = u64> {
    prop_oneof![8 => 0u64..300, 1 => Just(i64::MAX as u64), 1 => Just(u64::MAX)]
}

// A small id space and price grid so operations collide on ids and levels
fn arb_operation() -> impl Strategy<Value = Operation> {
    prop_oneof![
        4 => (0u64..24, arb_side(), 1i64..12, arb_size()).prop_map(
            |(order_id, side, ticks, size)| Operation::Add { order_id, side, ticks, size }
        ),
        2 => (0u64..24, arb_new_size())
            .prop_map(|(order_id, new_size)| Operation::Modify { order_id, new_size }),
        2 => (0u64..24).prop_map(|order_id| Operation::Remove { order_id }),
        1 => (0u64..24, arb_fill_quantity())
            .prop_map(|(order_id, quantity)| Operation::Fill { order_id, quantity }),
    ]
}

fn price_of(ticks: i64) -> Decimal {
    Decimal::new(4500 + ticks * 5, 2)
}

/// Straightforward reference: live orders by id, plus arrival order.
#[derive(Debug, Default)]
struct Model {
    orders: BTreeMap<OrderId, (Side, Decimal, u64, u64)>,
    next_sequence: u64,
}

impl Model {
    /// Exact (u128) resting size at one price on one side, skipping `except`.
    fn level_total(&self, side: Side, price: Decimal, except: Option<OrderId>) -> u128 {
        self.orders
            .iter()
            .filter(|(order_id, (order_side, order_price, _, _))| {
                *order_side == side && *order_price == price && Some(**order_id) != except
            })
            .map(|(_, (_, _, quantity, _))| u128::from(*quantity))
            .sum()
    }

    fn apply(&mut self, operation: &Operation) -> Result<(), OrderBookError> {
        match *operation {
            Operation::Add {
                order_id,
                side,
                ticks,
                size,
            } => {
                if size <= 0 {
                    return Err(OrderBookError::InvalidQuantity(size));
                }
                if self.orders.contains_key(&order_id) {
                    return Err(OrderBookError::DuplicateOrderId(order_id));
                }
                let price = price_of(ticks);
                if self.level_total(side, price, None) + size as u128 > u128::from(u64::MAX) {
                    return Err(OrderBookError::QuantityOverflow { side, price });
                }
                self.orders
                    .insert(order_id, (side, price, size as u64, self.next_sequence));
                self.next_sequence += 1;
                Ok(())
            }
            Operation::Modify { order_id, new_size } => {
                let (side, price) = match self.orders.get(&order_id) {
                    Some(order) => (order.0, order.1),
                    None => return Err(OrderBookError::OrderNotFound(order_id)),
                };
                if new_size <= 0 {
                    self.orders.remove(&order_id);
                    return Ok(());
                }
                let total = self.level_total(side, price, Some(order_id)) + new_size as u128;
                if total > u128::from(u64::MAX) {
                    return Err(OrderBookError::QuantityOverflow { side, price });
                }
                if let Some(order) = self.orders.get_mut(&order_id) {
                    order.2 = new_size as u64;
                }
                Ok(())
            }
            Operation::Remove { order_id } => self
                .orders
                .remove(&order_id)
                .map(|_| ())
                .ok_or(OrderBookError::OrderNotFound(order_id)),
            Operation::Fill { order_id, quantity } => {
                let remaining = match self.orders.get(&order_id) {
                    Some(order) => order.2,
                    None => return Err(OrderBookError::OrderNotFound(order_id)),
                };
                if quantity == 0 || quantity > remaining {
                    return Err(OrderBookError::InvalidFillQuantity {
                        quantity,
                        remaining,
                    });
                }
                if quantity == remaining {
                    self.orders.remove(&order_id);
                } else if let Some(order) = self.orders.get_mut(&order_id) {
                    order.2 -= quantity;
                }
                Ok(())
            }
        }
    }

    /// Levels best first as (price, size, ids in time priority).
    fn levels(&self, side: Side) -> Vec<(Decimal, u64, Vec<OrderId>)> {
        let mut by_price: BTreeMap<Decimal, Vec<(u64, OrderId, u64)>> = BTreeMap::new();
        for (order_id, (order_side, price, quantity, sequence)) in &self.orders {
            if *order_side == side {
                by_price
                    .entry(*price)
                    .or_default()
                    .push((*sequence, *order_id, *quantity));
            }
        }

        let mut levels: Vec<_> = by_price
            .into_iter()
            .map(|(price, mut queue)| {
                queue.sort();
                let size = queue
                    .iter()
                    .map(|(_, _, quantity)| *quantity)
                    .fold(0u64, u64::saturating_add);
                let ids = queue.iter().map(|(_, order_id, _)| *order_id).collect();
                (price, size, ids)
            })
            .collect();
        if side == Side::Buy {
            levels.reverse();
        }
        levels
    }
}

fn apply(order_book: &mut OrderBook, operation: &Operation) -> Result<(), OrderBookError> {
    match *operation {
        Operation::Add {
            order_id,
            side,
            ticks,
            size,
        } => order_book.add(order_id, side, price_of(ticks), size),
        Operation::Modify { order_id, new_size } => order_book.modify(order_id, new_size),
        Operation::Remove { order_id } => order_book.remove(order_id),
        Operation::Fill { order_id, quantity } => order_book.fill(order_id, quantity).map(|_| ()),
    }
}

fn book_levels(order_book: &OrderBook, side: Side) -> Vec<(Decimal, u64, Vec<OrderId>)> {
    (1..=order_book.level_count(side))
        .map(|level| {
            (
                order_book.get_price(side, level).unwrap(),
                order_book.get_size(side, level).unwrap(),
                order_book.level_orders(side, level).unwrap(),
            )
        })
        .collect()
}

proptest! {
    #[test]
    fn random_operations_keep_the_book_consistent(
        operations in proptest::collection::vec(arb_operation(), 1..120)
    ) {
        let mut order_book = OrderBook::new("GOOG");
        let mut model = Model::default();

        for operation in &operations {
            let expected = model.apply(operation);
            let actual = apply(&mut order_book, operation);
            prop_assert_eq!(&actual, &expected, "operation {:?}", operation);

            prop_assert_eq!(order_book.check_invariants(), Ok(()));
        }

        for side in [Side::Buy, Side::Sell] {
            prop_assert_eq!(book_levels(&order_book, side), model.levels(side));
            let depth = order_book.level_count(side);
            let past_end = order_book.get_price(side, depth + 1);
            prop_assert_eq!(
                past_end,
                Err(OrderBookError::LevelOutOfRange { side, level: depth + 1, depth })
            );
        }
        prop_assert_eq!(order_book.len(), model.orders.len());
    }

    #[test]
    fn failed_operations_leave_the_book_unchanged(
        setup in proptest::collection::vec(arb_operation(), 0..60),
        last in arb_operation(),
    ) {
        let mut order_book = OrderBook::new("GOOG");
        for operation in &setup {
            let _ = apply(&mut order_book, operation);
        }

        let before = (
            book_levels(&order_book, Side::Buy),
            book_levels(&order_book, Side::Sell),
        );
        if apply(&mut order_book, &last).is_err() {
            let after = (
                book_levels(&order_book, Side::Buy),
                book_levels(&order_book, Side::Sell),
            );
            prop_assert_eq!(before, after);
        }
    }
}
