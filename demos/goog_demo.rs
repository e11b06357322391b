//! Replays the GOOG walkthrough against a fresh book and prints the bid levels.
//!
//! Run with `RUST_LOG=limit_order_book=trace cargo run --example goog_demo` to
//! see every mutation the book logs.

use limit_order_book::{price_from_f64, OrderBook, OrderBookError, Side};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), OrderBookError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut order_book = OrderBook::new("GOOG");

    for (order_id, side, price, size) in [
        (1, 'B', 45.4, 100),
        (2, 'B', 45.3, 200),
        (3, 'B', 45.4, 300),
        (4, 'B', 45.9, 100),
        (5, 'B', 45.9, 10),
    ] {
        order_book.add(order_id, side, price_from_f64(price)?, size)?;
    }
    order_book.remove(2)?;

    for level in 1..=3 {
        match (
            order_book.get_price(Side::Buy, level),
            order_book.get_size(Side::Buy, level),
        ) {
            (Ok(price), Ok(size)) => println!("{level}: {price} size: {size}"),
            (Err(error), _) | (_, Err(error)) => println!("{level}: {error}"),
        }
    }

    if let Err(error) = order_book.get_price('X', 1) {
        println!("side X: {error}");
    }

    info!(
        "Order book {}: {} live orders on {} bid levels",
        order_book.symbol(),
        order_book.len(),
        order_book.level_count(Side::Buy)
    );
    Ok(())
}
