//! Tests for the price-time priority match loop.

use std::sync::{Arc, Mutex};

use super::test_helpers::gtc;
use crate::{OrderBook, OrderId, Side, Trade};

#[test]
fn test_crossing_orders_trade_in_full() {
    let book = OrderBook::new("TEST");

    book.add_order(gtc(1, Side::Buy, 100, 10)).unwrap();
    let trades = book.add_order(gtc(2, Side::Sell, 100, 10)).unwrap();

    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].quantity(), 10);
    assert_eq!(trades[0].bid().order_id, OrderId::new(1));
    assert_eq!(trades[0].ask().order_id, OrderId::new(2));
    assert_eq!(trades[0].bid().price, 100);
    assert_eq!(trades[0].ask().price, 100);
    assert!(book.is_empty());
}

#[test]
fn test_partial_fill_leaves_residue_resting() {
    let book = OrderBook::new("TEST");

    book.add_order(gtc(1, Side::Buy, 100, 10)).unwrap();
    let trades = book.add_order(gtc(2, Side::Sell, 100, 4)).unwrap();

    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].quantity(), 4);
    assert_eq!(book.len(), 1);
    assert_eq!(book.bid_count(), 1);
    assert_eq!(book.ask_count(), 0);
    assert_eq!(
        book.get_order(OrderId::new(1)).unwrap().remaining_quantity(),
        6
    );
}

#[test]
fn test_non_crossing_orders_rest() {
    let book = OrderBook::new("TEST");

    book.add_order(gtc(1, Side::Buy, 99, 10)).unwrap();
    let trades = book.add_order(gtc(2, Side::Sell, 101, 10)).unwrap();

    assert!(trades.is_empty());
    assert_eq!(book.len(), 2);
    assert_eq!(book.best_bid(), Some(99));
    assert_eq!(book.best_ask(), Some(101));
}

#[test]
fn test_each_trade_side_keeps_its_resting_price() {
    let book = OrderBook::new("TEST");

    book.add_order(gtc(1, Side::Sell, 100, 5)).unwrap();
    // An aggressive bid above the ask trades at both resting prices, one
    // per side of the trade record.
    let trades = book.add_order(gtc(2, Side::Buy, 110, 5)).unwrap();

    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].bid().price, 110);
    assert_eq!(trades[0].ask().price, 100);
    assert!(trades[0].bid().price >= trades[0].ask().price);
}

#[test]
fn test_time_priority_within_a_level() {
    let book = OrderBook::new("TEST");

    book.add_order(gtc(1, Side::Buy, 100, 5)).unwrap();
    book.add_order(gtc(2, Side::Buy, 100, 5)).unwrap();
    let trades = book.add_order(gtc(3, Side::Sell, 100, 5)).unwrap();

    // Earliest arrival at the level trades first.
    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].bid().order_id, OrderId::new(1));
    assert_eq!(book.len(), 1);
    assert!(book.get_order(OrderId::new(2)).is_some());
}

#[test]
fn test_price_priority_across_levels() {
    let book = OrderBook::new("TEST");

    book.add_order(gtc(1, Side::Sell, 102, 5)).unwrap();
    book.add_order(gtc(2, Side::Sell, 100, 5)).unwrap();
    book.add_order(gtc(3, Side::Sell, 101, 5)).unwrap();

    let trades = book.add_order(gtc(4, Side::Buy, 102, 15)).unwrap();

    // Best (lowest) ask first, walking outward.
    assert_eq!(trades.len(), 3);
    assert_eq!(trades[0].ask().order_id, OrderId::new(2));
    assert_eq!(trades[0].ask().price, 100);
    assert_eq!(trades[1].ask().order_id, OrderId::new(3));
    assert_eq!(trades[1].ask().price, 101);
    assert_eq!(trades[2].ask().order_id, OrderId::new(1));
    assert_eq!(trades[2].ask().price, 102);
    assert!(book.is_empty());
}

#[test]
fn test_incoming_order_walks_only_to_its_limit() {
    let book = OrderBook::new("TEST");

    book.add_order(gtc(1, Side::Sell, 100, 5)).unwrap();
    book.add_order(gtc(2, Side::Sell, 105, 5)).unwrap();

    let trades = book.add_order(gtc(3, Side::Buy, 102, 10)).unwrap();

    // Only the 100 level crosses; the residue rests at 102.
    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].quantity(), 5);
    assert_eq!(book.best_bid(), Some(102));
    assert_eq!(book.best_ask(), Some(105));
    assert_eq!(
        book.get_order(OrderId::new(3)).unwrap().remaining_quantity(),
        5
    );
}

#[test]
fn test_one_incoming_order_sweeps_multiple_resting_orders_per_level() {
    let book = OrderBook::new("TEST");

    book.add_order(gtc(1, Side::Sell, 100, 3)).unwrap();
    book.add_order(gtc(2, Side::Sell, 100, 3)).unwrap();
    book.add_order(gtc(3, Side::Sell, 100, 3)).unwrap();

    let trades = book.add_order(gtc(4, Side::Buy, 100, 8)).unwrap();

    assert_eq!(trades.len(), 3);
    let total: u64 = trades.iter().map(|trade| trade.quantity()).sum();
    assert_eq!(total, 8);
    // Last resting order keeps its unfilled single unit.
    assert_eq!(
        book.get_order(OrderId::new(3)).unwrap().remaining_quantity(),
        1
    );
    assert_eq!(book.len(), 1);
}

#[test]
fn test_trade_quantity_sum_equals_total_remaining_reduction() {
    let book = OrderBook::new("TEST");

    book.add_order(gtc(1, Side::Sell, 100, 4)).unwrap();
    book.add_order(gtc(2, Side::Sell, 101, 6)).unwrap();
    let resting_before: u64 = 10;

    let trades = book.add_order(gtc(3, Side::Buy, 101, 7)).unwrap();

    let traded: u64 = trades.iter().map(|trade| trade.quantity()).sum();
    let resting_after: u64 = book.snapshot().total_ask_volume();
    let incoming_remaining = book
        .get_order(OrderId::new(3))
        .map(|order| order.remaining_quantity())
        .unwrap_or(0);

    // 7 in, 7 traded: the reduction across all affected orders matches.
    assert_eq!(traded, 7);
    assert_eq!(resting_before - resting_after, traded);
    assert_eq!(incoming_remaining, 0);
}

#[test]
fn test_trade_listener_observes_each_producing_operation() {
    let seen: Arc<Mutex<Vec<usize>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let book = OrderBook::with_trade_listener(
        "TEST",
        Arc::new(move |trades: &[Trade]| sink.lock().unwrap().push(trades.len())),
    );

    book.add_order(gtc(1, Side::Sell, 100, 3)).unwrap();
    book.add_order(gtc(2, Side::Sell, 101, 3)).unwrap();
    // One operation, two trades, one callback.
    book.add_order(gtc(3, Side::Buy, 101, 6)).unwrap();
    // No trades, no callback.
    book.add_order(gtc(4, Side::Buy, 99, 1)).unwrap();

    assert_eq!(*seen.lock().unwrap(), vec![2]);
}

#[test]
fn test_book_is_never_crossed_at_rest() {
    let book = OrderBook::new("TEST");

    book.add_order(gtc(1, Side::Buy, 100, 5)).unwrap();
    book.add_order(gtc(2, Side::Sell, 103, 5)).unwrap();
    book.add_order(gtc(3, Side::Buy, 102, 5)).unwrap();
    book.add_order(gtc(4, Side::Sell, 101, 2)).unwrap();

    // 4 traded against 3; whatever rests must not cross.
    if let (Some(bid), Some(ask)) = (book.best_bid(), book.best_ask()) {
        assert!(bid < ask);
    }
}
