//! # Single-Instrument Limit Order Book
//!
//! An in-memory limit order book that accepts bid/ask orders of several
//! lifetime and execution contracts, deterministically matches them under
//! price-time priority, and exposes a depth snapshot of aggregated
//! per-price quantity.
//!
//! ## Key Features
//!
//! - **Five order types**: GoodTillCancel, FillAndKill (immediate-or-cancel),
//!   FillOrKill, GoodForDay, and Market orders. Market orders are promoted
//!   to GoodTillCancel at the worst opposing resting price so they cross
//!   every resident opposite level; FillOrKill admission is decided against
//!   aggregate level depth in O(levels).
//!
//! - **Price-time priority**: two price-ordered side maps (bids best-first
//!   descending, asks best-first ascending), each level a FIFO of orders in
//!   arrival order.
//!
//! - **Consistent triple indexing**: per-order records, per-level FIFO
//!   queues, and per-price aggregate `(count, quantity)` totals are
//!   maintained in lock-step under a single book mutex, giving O(1) cancel
//!   by id and cheap depth snapshots.
//!
//! - **Daily expiry**: a background worker force-cancels all GoodForDay
//!   orders at the local cutoff time (16:00 by default, configurable);
//!   dropping the book shuts the worker down and joins it.
//!
//! - **Trade listener**: an optional callback observes every batch of
//!   trades an operation produced, outside the book lock.
//!
//! ## Design Goals
//!
//! 1. **Correctness**: every public call leaves the three internal views of
//!    the book mutually consistent, and the book is never crossed at rest.
//! 2. **Determinism**: matching output depends only on the sequence of
//!    operations, making scenario-driven testing exact.
//! 3. **Simplicity under concurrency**: one coarse mutex serializes all
//!    mutations; no lock is ever held across a sleep.
//!
//! ## Example
//!
//! ```
//! use limitbook::{Order, OrderBook, OrderId, OrderType, Side};
//!
//! let book = OrderBook::new("BTC/USD");
//!
//! // A resting bid...
//! book.add_order(Order::new(
//!     OrderType::GoodTillCancel,
//!     OrderId::new(1),
//!     Side::Buy,
//!     100,
//!     10,
//! ))?;
//!
//! // ...and a crossing sell produce a trade at the resting price.
//! let trades = book.add_order(Order::new(
//!     OrderType::GoodTillCancel,
//!     OrderId::new(2),
//!     Side::Sell,
//!     100,
//!     4,
//! ))?;
//! assert_eq!(trades.len(), 1);
//! assert_eq!(trades[0].bid().price, 100);
//! assert_eq!(trades[0].quantity(), 4);
//!
//! // The residue stays on the book.
//! let depth = book.snapshot();
//! assert_eq!(depth.bids[0].quantity, 6);
//! # Ok::<(), limitbook::OrderBookError>(())
//! ```

pub mod orderbook;

pub mod prelude;
mod utils;

pub use orderbook::{
    INVALID_PRICE, LevelInfo, MassCancelResult, Order, OrderBook, OrderBookError,
    OrderBookSnapshot, OrderId, OrderModify, OrderType, Price, Quantity, Side, Trade, TradeInfo,
    TradeListener, Trades,
};
pub use utils::current_time_millis;
