//! Core order book implementation: the public handle, the state behind the
//! book mutex, and the expiry worker lifecycle.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use chrono::NaiveTime;
use tracing::trace;

use super::expiration;
use super::level::{AggregateLevels, Level, OrderEntry};
use super::order::{Order, OrderId, OrderType, Price, Side};
use super::snapshot::{LevelInfo, OrderBookSnapshot};
use super::trade::TradeListener;
use crate::utils::current_time_millis;

/// A single-instrument limit order book.
///
/// The book matches incoming orders against resting interest under strict
/// price-time priority and keeps three views of the same state mutually
/// consistent: per-order records, per-level FIFO queues, and per-price
/// aggregates. All state sits behind one mutex; every public operation
/// holds it for the full call.
///
/// A background worker cancels all GoodForDay orders at the daily cutoff
/// (16:00 local time by default). Dropping the book shuts the worker down
/// and joins it.
///
/// # Examples
///
/// ```
/// use limitbook::{Order, OrderBook, OrderId, OrderType, Side};
///
/// let book = OrderBook::new("BTC/USD");
/// book.add_order(Order::new(
///     OrderType::GoodTillCancel,
///     OrderId::new(1),
///     Side::Buy,
///     100,
///     10,
/// ))?;
/// let trades = book.add_order(Order::new(
///     OrderType::GoodTillCancel,
///     OrderId::new(2),
///     Side::Sell,
///     100,
///     4,
/// ))?;
///
/// assert_eq!(trades.len(), 1);
/// assert_eq!(trades[0].quantity(), 4);
/// assert_eq!(book.len(), 1); // order 1 rests with 6 remaining
/// # Ok::<(), limitbook::OrderBookError>(())
/// ```
pub struct OrderBook {
    pub(super) shared: Arc<BookShared>,
    expiration_worker: Option<JoinHandle<()>>,
}

/// State shared between the public handle and the expiry worker.
pub(super) struct BookShared {
    /// The symbol or identifier for this order book
    pub(super) symbol: String,

    /// All mutable book state, guarded by the single book mutex
    pub(super) core: Mutex<BookCore>,

    /// Invoked (outside the lock) after operations that produced trades
    pub(super) trade_listener: Option<TradeListener>,

    /// Local time of day at which GoodForDay orders expire
    pub(super) expiration_cutoff: NaiveTime,

    /// Set by the destructor to stop the expiry worker
    pub(super) shutdown: Mutex<bool>,

    /// Signalled by the destructor so the worker's wait returns early
    pub(super) expiration_signal: Condvar,
}

impl BookShared {
    /// Acquires the book mutex, recovering from poisoning: core mutations
    /// keep the three indices consistent within each critical section, so a
    /// panicked writer cannot leave a torn state behind.
    pub(super) fn lock_core(&self) -> MutexGuard<'_, BookCore> {
        self.core.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The three parallel representations of book state, valid only under the
/// book mutex:
///
/// - `bids` / `asks`: price-ordered levels, each a FIFO of order ids
/// - `orders`: the by-id index owning the order records
/// - `aggregates`: per-price `(count, quantity)` totals
#[derive(Default)]
pub(super) struct BookCore {
    /// Bid levels; best bid is the highest key, read via reverse iteration
    pub(super) bids: BTreeMap<Price, Level>,

    /// Ask levels; best ask is the lowest key
    pub(super) asks: BTreeMap<Price, Level>,

    /// Every live order with its insertion ticket, keyed by id
    pub(super) orders: HashMap<OrderId, OrderEntry>,

    /// Per-price aggregates kept in lock-step with the maps above
    pub(super) aggregates: AggregateLevels,

    /// Source of insertion tickets for queue slots
    next_seq: u64,
}

impl OrderBook {
    /// Creates a new order book for the given symbol with the default
    /// GoodForDay cutoff of 16:00 local time.
    #[must_use]
    pub fn new(symbol: &str) -> Self {
        Self::build(symbol, expiration::default_cutoff(), None)
    }

    /// Creates a new order book whose GoodForDay orders expire at `cutoff`
    /// (local time of day) instead of the default 16:00.
    #[must_use]
    pub fn with_expiration_cutoff(symbol: &str, cutoff: NaiveTime) -> Self {
        Self::build(symbol, cutoff, None)
    }

    /// Creates a new order book for the given symbol with a trade listener.
    ///
    /// The listener is invoked after every `add_order`/`modify_order` that
    /// produced trades, outside the book lock.
    #[must_use]
    pub fn with_trade_listener(symbol: &str, trade_listener: TradeListener) -> Self {
        Self::build(symbol, expiration::default_cutoff(), Some(trade_listener))
    }

    fn build(symbol: &str, cutoff: NaiveTime, trade_listener: Option<TradeListener>) -> Self {
        let shared = Arc::new(BookShared {
            symbol: symbol.to_string(),
            core: Mutex::new(BookCore::default()),
            trade_listener,
            expiration_cutoff: cutoff,
            shutdown: Mutex::new(false),
            expiration_signal: Condvar::new(),
        });

        let worker = {
            let shared = Arc::clone(&shared);
            thread::Builder::new()
                .name(format!("{symbol}-gfd-expiry"))
                .spawn(move || expiration::run(&shared))
                .expect("failed to spawn expiry worker")
        };

        Self {
            shared,
            expiration_worker: Some(worker),
        }
    }

    /// Get the symbol of this order book
    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.shared.symbol
    }

    /// Returns the number of live orders resting in the book.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shared.lock_core().orders.len()
    }

    /// Returns `true` when no orders rest in the book.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shared.lock_core().orders.is_empty()
    }

    /// Returns the number of live buy orders.
    #[must_use]
    pub fn bid_count(&self) -> usize {
        self.shared.lock_core().order_count(Side::Buy)
    }

    /// Returns the number of live sell orders.
    #[must_use]
    pub fn ask_count(&self) -> usize {
        self.shared.lock_core().order_count(Side::Sell)
    }

    /// Get the best bid price, if any
    #[must_use]
    pub fn best_bid(&self) -> Option<Price> {
        self.shared.lock_core().best_price(Side::Buy)
    }

    /// Get the best ask price, if any
    #[must_use]
    pub fn best_ask(&self) -> Option<Price> {
        self.shared.lock_core().best_price(Side::Sell)
    }

    /// Returns a copy of the resting order with `order_id`, if present.
    #[must_use]
    pub fn get_order(&self, order_id: OrderId) -> Option<Order> {
        self.shared
            .lock_core()
            .orders
            .get(&order_id)
            .map(|entry| entry.order.clone())
    }

    /// Returns a value-copy depth snapshot: bids best-first (highest price
    /// first), asks best-first (lowest price first), each level carrying the
    /// total live remaining quantity at that price.
    ///
    /// The snapshot is self-contained; it does not observe later mutations.
    #[must_use]
    pub fn snapshot(&self) -> OrderBookSnapshot {
        let (bids, asks) = {
            let core = self.shared.lock_core();
            (core.side_depth(Side::Buy), core.side_depth(Side::Sell))
        };
        trace!(
            "Order book {}: snapshot with {} bid and {} ask levels",
            self.shared.symbol,
            bids.len(),
            asks.len()
        );
        OrderBookSnapshot {
            symbol: self.shared.symbol.clone(),
            timestamp: current_time_millis(),
            bids,
            asks,
        }
    }
}

impl Drop for OrderBook {
    fn drop(&mut self) {
        if let Some(worker) = self.expiration_worker.take() {
            {
                let mut shutdown = self
                    .shared
                    .shutdown
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner);
                *shutdown = true;
            }
            self.shared.expiration_signal.notify_all();
            let _ = worker.join();
        }
    }
}

impl BookCore {
    /// Best resting price on `side`, if the side is non-empty.
    pub(super) fn best_price(&self, side: Side) -> Option<Price> {
        match side {
            Side::Buy => self.bids.keys().next_back().copied(),
            Side::Sell => self.asks.keys().next().copied(),
        }
    }

    /// Worst resting price on `side`: the level a market order on the
    /// opposite side is promoted to, so the subsequent match walk crosses
    /// every resident level.
    pub(super) fn worst_price(&self, side: Side) -> Option<Price> {
        match side {
            Side::Buy => self.bids.keys().next().copied(),
            Side::Sell => self.asks.keys().next_back().copied(),
        }
    }

    /// Number of live orders on `side`, summed over its levels.
    pub(super) fn order_count(&self, side: Side) -> usize {
        let book_side = match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        };
        book_side.values().map(Level::live_orders).sum()
    }

    /// Appends `order` to the FIFO at its price and records it in the order
    /// index and the aggregate table.
    pub(super) fn insert_resting(&mut self, order: Order) {
        let (order_id, side, price) = (order.id(), order.side(), order.price());
        let quantity = order.remaining_quantity();
        let seq = self.next_seq;
        self.next_seq += 1;

        let book_side = match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };
        book_side.entry(price).or_default().push_back(seq, order_id);
        self.orders.insert(order_id, OrderEntry { order, seq });
        self.aggregates.on_order_added(price, quantity);
    }

    /// Removes a resting order from all three indices; returns it, or
    /// `None` when the id is not resident. O(1) apart from the level-key
    /// removal.
    pub(super) fn remove_resting(&mut self, order_id: OrderId) -> Option<Order> {
        let order = self.orders.remove(&order_id)?.order;

        let book_side = match order.side() {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };
        if let Some(level) = book_side.get_mut(&order.price()) {
            level.retire();
            if level.is_exhausted() {
                book_side.remove(&order.price());
            }
        }
        self.aggregates
            .on_order_cancelled(order.price(), order.remaining_quantity());
        Some(order)
    }

    /// Ids of all resting GoodForDay orders, for the daily expiry sweep.
    pub(super) fn good_for_day_ids(&self) -> Vec<OrderId> {
        self.orders
            .values()
            .filter(|entry| entry.order.order_type() == OrderType::GoodForDay)
            .map(|entry| entry.order.id())
            .collect()
    }

    /// Aggregated depth of `side` in best-first order.
    pub(super) fn side_depth(&self, side: Side) -> Vec<LevelInfo> {
        let levels: Box<dyn Iterator<Item = (&Price, &Level)>> = match side {
            Side::Buy => Box::new(self.bids.iter().rev()),
            Side::Sell => Box::new(self.asks.iter()),
        };

        levels
            .map(|(&price, level)| LevelInfo {
                price,
                quantity: level
                    .live_orders_iter(&self.orders)
                    .map(Order::remaining_quantity)
                    .sum(),
            })
            .collect()
    }

    /// Verifies that the order index, the side maps and the aggregate table
    /// agree, and that the book is not crossed at rest. Panics on the first
    /// violation.
    #[cfg(test)]
    pub(super) fn assert_invariants(&self) {
        // Every order in the index appears exactly once in the FIFO of its
        // own side and price, under its own ticket.
        for entry in self.orders.values() {
            let order = &entry.order;
            let book_side = match order.side() {
                Side::Buy => &self.bids,
                Side::Sell => &self.asks,
            };
            let level = book_side
                .get(&order.price())
                .unwrap_or_else(|| panic!("order {} has no level at {}", order.id(), order.price()));
            let occurrences = level
                .iter()
                .filter(|&&(seq, id)| id == order.id() && seq == entry.seq)
                .count();
            assert_eq!(
                occurrences,
                1,
                "order {} appears {} times in its level FIFO",
                order.id(),
                occurrences
            );
        }

        // Per side: level bookkeeping matches the order index, and no level
        // key is exhausted.
        let mut live_per_price: HashMap<Price, (u32, u64)> = HashMap::new();
        for (side, book_side) in [(Side::Buy, &self.bids), (Side::Sell, &self.asks)] {
            for (&price, level) in book_side {
                assert!(!level.is_exhausted(), "exhausted level {price} on {side}");
                let resident: Vec<&Order> = level.live_orders_iter(&self.orders).collect();
                assert_eq!(
                    resident.len(),
                    level.live_orders(),
                    "live count mismatch at {price} on {side}"
                );
                for order in &resident {
                    assert_eq!(order.side(), side, "order {} on wrong side", order.id());
                    assert_eq!(order.price(), price, "order {} at wrong level", order.id());
                }
                let entry = live_per_price.entry(price).or_default();
                entry.0 += resident.len() as u32;
                entry.1 += resident
                    .iter()
                    .map(|order| order.remaining_quantity())
                    .sum::<u64>();
            }
        }

        // Aggregate table matches the per-order view exactly, with no
        // zero-count residue.
        assert_eq!(
            self.aggregates.len(),
            live_per_price.len(),
            "aggregate table has stray or missing price keys"
        );
        for (&price, &(order_count, quantity)) in &live_per_price {
            let data = self
                .aggregates
                .get(price)
                .unwrap_or_else(|| panic!("no aggregate entry for price {price}"));
            assert_eq!(data.order_count, order_count, "count mismatch at {price}");
            assert_eq!(data.quantity, quantity, "quantity mismatch at {price}");
        }
        for (&price, data) in self.aggregates.iter() {
            assert!(data.order_count > 0, "zero-count aggregate at {price}");
        }

        // The book is never crossed at rest.
        if let (Some(best_bid), Some(best_ask)) =
            (self.best_price(Side::Buy), self.best_price(Side::Sell))
        {
            assert!(
                best_bid < best_ask,
                "book crossed at rest: bid {best_bid} >= ask {best_ask}"
            );
        }
    }
}
