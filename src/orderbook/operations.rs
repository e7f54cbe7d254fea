//! Order book operations: adding, cancelling and modifying orders.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::book::{BookCore, BookShared, OrderBook};
use super::error::OrderBookError;
use super::order::{Order, OrderId, OrderModify, OrderType};
use super::trade::Trades;

/// Result of a bulk cancel operation.
///
/// Contains the count and identifiers of all orders that were actually
/// cancelled; ids that were not resident are skipped silently.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[must_use]
pub struct MassCancelResult {
    /// Number of orders successfully cancelled.
    cancelled_count: usize,
    /// IDs of all cancelled orders, in the order they were processed.
    cancelled_order_ids: Vec<OrderId>,
}

impl MassCancelResult {
    pub(super) fn new(cancelled_order_ids: Vec<OrderId>) -> Self {
        Self {
            cancelled_count: cancelled_order_ids.len(),
            cancelled_order_ids,
        }
    }

    /// Returns the number of orders successfully cancelled.
    #[must_use]
    #[inline]
    pub fn cancelled_count(&self) -> usize {
        self.cancelled_count
    }

    /// Returns a slice of all cancelled order IDs, in processing order.
    #[must_use]
    #[inline]
    pub fn cancelled_order_ids(&self) -> &[OrderId] {
        &self.cancelled_order_ids
    }

    /// Returns `true` if no orders were cancelled.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cancelled_count == 0
    }
}

impl fmt::Display for MassCancelResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MassCancelResult {{ cancelled: {} }}",
            self.cancelled_count
        )
    }
}

impl OrderBook {
    /// Submits an order to the book.
    ///
    /// The order is either rejected (empty trade list, no state change) or
    /// committed: inserted at its price level, matched against the opposite
    /// side, and left resting with any unfilled remainder (order type
    /// permitting). Rejections are: a duplicate id, a zero quantity, a
    /// market order against an empty opposite side, a FillAndKill that does
    /// not cross, and a FillOrKill without sufficient aggregate depth
    /// within its limit.
    ///
    /// # Errors
    /// Propagates structural misuse of the order record
    /// ([`OrderBookError::Overfill`] / [`OrderBookError::InvalidPromotion`]);
    /// the matching engine never triggers these by construction.
    pub fn add_order(&self, order: Order) -> Result<Trades, OrderBookError> {
        trace!(
            "Order book {}: adding {} order {} {} {} x {}",
            self.shared.symbol,
            order.order_type(),
            order.id(),
            order.side(),
            order.price(),
            order.initial_quantity()
        );
        let trades = self.shared.lock_core().add_order(order)?;
        self.notify(&trades);
        Ok(trades)
    }

    /// Cancels the order with `order_id`; no-op when the id is not resident.
    ///
    /// Returns the cancelled order, with its remaining quantity as of the
    /// cancellation.
    pub fn cancel_order(&self, order_id: OrderId) -> Option<Order> {
        trace!(
            "Order book {}: cancelling order {}",
            self.shared.symbol,
            order_id
        );
        self.shared.cancel_order(order_id)
    }

    /// Cancels every resident order in `order_ids`, atomically under the
    /// book lock (absent ids are skipped).
    pub fn cancel_orders(&self, order_ids: &[OrderId]) -> MassCancelResult {
        trace!(
            "Order book {}: cancelling {} orders",
            self.shared.symbol,
            order_ids.len()
        );
        self.shared.cancel_orders(order_ids)
    }

    /// Replaces a resting order with new side/price/quantity, preserving its
    /// type. No-op (empty trade list) when the id is not resident.
    ///
    /// The replacement goes through the full admission-and-match pipeline,
    /// so it may trade immediately; either way it loses time priority.
    ///
    /// # Errors
    /// Same as [`OrderBook::add_order`].
    pub fn modify_order(&self, modify: OrderModify) -> Result<Trades, OrderBookError> {
        trace!(
            "Order book {}: modifying order {} to {} {} x {}",
            self.shared.symbol,
            modify.order_id(),
            modify.side(),
            modify.price(),
            modify.quantity()
        );
        let trades = self.shared.lock_core().modify_order(modify)?;
        self.notify(&trades);
        Ok(trades)
    }

    fn notify(&self, trades: &Trades) {
        if trades.is_empty() {
            return;
        }
        if let Some(listener) = &self.shared.trade_listener {
            listener(trades);
        }
    }
}

impl BookShared {
    /// Single-order cancel through the book lock; shared by the public API
    /// and the expiry worker.
    pub(super) fn cancel_order(&self, order_id: OrderId) -> Option<Order> {
        self.lock_core().remove_resting(order_id)
    }

    /// Bulk cancel in one critical section.
    pub(super) fn cancel_orders(&self, order_ids: &[OrderId]) -> MassCancelResult {
        let mut core = self.lock_core();
        let cancelled = order_ids
            .iter()
            .filter(|&&order_id| core.remove_resting(order_id).is_some())
            .copied()
            .collect();
        MassCancelResult::new(cancelled)
    }
}

impl BookCore {
    /// Admission and insertion pipeline; see [`OrderBook::add_order`].
    pub(super) fn add_order(&mut self, mut order: Order) -> Result<Trades, OrderBookError> {
        if self.orders.contains_key(&order.id()) {
            return Ok(Trades::new());
        }
        if order.initial_quantity() == 0 {
            return Ok(Trades::new());
        }

        // A market order binds to the worst opposite price so the match
        // walk crosses every resident opposite level; with no opposite
        // interest there is nothing to bind to.
        if order.order_type() == OrderType::Market {
            match self.worst_price(order.side().opposite()) {
                Some(price) => order.promote_to_good_till_cancel(price)?,
                None => return Ok(Trades::new()),
            }
        }

        if order.order_type() == OrderType::FillAndKill
            && !self.can_match(order.side(), order.price())
        {
            return Ok(Trades::new());
        }

        if order.order_type() == OrderType::FillOrKill
            && !self.can_fully_fill(order.side(), order.price(), order.initial_quantity())
        {
            return Ok(Trades::new());
        }

        self.insert_resting(order);
        self.match_orders()
    }

    /// Cancel-and-reinsert; see [`OrderBook::modify_order`].
    pub(super) fn modify_order(&mut self, modify: OrderModify) -> Result<Trades, OrderBookError> {
        let order_type = match self.orders.get(&modify.order_id()) {
            Some(entry) => entry.order.order_type(),
            None => return Ok(Trades::new()),
        };
        self.remove_resting(modify.order_id());
        self.add_order(modify.to_order(order_type))
    }
}
