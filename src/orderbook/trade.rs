//! Trade records produced by the matching engine.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::order::{OrderId, Price, Quantity};

/// Execution details for one side of a single match increment: the order
/// that traded, its resting price, and the quantity exchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeInfo {
    /// Id of the order that traded
    pub order_id: OrderId,
    /// The price the order was resting at
    pub price: Price,
    /// Quantity exchanged in this increment
    pub quantity: Quantity,
}

/// A single match increment between one bid and one ask.
///
/// Each side keeps its own resting price, so `bid.price >= ask.price` for
/// every trade the matching engine emits; both sides carry the same
/// quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    bid: TradeInfo,
    ask: TradeInfo,
}

impl Trade {
    /// Creates a trade from the bid-side and ask-side execution details.
    #[must_use]
    pub fn new(bid: TradeInfo, ask: TradeInfo) -> Self {
        Self { bid, ask }
    }

    /// Returns the bid-side execution details.
    #[must_use]
    #[inline]
    pub fn bid(&self) -> &TradeInfo {
        &self.bid
    }

    /// Returns the ask-side execution details.
    #[must_use]
    #[inline]
    pub fn ask(&self) -> &TradeInfo {
        &self.ask
    }

    /// Quantity exchanged in this increment (equal on both sides).
    #[must_use]
    #[inline]
    pub fn quantity(&self) -> Quantity {
        self.bid.quantity
    }
}

/// Trades produced by a single operation, in match order.
pub type Trades = Vec<Trade>;

/// Callback invoked after an operation that produced trades.
///
/// The listener runs outside the book lock, so it may freely call back into
/// the book.
pub type TradeListener = Arc<dyn Fn(&[Trade]) + Send + Sync>;
