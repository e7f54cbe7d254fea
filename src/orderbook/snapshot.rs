//! Order book depth snapshots.

use serde::{Deserialize, Serialize};

use super::order::{Price, Quantity};

/// One aggregated price level: the price and the total resting quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelInfo {
    /// The price of this level
    pub price: Price,
    /// Total remaining quantity resting at this level
    pub quantity: Quantity,
}

/// A value-copy snapshot of the order book depth at a point in time.
///
/// Bids are ordered best-first (highest price first), asks best-first
/// (lowest price first). The snapshot is self-contained and safe to hand
/// out: it never observes mutations made after it was taken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBookSnapshot {
    /// The symbol or identifier for this order book
    pub symbol: String,

    /// Timestamp when the snapshot was created (milliseconds since epoch)
    pub timestamp: u64,

    /// Bid levels, best (highest price) first
    pub bids: Vec<LevelInfo>,

    /// Ask levels, best (lowest price) first
    pub asks: Vec<LevelInfo>,
}

impl OrderBookSnapshot {
    /// Get the best bid level, if any
    #[must_use]
    pub fn best_bid(&self) -> Option<LevelInfo> {
        self.bids.first().copied()
    }

    /// Get the best ask level, if any
    #[must_use]
    pub fn best_ask(&self) -> Option<LevelInfo> {
        self.asks.first().copied()
    }

    /// Get the mid price (average of best bid and best ask)
    #[must_use]
    pub fn mid_price(&self) -> Option<f64> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some((bid.price as f64 + ask.price as f64) / 2.0),
            _ => None,
        }
    }

    /// Get the spread (best ask - best bid)
    #[must_use]
    pub fn spread(&self) -> Option<Price> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(ask.price - bid.price),
            _ => None,
        }
    }

    /// Calculate the total volume on the bid side
    #[must_use]
    pub fn total_bid_volume(&self) -> Quantity {
        self.bids.iter().map(|level| level.quantity).sum()
    }

    /// Calculate the total volume on the ask side
    #[must_use]
    pub fn total_ask_volume(&self) -> Quantity {
        self.asks.iter().map(|level| level.quantity).sum()
    }
}
