//! Prelude module that re-exports commonly used types.
//!
//! Instead of importing each type individually, you can use:
//!
//! ```rust
//! use limitbook::prelude::*;
//! ```

// Core order book types
pub use crate::orderbook::OrderBook;
pub use crate::orderbook::OrderBookError;

// Order types and scalars
pub use crate::orderbook::{
    INVALID_PRICE, Order, OrderId, OrderModify, OrderType, Price, Quantity, Side,
};

// Snapshot types
pub use crate::orderbook::{LevelInfo, OrderBookSnapshot};

// Trade-related types
pub use crate::orderbook::{Trade, TradeInfo, TradeListener, Trades};

// Bulk-cancel result
pub use crate::orderbook::MassCancelResult;

// Utility functions
pub use crate::utils::current_time_millis;
