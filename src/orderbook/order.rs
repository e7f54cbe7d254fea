//! Domain order types: scalars, sides, lifetime contracts and the order record.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::OrderBookError;

/// Price in integer ticks. Signed so that spreads and the market-order
/// sentinel are representable.
pub type Price = i64;

/// Quantity in integer units.
pub type Quantity = u64;

/// Sentinel carried by market orders until they are promoted to a limit
/// price. Reserved at the bottom of the price domain so it can never collide
/// with a real level and never perturbs the side-map ordering.
pub const INVALID_PRICE: Price = Price::MIN;

/// Unique, caller-assigned order identifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct OrderId(u64);

impl OrderId {
    /// Creates an order id from its raw value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw value of this id.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl From<u64> for OrderId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether an order buys (bids) or sells (asks).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Buy side (bid).
    Buy,
    /// Sell side (ask).
    Sell,
}

impl Side {
    /// Returns the side this order would match against.
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

impl FromStr for Side {
    type Err = OrderBookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("B") || s.eq_ignore_ascii_case("BUY") {
            Ok(Side::Buy)
        } else if s.eq_ignore_ascii_case("S") || s.eq_ignore_ascii_case("SELL") {
            Ok(Side::Sell)
        } else {
            Err(OrderBookError::UnknownSide {
                token: s.to_string(),
            })
        }
    }
}

/// Lifetime and execution contract of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderType {
    /// Rests until explicitly cancelled.
    GoodTillCancel,
    /// Matches what it can immediately; any residue is cancelled.
    FillAndKill,
    /// Matches in full immediately or is rejected.
    FillOrKill,
    /// Rests like GoodTillCancel but is force-cancelled at the daily cutoff.
    GoodForDay,
    /// Carries no limit price; promoted to GoodTillCancel at the worst
    /// opposing resting price before matching, rejected when the opposite
    /// side is empty.
    Market,
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderType::GoodTillCancel => write!(f, "GoodTillCancel"),
            OrderType::FillAndKill => write!(f, "FillAndKill"),
            OrderType::FillOrKill => write!(f, "FillOrKill"),
            OrderType::GoodForDay => write!(f, "GoodForDay"),
            OrderType::Market => write!(f, "Market"),
        }
    }
}

impl FromStr for OrderType {
    type Err = OrderBookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("GoodTillCancel") || s.eq_ignore_ascii_case("GTC") {
            Ok(OrderType::GoodTillCancel)
        } else if s.eq_ignore_ascii_case("FillAndKill") || s.eq_ignore_ascii_case("FAK") {
            Ok(OrderType::FillAndKill)
        } else if s.eq_ignore_ascii_case("FillOrKill") || s.eq_ignore_ascii_case("FOK") {
            Ok(OrderType::FillOrKill)
        } else if s.eq_ignore_ascii_case("GoodForDay") || s.eq_ignore_ascii_case("GFD") {
            Ok(OrderType::GoodForDay)
        } else if s.eq_ignore_ascii_case("Market") || s.eq_ignore_ascii_case("MKT") {
            Ok(OrderType::Market)
        } else {
            Err(OrderBookError::UnknownOrderType {
                token: s.to_string(),
            })
        }
    }
}

/// A limit or market order.
///
/// Tracks the immutable submission details plus the remaining quantity,
/// which decreases as the matching engine fills the order. A market order
/// carries [`INVALID_PRICE`] until the book promotes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    order_type: OrderType,
    id: OrderId,
    side: Side,
    price: Price,
    initial_quantity: Quantity,
    remaining_quantity: Quantity,
}

impl Order {
    /// Creates a new order with an explicit limit price.
    #[must_use]
    pub fn new(
        order_type: OrderType,
        id: OrderId,
        side: Side,
        price: Price,
        quantity: Quantity,
    ) -> Self {
        Self {
            order_type,
            id,
            side,
            price,
            initial_quantity: quantity,
            remaining_quantity: quantity,
        }
    }

    /// Creates a market order; the price is set to [`INVALID_PRICE`] until
    /// the book promotes it.
    #[must_use]
    pub fn market(id: OrderId, side: Side, quantity: Quantity) -> Self {
        Self::new(OrderType::Market, id, side, INVALID_PRICE, quantity)
    }

    /// Returns the lifetime contract of this order.
    #[must_use]
    #[inline]
    pub fn order_type(&self) -> OrderType {
        self.order_type
    }

    /// Returns the unique order id.
    #[must_use]
    #[inline]
    pub fn id(&self) -> OrderId {
        self.id
    }

    /// Returns the side of this order.
    #[must_use]
    #[inline]
    pub fn side(&self) -> Side {
        self.side
    }

    /// Returns the limit price ([`INVALID_PRICE`] for an unpromoted market
    /// order).
    #[must_use]
    #[inline]
    pub fn price(&self) -> Price {
        self.price
    }

    /// Returns the quantity the order was submitted with.
    #[must_use]
    #[inline]
    pub fn initial_quantity(&self) -> Quantity {
        self.initial_quantity
    }

    /// Returns the quantity not yet filled.
    #[must_use]
    #[inline]
    pub fn remaining_quantity(&self) -> Quantity {
        self.remaining_quantity
    }

    /// Returns the quantity filled so far.
    #[must_use]
    #[inline]
    pub fn filled_quantity(&self) -> Quantity {
        self.initial_quantity - self.remaining_quantity
    }

    /// Returns `true` once the order is completely filled.
    #[must_use]
    #[inline]
    pub fn is_filled(&self) -> bool {
        self.remaining_quantity == 0
    }

    /// Reduces the remaining quantity by `quantity`.
    ///
    /// # Errors
    /// Returns [`OrderBookError::Overfill`] when `quantity` exceeds the
    /// remaining quantity; the order is left unchanged.
    pub fn fill(&mut self, quantity: Quantity) -> Result<(), OrderBookError> {
        if quantity > self.remaining_quantity {
            return Err(OrderBookError::Overfill {
                order_id: self.id,
                quantity,
                remaining: self.remaining_quantity,
            });
        }
        self.remaining_quantity -= quantity;
        Ok(())
    }

    /// Binds a market order to `price` and converts it to GoodTillCancel.
    ///
    /// One-way: the promotion happens at admission and is never reversed.
    ///
    /// # Errors
    /// Returns [`OrderBookError::InvalidPromotion`] when the order is not a
    /// market order.
    pub fn promote_to_good_till_cancel(&mut self, price: Price) -> Result<(), OrderBookError> {
        if self.order_type != OrderType::Market {
            return Err(OrderBookError::InvalidPromotion {
                order_id: self.id,
                order_type: self.order_type,
            });
        }
        self.price = price;
        self.order_type = OrderType::GoodTillCancel;
        Ok(())
    }
}

/// A request to replace an existing order's side, price and quantity.
///
/// Applied as cancel-and-reinsert, so the replacement loses time priority.
/// The original order's type is preserved by the book.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderModify {
    order_id: OrderId,
    side: Side,
    price: Price,
    quantity: Quantity,
}

impl OrderModify {
    /// Creates a modification request for the order with `order_id`.
    #[must_use]
    pub fn new(order_id: OrderId, side: Side, price: Price, quantity: Quantity) -> Self {
        Self {
            order_id,
            side,
            price,
            quantity,
        }
    }

    /// Returns the id of the order to replace.
    #[must_use]
    pub fn order_id(&self) -> OrderId {
        self.order_id
    }

    /// Returns the new side.
    #[must_use]
    pub fn side(&self) -> Side {
        self.side
    }

    /// Returns the new price.
    #[must_use]
    pub fn price(&self) -> Price {
        self.price
    }

    /// Returns the new quantity.
    #[must_use]
    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    /// Builds the replacement order, carrying over the preserved type.
    #[must_use]
    pub fn to_order(&self, order_type: OrderType) -> Order {
        Order::new(
            order_type,
            self.order_id,
            self.side,
            self.price,
            self.quantity,
        )
    }
}
