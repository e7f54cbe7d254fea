//! Order book error types

use std::fmt;

use super::order::{OrderId, OrderType, Quantity};

/// Errors that can occur within the order book.
///
/// Rejections (duplicate id, no cross for a FillAndKill, insufficient depth
/// for a FillOrKill, market order against an empty opposite side) are normal
/// outcomes signalled by an empty trade list, not by this type. This enum
/// covers structural misuse of an order and token parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum OrderBookError {
    /// An order was asked to fill more than its remaining quantity.
    Overfill {
        /// The order that would have been overfilled
        order_id: OrderId,
        /// Quantity requested
        quantity: Quantity,
        /// Quantity actually remaining
        remaining: Quantity,
    },

    /// Promotion to GoodTillCancel was attempted on a non-market order.
    InvalidPromotion {
        /// The order that was illegally promoted
        order_id: OrderId,
        /// The order's actual type
        order_type: OrderType,
    },

    /// A side token could not be parsed.
    UnknownSide {
        /// The offending token
        token: String,
    },

    /// An order-type token could not be parsed.
    UnknownOrderType {
        /// The offending token
        token: String,
    },
}

impl fmt::Display for OrderBookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderBookError::Overfill {
                order_id,
                quantity,
                remaining,
            } => {
                write!(
                    f,
                    "order {order_id} cannot be filled with quantity {quantity} greater than remaining quantity {remaining}"
                )
            }
            OrderBookError::InvalidPromotion {
                order_id,
                order_type,
            } => {
                write!(
                    f,
                    "order {order_id} of type {order_type} cannot be promoted to GoodTillCancel"
                )
            }
            OrderBookError::UnknownSide { token } => write!(f, "unknown side: {token}"),
            OrderBookError::UnknownOrderType { token } => {
                write!(f, "unknown order type: {token}")
            }
        }
    }
}

impl std::error::Error for OrderBookError {}
