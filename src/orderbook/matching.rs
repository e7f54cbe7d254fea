//! The matching engine: crossing tests, the price-time priority match loop,
//! and the FillAndKill residue sweep.

use super::book::BookCore;
use super::error::OrderBookError;
use super::order::{OrderId, OrderType, Price, Quantity, Side};
use super::trade::{Trade, TradeInfo, Trades};

impl BookCore {
    /// Returns `true` when an order on `side` at `price` crosses the
    /// opposite best.
    pub(super) fn can_match(&self, side: Side, price: Price) -> bool {
        match side {
            Side::Buy => self
                .best_price(Side::Sell)
                .is_some_and(|best_ask| price >= best_ask),
            Side::Sell => self
                .best_price(Side::Buy)
                .is_some_and(|best_bid| price <= best_bid),
        }
    }

    /// Returns `true` when `quantity` can be filled completely against the
    /// opposite side without walking past `price`.
    ///
    /// Walks the aggregate table from the opposite best outward and stops as
    /// soon as the accumulated depth meets the target, so the check is
    /// O(levels) regardless of how many orders rest at each level.
    pub(super) fn can_fully_fill(&self, side: Side, price: Price, quantity: Quantity) -> bool {
        if !self.can_match(side, price) {
            return false;
        }

        let opposite: Box<dyn Iterator<Item = &Price>> = match side {
            Side::Buy => Box::new(self.asks.keys()),
            Side::Sell => Box::new(self.bids.keys().rev()),
        };

        let mut available: Quantity = 0;
        for &level_price in opposite {
            let beyond_limit = match side {
                Side::Buy => level_price > price,
                Side::Sell => level_price < price,
            };
            if beyond_limit {
                break;
            }

            available = available.saturating_add(self.aggregates.quantity_at(level_price));
            if available >= quantity {
                return true;
            }
        }
        false
    }

    /// Runs the match loop until the book no longer crosses, then sweeps any
    /// FillAndKill residue off the top of the book.
    ///
    /// Within each crossing pair of levels the heads of the two FIFOs trade
    /// at `min` of their remaining quantities; each side of the emitted
    /// [`Trade`] keeps its own resting price. Fully consumed orders leave
    /// all three indices, and emptied levels leave their side map.
    ///
    /// # Errors
    /// Propagates [`OrderBookError::Overfill`], which the loop cannot
    /// trigger by construction (fills never exceed `min` of the remainders).
    pub(super) fn match_orders(&mut self) -> Result<Trades, OrderBookError> {
        let mut trades = Trades::new();

        loop {
            let (bid_price, ask_price) = match (
                self.best_price(Side::Buy),
                self.best_price(Side::Sell),
            ) {
                (Some(bid_price), Some(ask_price)) => (bid_price, ask_price),
                _ => break,
            };
            if bid_price < ask_price {
                break;
            }

            // Trade the two level heads until one queue runs dry.
            loop {
                let bid_id = {
                    let Some(level) = self.bids.get_mut(&bid_price) else {
                        break;
                    };
                    match level.peek_front(&self.orders) {
                        Some(order_id) => order_id,
                        None => break,
                    }
                };
                let ask_id = {
                    let Some(level) = self.asks.get_mut(&ask_price) else {
                        break;
                    };
                    match level.peek_front(&self.orders) {
                        Some(order_id) => order_id,
                        None => break,
                    }
                };

                let (bid_remaining, ask_remaining) = match (
                    self.orders.get(&bid_id),
                    self.orders.get(&ask_id),
                ) {
                    (Some(bid), Some(ask)) => (
                        bid.order.remaining_quantity(),
                        ask.order.remaining_quantity(),
                    ),
                    _ => break,
                };
                let quantity = bid_remaining.min(ask_remaining);

                let bid_filled = match self.orders.get_mut(&bid_id) {
                    Some(entry) => {
                        entry.order.fill(quantity)?;
                        entry.order.is_filled()
                    }
                    None => break,
                };
                if bid_filled {
                    self.orders.remove(&bid_id);
                    if let Some(level) = self.bids.get_mut(&bid_price) {
                        level.pop_front();
                    }
                }
                self.aggregates
                    .on_order_matched(bid_price, quantity, bid_filled);

                let ask_filled = match self.orders.get_mut(&ask_id) {
                    Some(entry) => {
                        entry.order.fill(quantity)?;
                        entry.order.is_filled()
                    }
                    None => break,
                };
                if ask_filled {
                    self.orders.remove(&ask_id);
                    if let Some(level) = self.asks.get_mut(&ask_price) {
                        level.pop_front();
                    }
                }
                self.aggregates
                    .on_order_matched(ask_price, quantity, ask_filled);

                trades.push(Trade::new(
                    TradeInfo {
                        order_id: bid_id,
                        price: bid_price,
                        quantity,
                    },
                    TradeInfo {
                        order_id: ask_id,
                        price: ask_price,
                        quantity,
                    },
                ));

                if !bid_filled && !ask_filled {
                    break;
                }
            }

            // An emptied level leaves its side map before the next pass.
            if self
                .bids
                .get(&bid_price)
                .is_some_and(|level| level.is_exhausted())
            {
                self.bids.remove(&bid_price);
            }
            if self
                .asks
                .get(&ask_price)
                .is_some_and(|level| level.is_exhausted())
            {
                self.asks.remove(&ask_price);
            }
        }

        self.sweep_fill_and_kill();
        Ok(trades)
    }

    /// Cancels a FillAndKill order left at the top of either side.
    ///
    /// The admission gate only lets a FillAndKill in when it crosses, so the
    /// sole survivor the match loop can leave behind is one that crossed but
    /// did not fully fill; its residue must not rest.
    fn sweep_fill_and_kill(&mut self) {
        for side in [Side::Buy, Side::Sell] {
            if let Some(order_id) = self.best_head(side) {
                let is_fill_and_kill = self
                    .orders
                    .get(&order_id)
                    .is_some_and(|entry| entry.order.order_type() == OrderType::FillAndKill);
                if is_fill_and_kill {
                    self.remove_resting(order_id);
                }
            }
        }
    }

    /// Head of the FIFO at the best level of `side`, if any.
    fn best_head(&mut self, side: Side) -> Option<OrderId> {
        let price = self.best_price(side)?;
        let book_side = match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };
        book_side.get_mut(&price)?.peek_front(&self.orders)
    }
}
