//! Text scenario parser and driver for order book integration tests.
//!
//! Grammar, one whitespace-delimited command per line:
//!
//! ```text
//! A <Side> <OrderType> <Price> <Quantity> <OrderId>   add order
//! M <OrderId> <Side> <Price> <Quantity>               modify
//! C <OrderId>                                         cancel
//! R <allCount> <bidCount> <askCount>                  expected final state
//! ```
//!
//! `R` must be the last non-empty line; a blank line terminates the file.
//! Prices parse as unsigned: a negative literal is the parse error
//! `Value is below zero.`

use std::str::FromStr;

use limitbook::{Order, OrderBook, OrderId, OrderModify, OrderType, Price, Quantity, Side, Trades};

/// One parsed scenario command.
#[derive(Debug, Clone)]
pub enum Action {
    Add {
        side: Side,
        order_type: OrderType,
        price: Price,
        quantity: Quantity,
        order_id: OrderId,
    },
    Modify {
        order_id: OrderId,
        side: Side,
        price: Price,
        quantity: Quantity,
    },
    Cancel {
        order_id: OrderId,
    },
}

/// Expected final totals asserted by the `R` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpectedState {
    pub all_count: usize,
    pub bid_count: usize,
    pub ask_count: usize,
}

/// A parsed scenario: the commands plus the expected final state.
#[derive(Debug)]
pub struct Scenario {
    pub actions: Vec<Action>,
    pub expected: ExpectedState,
}

fn to_number(token: Option<&str>) -> Result<u64, String> {
    let token = token.ok_or_else(|| "missing field".to_string())?;
    let value: i64 = token
        .parse()
        .map_err(|_| format!("not a number: {token}"))?;
    if value < 0 {
        return Err("Value is below zero.".to_string());
    }
    Ok(value as u64)
}

fn to_side(token: Option<&str>) -> Result<Side, String> {
    let token = token.ok_or_else(|| "missing side".to_string())?;
    Side::from_str(token).map_err(|err| err.to_string())
}

fn to_order_type(token: Option<&str>) -> Result<OrderType, String> {
    let token = token.ok_or_else(|| "missing order type".to_string())?;
    OrderType::from_str(token).map_err(|err| err.to_string())
}

/// Parses a scenario file.
pub fn parse(input: &str) -> Result<Scenario, String> {
    let mut actions = Vec::new();
    let mut expected = None;

    for line in input.lines() {
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        if expected.is_some() {
            return Err("Result line must be the last non-empty line.".to_string());
        }

        let mut fields = line.split_whitespace();
        match fields.next() {
            Some("A") => actions.push(Action::Add {
                side: to_side(fields.next())?,
                order_type: to_order_type(fields.next())?,
                price: to_number(fields.next())? as Price,
                quantity: to_number(fields.next())?,
                order_id: OrderId::new(to_number(fields.next())?),
            }),
            Some("M") => actions.push(Action::Modify {
                order_id: OrderId::new(to_number(fields.next())?),
                side: to_side(fields.next())?,
                price: to_number(fields.next())? as Price,
                quantity: to_number(fields.next())?,
            }),
            Some("C") => actions.push(Action::Cancel {
                order_id: OrderId::new(to_number(fields.next())?),
            }),
            Some("R") => {
                expected = Some(ExpectedState {
                    all_count: to_number(fields.next())? as usize,
                    bid_count: to_number(fields.next())? as usize,
                    ask_count: to_number(fields.next())? as usize,
                });
            }
            Some(other) => return Err(format!("unknown command: {other}")),
            None => return Err("empty command line".to_string()),
        }
    }

    let expected = expected.ok_or_else(|| "missing result line".to_string())?;
    Ok(Scenario { actions, expected })
}

/// Applies every command to `book`, collecting all trades produced.
pub fn run(book: &OrderBook, scenario: &Scenario) -> Trades {
    let mut trades = Trades::new();
    for action in &scenario.actions {
        match *action {
            Action::Add {
                side,
                order_type,
                price,
                quantity,
                order_id,
            } => {
                let order = if order_type == OrderType::Market {
                    Order::market(order_id, side, quantity)
                } else {
                    Order::new(order_type, order_id, side, price, quantity)
                };
                trades.extend(book.add_order(order).expect("add_order failed"));
            }
            Action::Modify {
                order_id,
                side,
                price,
                quantity,
            } => {
                trades.extend(
                    book.modify_order(OrderModify::new(order_id, side, price, quantity))
                        .expect("modify_order failed"),
                );
            }
            Action::Cancel { order_id } => {
                book.cancel_order(order_id);
            }
        }
    }
    trades
}

/// Asserts the book's final totals against the scenario's `R` line.
pub fn assert_final_state(book: &OrderBook, expected: ExpectedState) {
    assert_eq!(book.len(), expected.all_count, "total order count");
    assert_eq!(book.bid_count(), expected.bid_count, "bid order count");
    assert_eq!(book.ask_count(), expected.ask_count, "ask order count");
}
