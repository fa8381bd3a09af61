use std::collections::{BTreeMap, HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::order::{Order, OrderId, Side};
use crate::price::Price;

/// An aggregated, read-only view of one price level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceLevelView {
    pub price: f64,
    pub total_qty: i64,
    pub order_count: usize,
}

/// One side of a symbol's order book: an ordered map from price to the
/// FIFO of active orders resting at that price, plus an auxiliary
/// id-to-price index for O(log n) removal.
///
/// Best for the bid side is the highest price; best for the ask side is
/// the lowest. Within a price bucket the head of the `VecDeque` is the
/// earliest-arrived order — this implements price-time priority.
pub struct BookSide {
    side: Side,
    levels: BTreeMap<Price, VecDeque<Order>>,
    index: HashMap<OrderId, Price>,
}

impl BookSide {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            levels: BTreeMap::new(),
            index: HashMap::new(),
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    /// Appends `order` to the FIFO at its price, creating the bucket if
    /// it doesn't exist yet.
    pub fn add(&mut self, order: Order) {
        debug_assert_eq!(order.side, self.side);
        debug_assert!(order.remaining_qty > 0);
        let price = Price(order.price);
        self.index.insert(order.id, price);
        self.levels.entry(price).or_default().push_back(order);
    }

    /// Removes and returns the order with `id`, dropping the price
    /// bucket if it becomes empty.
    pub fn remove(&mut self, id: OrderId) -> Option<Order> {
        let price = self.index.remove(&id)?;
        let bucket = self.levels.get_mut(&price)?;
        let pos = bucket.iter().position(|o| o.id == id)?;
        let order = bucket.remove(pos);
        if bucket.is_empty() {
            self.levels.remove(&price);
        }
        order
    }

    fn best_bucket_price(&self) -> Option<Price> {
        match self.side {
            Side::Buy => self.levels.keys().next_back().copied(),
            Side::Sell => self.levels.keys().next().copied(),
        }
    }

    /// The best price on this side, or `None` if empty.
    pub fn best_price(&self) -> Option<f64> {
        self.best_bucket_price().map(|p| p.0)
    }

    /// The head order of the best price bucket: earliest-arrived, active.
    pub fn best_order(&self) -> Option<&Order> {
        let price = self.best_bucket_price()?;
        self.levels.get(&price).and_then(|q| q.front())
    }

    /// Mutable access to the head order of the best price bucket, so the
    /// matching engine can apply a fill in place without disturbing FIFO
    /// order.
    pub fn best_order_mut(&mut self) -> Option<&mut Order> {
        let price = self.best_bucket_price()?;
        self.levels.get_mut(&price).and_then(|q| q.front_mut())
    }

    /// Top `n` distinct price buckets, best-to-worst, as aggregated views.
    pub fn top_levels(&self, n: usize) -> Vec<PriceLevelView> {
        let iter: Box<dyn Iterator<Item = (&Price, &VecDeque<Order>)>> = match self.side {
            Side::Buy => Box::new(self.levels.iter().rev()),
            Side::Sell => Box::new(self.levels.iter()),
        };
        iter.take(n)
            .map(|(price, bucket)| PriceLevelView {
                price: price.0,
                total_qty: bucket.iter().map(|o| o.remaining_qty).sum(),
                order_count: bucket.len(),
            })
            .collect()
    }

    pub fn total_volume(&self) -> i64 {
        self.levels.values().flatten().map(|o| o.remaining_qty).sum()
    }

    pub fn order_count(&self) -> usize {
        self.index.len()
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn contains(&self, id: OrderId) -> bool {
        self.index.contains_key(&id)
    }
}
