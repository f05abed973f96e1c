//! Market stock and pricing.
//!
//! The market is a location-scoped container where every listed item
//! carries its own stock, average price, current price, and daily
//! volatility. Prices move once per simulated day:
//!
//! ```text
//! new = avg + volatility * (2r - 1)        r uniform in [0, 1)
//! cur = clamp(round2(new), avg * (1 - band), avg * (1 + band))
//! ```
//!
//! On day 1 the volatility is multiplied by a configurable factor so
//! the opening prices spread out. Money is [`Decimal`] so buy and sell
//! totals are exact.

use std::collections::BTreeMap;

use agora_types::{ItemId, LocationId};
use rand::Rng;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::WorldError;

/// Global pricing knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketSettings {
    /// Fraction of the average price the current price may stray.
    pub price_band: Decimal,
    /// Volatility multiplier applied on the first day.
    pub first_day_multiplier: Decimal,
}

impl Default for MarketSettings {
    fn default() -> Self {
        Self {
            price_band: Decimal::new(5, 1),
            first_day_multiplier: Decimal::from(4),
        }
    }
}

/// One listed item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    /// Units in stock.
    pub quantity: u32,
    /// Long-run average price.
    pub avg_price: Decimal,
    /// Price charged today.
    pub cur_price: Decimal,
    /// Maximum daily swing around the average.
    pub daily_volatility: Decimal,
    /// Stock floor restored on every refresh.
    pub restock_to: Option<u32>,
}

/// The market's listings plus the day they were last refreshed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Market {
    location: LocationId,
    listings: BTreeMap<ItemId, Listing>,
    settings: MarketSettings,
    last_refreshed_day: u32,
}

impl Market {
    /// Create a market that has not been refreshed yet.
    pub const fn new(
        location: LocationId,
        listings: BTreeMap<ItemId, Listing>,
        settings: MarketSettings,
    ) -> Self {
        Self {
            location,
            listings,
            settings,
            last_refreshed_day: 0,
        }
    }

    /// Where the market stands.
    pub const fn location(&self) -> &LocationId {
        &self.location
    }

    /// Look up a listing.
    pub fn listing(&self, item: &str) -> Option<&Listing> {
        self.listings.get(item)
    }

    /// All listings in key order.
    pub const fn listings(&self) -> &BTreeMap<ItemId, Listing> {
        &self.listings
    }

    /// The last simulated day prices were refreshed for (0 if never).
    pub const fn last_refreshed_day(&self) -> u32 {
        self.last_refreshed_day
    }

    /// The allowed `(low, high)` price range for a listing.
    ///
    /// Bounds saturate at the limits of [`Decimal`] instead of overflowing.
    pub fn price_bounds(&self, listing: &Listing) -> (Decimal, Decimal) {
        band_around(listing.avg_price, self.settings.price_band)
    }

    /// Total cost of buying `qty` units at today's price.
    ///
    /// Fails if the item is unlisted, stock is short, or the total
    /// overflows.
    pub fn quote_buy(&self, item: &ItemId, qty: u32) -> Result<Decimal, WorldError> {
        let listing = self.listed(item)?;
        if listing.quantity < qty {
            return Err(WorldError::OutOfStock {
                item: item.clone(),
                requested: qty,
                available: listing.quantity,
            });
        }
        listing
            .cur_price
            .checked_mul(Decimal::from(qty))
            .ok_or_else(|| WorldError::ArithmeticOverflow {
                context: format!("price of {qty} {item}"),
            })
    }

    /// Money paid for selling `qty` units: half of today's price each.
    pub fn quote_sell(&self, item: &ItemId, qty: u32) -> Result<Decimal, WorldError> {
        let listing = self.listed(item)?;
        listing
            .cur_price
            .checked_mul(Decimal::from(qty))
            .and_then(|gross| gross.checked_mul(Decimal::new(5, 1)))
            .map(|net| net.round_dp(2))
            .ok_or_else(|| WorldError::ArithmeticOverflow {
                context: format!("sale price of {qty} {item}"),
            })
    }

    /// Remove `qty` units from stock.
    pub fn take(&mut self, item: &ItemId, qty: u32) -> Result<(), WorldError> {
        let listing = self.listed_mut(item)?;
        let available = listing.quantity;
        listing.quantity = available
            .checked_sub(qty)
            .ok_or_else(|| WorldError::OutOfStock {
                item: item.clone(),
                requested: qty,
                available,
            })?;
        Ok(())
    }

    /// Return `qty` units to stock.
    pub fn put(&mut self, item: &ItemId, qty: u32) -> Result<(), WorldError> {
        let listing = self.listed_mut(item)?;
        listing.quantity = listing
            .quantity
            .checked_add(qty)
            .ok_or_else(|| WorldError::ArithmeticOverflow {
                context: format!("market stock of {item}"),
            })?;
        Ok(())
    }

    /// Reprice every listing for `day`, at most once per day.
    ///
    /// Returns `false` without touching prices when `day` has already
    /// been refreshed (or is older than the last refresh).
    pub fn refresh<R: Rng>(&mut self, day: u32, rng: &mut R) -> bool {
        if day <= self.last_refreshed_day {
            return false;
        }
        let multiplier = if day == 1 {
            self.settings.first_day_multiplier
        } else {
            Decimal::ONE
        };
        let band = self.settings.price_band;

        for (item, listing) in &mut self.listings {
            let swing = Decimal::from_f64(rng.random::<f64>().mul_add(2.0, -1.0))
                .unwrap_or(Decimal::ZERO);
            let proposed = listing
                .daily_volatility
                .checked_mul(multiplier)
                .and_then(|volatility| volatility.checked_mul(swing))
                .and_then(|offset| listing.avg_price.checked_add(offset))
                .map(|price| price.round_dp(2));
            match proposed {
                Some(proposed) => {
                    let (low, high) = band_around(listing.avg_price, band);
                    listing.cur_price = proposed.max(low).min(high);
                }
                None => {
                    warn!(item = %item, day, "Repricing overflowed, keeping the current price");
                }
            }
            if let Some(floor) = listing.restock_to {
                listing.quantity = listing.quantity.max(floor);
            }
            debug!(item = %item, day, price = %listing.cur_price, stock = listing.quantity, "Repriced listing");
        }

        self.last_refreshed_day = day;
        true
    }

    fn listed(&self, item: &ItemId) -> Result<&Listing, WorldError> {
        self.listings
            .get(item)
            .ok_or_else(|| WorldError::NotListed { item: item.clone() })
    }

    fn listed_mut(&mut self, item: &ItemId) -> Result<&mut Listing, WorldError> {
        self.listings
            .get_mut(item)
            .ok_or_else(|| WorldError::NotListed { item: item.clone() })
    }
}

/// `avg` widened by `band` of itself on both sides, saturating.
fn band_around(avg: Decimal, band: Decimal) -> (Decimal, Decimal) {
    let spread = avg.saturating_mul(band).abs();
    (avg.saturating_sub(spread), avg.saturating_add(spread))
}
