#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shop economy: gold, level-weighted offers, rerolls, leveling and refunds.
//!
//! The shop owns the battle's only random number generator. Every offer is
//! rolled from a seeded [`ChaCha8Rng`], so two shops built with the same seed
//! and driven by the same calls produce identical offers.

use std::sync::Arc;

use gridfuse_core::{
    catalog::COST_TIERS, ActionError, Catalog, ShopRules, ShopSnapshot, StageConfig, TemplateId,
    MAX_SHOP_LEVEL, REROLL_COST, SHOP_SLOTS,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

/// Template and price of a successful purchase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Purchase {
    /// Template bought.
    pub template: TemplateId,
    /// Gold spent.
    pub cost: u32,
}

/// Gold returned when selling a unit of the provided cost and star level.
#[must_use]
pub fn refund_for(cost: u32, star: u8) -> u32 {
    if star >= 2 {
        cost * u32::from(star)
    } else {
        (cost / 2).max(1)
    }
}

/// Gold required to raise the shop from the provided level.
#[must_use]
pub const fn level_up_cost(level: u32) -> u32 {
    level.saturating_mul(2).saturating_add(4)
}

/// Player economy for a single battle.
#[derive(Debug)]
pub struct Shop {
    catalog: Arc<Catalog>,
    rules: ShopRules,
    slots: [Option<TemplateId>; SHOP_SLOTS],
    gold: u32,
    level: u32,
    xp: u32,
    deploy_cap: u32,
    rng: ChaCha8Rng,
}

impl Shop {
    /// Creates the shop for a stage and fills every slot.
    #[must_use]
    pub fn new(stage: &StageConfig, catalog: Arc<Catalog>, seed: u64) -> Self {
        let mut shop = Self {
            catalog,
            rules: stage.shop_rules.clone(),
            slots: [None; SHOP_SLOTS],
            gold: stage.starting_gold,
            level: stage.starting_level,
            xp: 0,
            deploy_cap: stage.deploy_cap,
            rng: ChaCha8Rng::seed_from_u64(seed),
        };
        shop.refresh();
        shop
    }

    /// Gold currently available.
    #[must_use]
    pub fn gold(&self) -> u32 {
        self.gold
    }

    /// Current shop level.
    #[must_use]
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Experience toward the next level.
    #[must_use]
    pub fn xp(&self) -> u32 {
        self.xp
    }

    /// Maximum number of units allowed on the board.
    #[must_use]
    pub fn deploy_cap(&self) -> u32 {
        self.deploy_cap
    }

    /// Offers in slot order; `None` marks a bought-out slot.
    #[must_use]
    pub fn slots(&self) -> &[Option<TemplateId>; SHOP_SLOTS] {
        &self.slots
    }

    /// Capabilities granted by the stage.
    #[must_use]
    pub fn rules(&self) -> &ShopRules {
        &self.rules
    }

    /// Adds gold earned from kills or wave bonuses.
    pub fn add_gold(&mut self, amount: u32) {
        self.gold = self.gold.saturating_add(amount);
    }

    /// Replaces every slot with a freshly rolled offer.
    pub fn refresh(&mut self) {
        for index in 0..SHOP_SLOTS {
            self.slots[index] = self.roll();
        }
    }

    /// Checks whether the offer in `slot` can be bought right now.
    pub fn can_buy(&self, slot: usize) -> Result<Purchase, ActionError> {
        let template = self
            .slots
            .get(slot)
            .ok_or(ActionError::InvalidSlot)?
            .ok_or(ActionError::EmptySlot)?;
        let cost = self
            .catalog
            .unit(template)
            .map(|def| def.cost)
            .ok_or(ActionError::EmptySlot)?;
        if self.gold < cost {
            return Err(ActionError::InsufficientGold);
        }
        Ok(Purchase { template, cost })
    }

    /// Buys the offer in `slot`, spending gold and emptying the slot.
    pub fn buy(&mut self, slot: usize) -> Result<Purchase, ActionError> {
        let purchase = self.can_buy(slot)?;
        self.gold -= purchase.cost;
        self.slots[slot] = None;
        debug!(slot, template = purchase.template.get(), cost = purchase.cost, "offer bought");
        Ok(purchase)
    }

    /// Checks whether a reroll is allowed and affordable.
    pub fn can_reroll(&self) -> Result<u32, ActionError> {
        if !self.rules.reroll_enabled {
            return Err(ActionError::RerollDisabled);
        }
        if self.gold < REROLL_COST {
            return Err(ActionError::InsufficientGold);
        }
        Ok(REROLL_COST)
    }

    /// Pays for and performs a full refresh.
    pub fn reroll(&mut self) -> Result<u32, ActionError> {
        let cost = self.can_reroll()?;
        self.gold -= cost;
        self.refresh();
        debug!(cost, gold = self.gold, "shop rerolled");
        Ok(cost)
    }

    /// Gold required for the next level.
    #[must_use]
    pub fn level_up_cost(&self) -> u32 {
        level_up_cost(self.level)
    }

    /// Checks whether leveling is allowed and affordable.
    pub fn can_level_up(&self) -> Result<u32, ActionError> {
        if !self.rules.level_up_enabled {
            return Err(ActionError::LevelUpDisabled);
        }
        if self.level >= MAX_SHOP_LEVEL {
            return Err(ActionError::MaxLevel);
        }
        let cost = self.level_up_cost();
        if self.gold < cost {
            return Err(ActionError::InsufficientGold);
        }
        Ok(cost)
    }

    /// Pays to raise the shop level and the deploy cap by one.
    pub fn level_up(&mut self) -> Result<u32, ActionError> {
        let cost = self.can_level_up()?;
        self.gold -= cost;
        self.level += 1;
        self.deploy_cap += 1;
        debug!(level = self.level, deploy_cap = self.deploy_cap, cost, "shop leveled");
        Ok(cost)
    }

    /// Credits the refund for selling a unit and returns the amount.
    pub fn sell(&mut self, cost: u32, star: u8) -> u32 {
        let refund = refund_for(cost, star);
        self.add_gold(refund);
        refund
    }

    /// Captures the read-only view used for rendering.
    #[must_use]
    pub fn snapshot(&self) -> ShopSnapshot {
        ShopSnapshot {
            slots: self.slots,
            gold: self.gold,
            level: self.level,
            xp: self.xp,
            deploy_cap: self.deploy_cap,
            level_up_cost: self.level_up_cost(),
        }
    }

    fn roll(&mut self) -> Option<TemplateId> {
        let weights = self.catalog.shop_weights(self.level);
        let mut allowed = [0.0; COST_TIERS];
        for &cost in &self.rules.allowed_costs {
            let Some(index) = cost.checked_sub(1).and_then(|i| usize::try_from(i).ok()) else {
                continue;
            };
            if let Some(weight) = weights.get(index) {
                allowed[index] = *weight;
            }
        }

        let total: f64 = allowed.iter().sum();
        if total <= 0.0 {
            return self.pick_with_cost(1);
        }

        let roll = self.rng.gen::<f64>() * total;
        let mut cumulative = 0.0;
        let mut selected = 1;
        for (tier, weight) in (1..).zip(allowed) {
            cumulative += weight;
            if roll <= cumulative {
                selected = tier;
                break;
            }
        }

        if self.catalog.templates_with_cost(selected).next().is_none() {
            selected = 1;
        }
        self.pick_with_cost(selected)
    }

    fn pick_with_cost(&mut self, cost: u32) -> Option<TemplateId> {
        let candidates: Vec<TemplateId> = self.catalog.templates_with_cost(cost).collect();
        if candidates.is_empty() {
            return None;
        }
        let index = self.rng.gen_range(0..candidates.len());
        candidates.get(index).copied()
    }
}
