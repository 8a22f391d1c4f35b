//! Basic-strategy decision logic.
//!
//! The policy is a simplified basic-strategy table: hard and soft stand
//! thresholds plus the dealer-upcard-dependent refinements for stiff
//! hands. Every threshold lives in [`StrategyConfig`] so the policy can
//! be tightened or tested against a published table rather than treated
//! as gospel.

use crate::game::entities::{Card, Decision, Hand};

/// Thresholds steering [`BasicStrategy`].
///
/// Totals are hand totals (2-21); upcard values are blackjack card
/// values (2-11, ace counting 11).
#[derive(Clone, Debug)]
pub struct StrategyConfig {
    /// Always hit hard totals at or below this.
    ///
    /// **Typical**: 8 — there is no way to bust and no reason to stay.
    pub always_hit_max: u8,

    /// Stand on hard totals at or above this.
    ///
    /// **Typical**: 17. Lower plays looser against strong upcards.
    pub hard_stand: u8,

    /// Hard totals from here up to `hard_stand - 1` stand when the
    /// dealer shows a weak upcard (see `weak_upcard_max`).
    ///
    /// **Typical**: 13 — the classic "let the dealer bust" range.
    pub stiff_stand_floor: u8,

    /// A dealer upcard at or below this counts as weak.
    ///
    /// **Typical**: 6 (the dealer is forced to draw into a stiff hand).
    pub weak_upcard_max: u8,

    /// Hard 12 stands only against upcards in this inclusive range.
    ///
    /// **Typical**: 4-6; against 2-3 or 7+ the 12 hits.
    pub twelve_stand_range: (u8, u8),

    /// Stand on soft totals at or above this.
    ///
    /// **Typical**: 19. Soft hands below keep hitting freely.
    pub soft_stand: u8,

    /// A soft 18 hits when the dealer shows at least this.
    ///
    /// **Typical**: 9 — soft 18 stands against anything weaker.
    pub soft_eighteen_hit_vs: u8,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            always_hit_max: 8,
            hard_stand: 17,
            stiff_stand_floor: 13,
            weak_upcard_max: 6,
            twelve_stand_range: (4, 6),
            soft_stand: 19,
            soft_eighteen_hit_vs: 9,
        }
    }
}

/// A fixed lookup policy playing hit-or-stand blackjack.
#[derive(Clone, Debug, Default)]
pub struct BasicStrategy {
    config: StrategyConfig,
}

impl BasicStrategy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(config: StrategyConfig) -> Self {
        Self { config }
    }

    /// Decide for a hand against the dealer's upcard. The reason string
    /// is for logs and UI commentary.
    #[must_use]
    pub fn decide(&self, player: &Hand, dealer_upcard: Card) -> (Decision, &'static str) {
        let cfg = &self.config;
        let total = player.total();
        let upcard = dealer_upcard.value();

        if total >= 21 {
            return (Decision::Stand, "21 never takes another card");
        }
        if total <= cfg.always_hit_max {
            return (Decision::Hit, "can't bust a low hand");
        }

        if player.is_soft() {
            return if total >= cfg.soft_stand {
                (Decision::Stand, "soft 19 or better stands")
            } else if total == 18 {
                if upcard >= cfg.soft_eighteen_hit_vs {
                    (Decision::Hit, "soft 18 hits against a strong upcard")
                } else {
                    (Decision::Stand, "soft 18 holds against a weak upcard")
                }
            } else {
                (Decision::Hit, "soft hands hit freely")
            };
        }

        if total >= cfg.hard_stand {
            return (Decision::Stand, "hard 17 or better stands");
        }
        if total >= cfg.stiff_stand_floor {
            return if upcard <= cfg.weak_upcard_max {
                (Decision::Stand, "let a weak dealer draw into a bust")
            } else {
                (Decision::Hit, "stiff hand must chase a strong upcard")
            };
        }
        if total == 12 {
            let (lo, hi) = cfg.twelve_stand_range;
            return if (lo..=hi).contains(&upcard) {
                (Decision::Stand, "12 stands against a bust-prone upcard")
            } else {
                (Decision::Hit, "12 hits everything else")
            };
        }

        (Decision::Hit, "9 through 11 always want a card")
    }
}
