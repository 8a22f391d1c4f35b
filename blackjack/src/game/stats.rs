//! Per-session statistics counters.
//!
//! Counters are owned by the engine instance driving the session and are
//! monotonically updated; nothing here ever resets mid-session.

use serde::{Deserialize, Serialize};

use super::entities::{Chips, Decision, Hand, Outcome};

/// Every counter a session tracks across all of its rounds.
///
/// The streak is signed: positive while winning, negative while losing,
/// reset to zero by a push.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct SessionStats {
    pub rounds_played: u32,
    pub wins: u32,
    pub losses: u32,
    pub pushes: u32,

    pub current_streak: i32,
    pub longest_win_streak: u32,
    pub longest_loss_streak: u32,

    pub blackjacks: u32,
    pub dealer_blackjacks: u32,
    pub busts: u32,
    pub biggest_bust: u8,
    pub dealer_busts: u32,

    pub total_hits: u32,
    pub total_stands: u32,
    pub double_downs: u32,
    pub double_downs_won: u32,
    pub double_downs_lost: u32,

    /// Sum of final hand totals, for the average.
    pub total_hand_value: u32,

    pub starting_chips: Chips,
    pub current_chips: Chips,
    pub best_chip_balance: Chips,
    pub worst_chip_balance: Chips,
    pub total_won: Chips,
    pub total_lost: Chips,
    pub biggest_win: Chips,
}

impl SessionStats {
    /// Track a hit/stand decision. Double-downs count toward both the
    /// double-down counter and a stand (one card, then forced stand).
    pub fn record_decision(&mut self, decision: Decision) {
        match decision {
            Decision::Hit => self.total_hits += 1,
            Decision::Stand => self.total_stands += 1,
            Decision::DoubleDown => {
                self.total_hits += 1;
                self.total_stands += 1;
            }
        }
    }

    /// Track a chip balance change. The first call fixes the starting
    /// balance and both extrema.
    pub fn update_chips(&mut self, balance: Chips) {
        if self.starting_chips == 0 {
            self.starting_chips = balance;
            self.best_chip_balance = balance;
            self.worst_chip_balance = balance;
        }
        self.current_chips = balance;
        self.best_chip_balance = self.best_chip_balance.max(balance);
        self.worst_chip_balance = self.worst_chip_balance.min(balance);
    }

    /// Fold one finished round into the counters. `winnings` is the
    /// amount credited back to the balance (escrow included), zero on a
    /// loss.
    pub fn record_round(
        &mut self,
        outcome: Outcome,
        player: &Hand,
        dealer: &Hand,
        bet: Chips,
        doubled: bool,
        winnings: Chips,
    ) {
        self.rounds_played += 1;
        self.total_hand_value += u32::from(player.total());

        match outcome {
            Outcome::Win => {
                self.wins += 1;
                self.bump_streak(true);
                if dealer.is_bust() {
                    self.dealer_busts += 1;
                }
                if bet > 0 {
                    self.total_won += winnings;
                    self.biggest_win = self.biggest_win.max(winnings);
                    if doubled {
                        self.double_downs_won += 1;
                    }
                }
            }
            Outcome::Loss => {
                self.losses += 1;
                self.bump_streak(false);
                if player.is_bust() {
                    self.busts += 1;
                    self.biggest_bust = self.biggest_bust.max(player.total());
                }
                if bet > 0 {
                    self.total_lost += bet;
                    if doubled {
                        self.double_downs_lost += 1;
                    }
                }
            }
            Outcome::Push => {
                self.pushes += 1;
                self.current_streak = 0;
            }
        }

        if player.is_blackjack() {
            self.blackjacks += 1;
        }
        if dealer.is_blackjack() {
            self.dealer_blackjacks += 1;
        }
        if doubled {
            self.double_downs += 1;
        }
    }

    #[must_use]
    pub fn win_rate(&self) -> f64 {
        if self.rounds_played == 0 {
            return 0.0;
        }
        f64::from(self.wins) / f64::from(self.rounds_played) * 100.0
    }

    #[must_use]
    pub fn average_hand(&self) -> f64 {
        if self.rounds_played == 0 {
            return 0.0;
        }
        f64::from(self.total_hand_value) / f64::from(self.rounds_played)
    }

    fn bump_streak(&mut self, won: bool) {
        if won {
            self.current_streak = if self.current_streak >= 0 {
                self.current_streak + 1
            } else {
                1
            };
            self.longest_win_streak = self
                .longest_win_streak
                .max(self.current_streak.unsigned_abs());
        } else {
            self.current_streak = if self.current_streak <= 0 {
                self.current_streak - 1
            } else {
                -1
            };
            self.longest_loss_streak = self
                .longest_loss_streak
                .max(self.current_streak.unsigned_abs());
        }
    }
}
