//! Service metrics with Prometheus text export.

use std::sync::atomic::{AtomicU64, Ordering};

/// Prometheus-compatible metrics registry. Counters only; everything of
/// interest is monotonic.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    pub bets_settled_total: AtomicU64,
    pub bets_won_total: AtomicU64,
    pub bets_rejected_total: AtomicU64,
    pub settlement_conflicts_total: AtomicU64,
    pub wagered_cents_total: AtomicU64,
    pub payout_cents_total: AtomicU64,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_settlement(&self, amount: u64, payout: u64, won: bool) {
        self.bets_settled_total.fetch_add(1, Ordering::Relaxed);
        if won {
            self.bets_won_total.fetch_add(1, Ordering::Relaxed);
        }
        self.wagered_cents_total.fetch_add(amount, Ordering::Relaxed);
        self.payout_cents_total.fetch_add(payout, Ordering::Relaxed);
    }

    pub fn record_rejection(&self) {
        self.bets_rejected_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_conflict(&self) {
        self.settlement_conflicts_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Render the Prometheus text exposition format.
    pub fn to_prometheus_format(&self) -> String {
        let mut output = String::new();

        let counters: [(&str, &str, u64); 6] = [
            (
                "fairbet_bets_settled_total",
                "Total settled bets",
                self.bets_settled_total.load(Ordering::Relaxed),
            ),
            (
                "fairbet_bets_won_total",
                "Total winning bets",
                self.bets_won_total.load(Ordering::Relaxed),
            ),
            (
                "fairbet_bets_rejected_total",
                "Total rejected bet requests",
                self.bets_rejected_total.load(Ordering::Relaxed),
            ),
            (
                "fairbet_settlement_conflicts_total",
                "Settlements failed after exhausting conflict retries",
                self.settlement_conflicts_total.load(Ordering::Relaxed),
            ),
            (
                "fairbet_wagered_cents_total",
                "Total amount wagered in cents",
                self.wagered_cents_total.load(Ordering::Relaxed),
            ),
            (
                "fairbet_payout_cents_total",
                "Total amount paid out in cents",
                self.payout_cents_total.load(Ordering::Relaxed),
            ),
        ];

        for (name, help, value) in counters {
            output.push_str(&format!(
                "# HELP {name} {help}\n# TYPE {name} counter\n{name} {value}\n\n"
            ));
        }

        output
    }
}
