//! Per-provider cost accrual.

use dashmap::DashMap;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use switchboard_domain::{CostLedger, Pricing, Usage};
use tracing::trace;

/// Usage line for one provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderUsage {
    pub provider_id: String,
    #[serde(flatten)]
    pub ledger: CostLedger,
}

/// Usage across all providers, ordered by provider id.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct UsageReport {
    pub providers: Vec<ProviderUsage>,
    pub total_cost: f64,
}

impl UsageReport {
    pub fn total_calls(&self) -> u64 {
        self.providers.iter().map(|p| p.ledger.calls).sum()
    }
}

#[derive(Debug, Default)]
pub struct CostAccountant {
    ledgers: DashMap<String, Arc<Mutex<CostLedger>>>,
}

impl CostAccountant {
    pub fn new() -> Self {
        Self::default()
    }

    /// Price `usage` and add it to the provider's ledger. Returns the cost.
    pub fn record(&self, provider_id: &str, pricing: &Pricing, usage: &Usage) -> f64 {
        let cost = pricing.cost_of(usage);
        let ledger = Arc::clone(
            self.ledgers
                .entry(provider_id.to_string())
                .or_default()
                .value(),
        );
        let mut ledger = ledger.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        ledger.record(cost, usage);
        trace!(provider = provider_id, cost, total = ledger.total_cost, "Cost recorded");
        cost
    }

    /// Accumulated cost for one provider; zero when never called.
    pub fn total(&self, provider_id: &str) -> f64 {
        self.ledgers
            .get(provider_id)
            .map(|ledger| {
                ledger
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                    .total_cost
            })
            .unwrap_or(0.0)
    }

    pub fn grand_total(&self) -> f64 {
        self.snapshot().total_cost
    }

    pub fn snapshot(&self) -> UsageReport {
        let mut providers: Vec<ProviderUsage> = self
            .ledgers
            .iter()
            .map(|entry| ProviderUsage {
                provider_id: entry.key().clone(),
                ledger: entry
                    .value()
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                    .clone(),
            })
            .collect();
        providers.sort_by(|a, b| a.provider_id.cmp(&b.provider_id));
        let total_cost = providers.iter().map(|p| p.ledger.total_cost).sum();
        UsageReport {
            providers,
            total_cost,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cost_formula() {
        let accountant = CostAccountant::new();
        let pricing = Pricing::new(0.01, 0.03);
        let cost = accountant.record("openai", &pricing, &Usage::new(1000, 500));
        assert!((cost - 0.025).abs() < 1e-12);
        assert!((accountant.total("openai") - 0.025).abs() < 1e-12);
    }

    #[test]
    fn zero_usage_costs_nothing() {
        let accountant = CostAccountant::new();
        let cost = accountant.record("p", &Pricing::new(1.0, 1.0), &Usage::default());
        assert_eq!(cost, 0.0);
        assert_eq!(accountant.total("p"), 0.0);
        assert_eq!(accountant.total("never-called"), 0.0);
    }

    #[test]
    fn totals_do_not_depend_on_order() {
        let pricing = Pricing::new(0.003, 0.015);
        let usages = [
            Usage::new(120, 40),
            Usage::new(900, 1200),
            Usage::new(5, 0),
            Usage::new(3000, 250),
        ];

        let forward = CostAccountant::new();
        for usage in &usages {
            forward.record("p", &pricing, usage);
        }
        let backward = CostAccountant::new();
        for usage in usages.iter().rev() {
            backward.record("p", &pricing, usage);
        }

        assert!((forward.total("p") - backward.total("p")).abs() < 1e-12);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_records_are_all_counted() {
        let accountant = Arc::new(CostAccountant::new());
        let pricing = Pricing::new(1.0, 0.0);
        let handles: Vec<_> = (0..50)
            .map(|i| {
                let accountant = Arc::clone(&accountant);
                let provider = if i % 2 == 0 { "even" } else { "odd" };
                tokio::spawn(async move {
                    accountant.record(provider, &pricing, &Usage::new(1000, 0));
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        let report = accountant.snapshot();
        assert_eq!(report.total_calls(), 50);
        assert!((report.total_cost - 50.0).abs() < 1e-9);
        assert_eq!(report.providers[0].provider_id, "even");
        assert!((accountant.grand_total() - 50.0).abs() < 1e-9);
    }
}
