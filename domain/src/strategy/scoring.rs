//! Response scoring used by best-of-n and by every strategy's `best` pick.
//!
//! Each component is normalized to `[0, 1]` before weighting, so the total is
//! also in `[0, 1]` and no single factor can swamp the others:
//!
//! | component | value |
//! |---|---|
//! | speed | `1 / (1 + latency_secs)` |
//! | length | `min(chars / 2000, 1)` |
//! | cost efficiency | `1 / (1 + 100 * cost_usd)` |
//! | capability | `enabled provider flags / 3` |

use crate::catalog::Capabilities;
use crate::request::Response;
use serde::{Deserialize, Serialize};

const LENGTH_SATURATION_CHARS: f64 = 2000.0;
const COST_SCALE: f64 = 100.0;

/// Weights applied to each score component.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub speed: f64,
    pub length: f64,
    pub cost_efficiency: f64,
    pub capability: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            speed: 0.3,
            length: 0.2,
            cost_efficiency: 0.2,
            capability: 0.3,
        }
    }
}

/// Per-component view of a score, useful for logging.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub speed: f64,
    pub length: f64,
    pub cost_efficiency: f64,
    pub capability: f64,
    pub total: f64,
}

impl ScoreWeights {
    pub fn score(&self, response: &Response, capability_count: usize) -> ScoreBreakdown {
        let speed = 1.0 / (1.0 + response.latency.as_secs_f64());
        let length = (response.content.chars().count() as f64 / LENGTH_SATURATION_CHARS).min(1.0);
        let cost_efficiency = 1.0 / (1.0 + COST_SCALE * response.cost.max(0.0));
        let capability =
            (capability_count.min(Capabilities::TOTAL) as f64) / Capabilities::TOTAL as f64;

        ScoreBreakdown {
            speed,
            length,
            cost_efficiency,
            capability,
            total: self.speed * speed
                + self.length * length
                + self.cost_efficiency * cost_efficiency
                + self.capability * capability,
        }
    }
}

/// Indices of `scores` ordered best first. Ties keep input order.
pub fn rank(scores: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
    order
}
