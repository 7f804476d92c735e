//! Multi-call strategy engine
//!
//! Fans one request out to several models through the router and reduces the
//! answers according to a [`Strategy`]. Individual model failures are partial:
//! they are collected in `failures` and never abort the strategy.

use super::route_call::SingleCallRouter;
use crate::ports::progress::{NoProgress, ProgressNotifier};
use crate::ports::provider_gateway::ProviderGateway;
use futures::future::join_all;
use std::time::Instant;
use switchboard_domain::strategy::{DEFAULT_CONSENSUS_THRESHOLD, rank};
use switchboard_domain::{
    CallFailure, ConsensusSummary, DomainError, MultiCallResult, Request, Response, ScoreWeights,
    Strategy, StrategyRequest,
};
use tracing::{debug, info, warn};

/// Use case for fanning a request out to several models
pub struct StrategyEngine<G: ProviderGateway + 'static> {
    router: SingleCallRouter<G>,
    weights: ScoreWeights,
    consensus_threshold: usize,
}

impl<G: ProviderGateway + 'static> StrategyEngine<G> {
    pub fn new(router: SingleCallRouter<G>) -> Self {
        Self {
            router,
            weights: ScoreWeights::default(),
            consensus_threshold: DEFAULT_CONSENSUS_THRESHOLD,
        }
    }

    pub fn with_weights(mut self, weights: ScoreWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Threshold used when a request does not carry its own
    pub fn with_consensus_threshold(mut self, threshold: usize) -> Self {
        self.consensus_threshold = threshold;
        self
    }

    pub fn router(&self) -> &SingleCallRouter<G> {
        &self.router
    }

    /// Run a parsed strategy request
    pub async fn run(&self, request: &StrategyRequest) -> Result<MultiCallResult, DomainError> {
        self.run_with_progress(request, &NoProgress).await
    }

    pub async fn run_with_progress(
        &self,
        request: &StrategyRequest,
        progress: &dyn ProgressNotifier,
    ) -> Result<MultiCallResult, DomainError> {
        let threshold = request
            .consensus_threshold
            .unwrap_or(self.consensus_threshold);
        self.execute(
            &request.to_request(),
            &request.models,
            request.strategy,
            threshold,
            progress,
        )
        .await
    }

    /// Send `request` to every model in `model_ids` under `strategy`
    pub async fn call_many(
        &self,
        request: &Request,
        model_ids: &[String],
        strategy: Strategy,
    ) -> Result<MultiCallResult, DomainError> {
        self.execute(
            request,
            model_ids,
            strategy,
            self.consensus_threshold,
            &NoProgress,
        )
        .await
    }

    async fn execute(
        &self,
        request: &Request,
        model_ids: &[String],
        strategy: Strategy,
        threshold: usize,
        progress: &dyn ProgressNotifier,
    ) -> Result<MultiCallResult, DomainError> {
        if model_ids.is_empty() {
            return Err(DomainError::NoModels);
        }
        let threshold = threshold.max(1);

        info!(
            strategy = %strategy,
            models = model_ids.len(),
            "Starting multi-model call"
        );
        let started = Instant::now();

        let (mut responses, failures) = match strategy {
            Strategy::Cascade => self.cascade(request, model_ids, progress).await,
            Strategy::Parallel | Strategy::Consensus | Strategy::BestOfN => {
                self.fan_out(request, model_ids, progress).await
            }
        };

        let scores: Vec<f64> = responses.iter().map(|r| self.score(r)).collect();
        let order = rank(&scores);
        let best = order.first().map(|&i| responses[i].clone());

        if strategy == Strategy::BestOfN {
            let mut slots: Vec<Option<Response>> = responses.into_iter().map(Some).collect();
            responses = order.iter().filter_map(|&i| slots[i].take()).collect();
        }

        let consensus = (strategy == Strategy::Consensus)
            .then(|| ConsensusSummary::evaluate(&responses, threshold));

        let total_cost = responses.iter().map(|r| r.cost).sum();
        let total_time = started.elapsed();
        let success = !responses.is_empty();

        info!(
            strategy = %strategy,
            responded = responses.len(),
            failed = failures.len(),
            cost = total_cost,
            latency_ms = total_time.as_millis() as u64,
            "Multi-model call finished"
        );

        Ok(MultiCallResult {
            strategy,
            responses,
            best,
            total_cost,
            total_time,
            success,
            failures,
            consensus,
        })
    }

    /// Call every model concurrently. Responses keep the input order.
    async fn fan_out(
        &self,
        request: &Request,
        model_ids: &[String],
        progress: &dyn ProgressNotifier,
    ) -> (Vec<Response>, Vec<CallFailure>) {
        let calls = model_ids.iter().map(|model_id| async move {
            let result = self.router.call(request, model_id).await;
            progress.on_call_complete(model_id, result.is_ok());
            (model_id, result)
        });

        let mut responses = Vec::with_capacity(model_ids.len());
        let mut failures = Vec::new();
        for (model_id, result) in join_all(calls).await {
            match result {
                Ok(response) => {
                    debug!(model = %model_id, "Model responded");
                    responses.push(response);
                }
                Err(e) => {
                    warn!(model = %model_id, error = %e, "Model failed");
                    failures.push(CallFailure::new(model_id.as_str(), &e));
                }
            }
        }
        (responses, failures)
    }

    /// Call models one at a time until the first success.
    async fn cascade(
        &self,
        request: &Request,
        model_ids: &[String],
        progress: &dyn ProgressNotifier,
    ) -> (Vec<Response>, Vec<CallFailure>) {
        let mut failures = Vec::new();
        for model_id in model_ids {
            let result = self.router.call(request, model_id).await;
            progress.on_call_complete(model_id, result.is_ok());
            match result {
                Ok(response) => {
                    debug!(model = %model_id, attempts = failures.len() + 1, "Cascade settled");
                    return (vec![response], failures);
                }
                Err(e) => {
                    warn!(model = %model_id, error = %e, "Cascade step failed, trying next model");
                    failures.push(CallFailure::new(model_id.as_str(), &e));
                }
            }
        }
        (Vec::new(), failures)
    }

    fn score(&self, response: &Response) -> f64 {
        let capabilities = self.router.capability_count(&response.provider_id);
        self.weights.score(response, capabilities).total
    }
}
