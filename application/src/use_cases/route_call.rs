//! Single-call router
//!
//! Resolves a model, takes an admission from the provider's rate window,
//! invokes the gateway under a deadline and accounts the cost.

use crate::ports::provider_gateway::{GatewayError, ProviderGateway};
use crate::services::{CostAccountant, RateLimiter};
use std::sync::Arc;
use std::time::{Duration, Instant};
use switchboard_domain::{DomainError, ModelFilter, ProviderCatalog, Request, Response};
use tracing::{debug, warn};

/// Router for one request to one model.
///
/// Cheap to clone; clones share the catalog, limiter and accountant.
pub struct SingleCallRouter<G: ProviderGateway + 'static> {
    gateway: Arc<G>,
    catalog: Arc<ProviderCatalog>,
    limiter: Arc<RateLimiter>,
    accountant: Arc<CostAccountant>,
    call_timeout: Duration,
}

impl<G: ProviderGateway + 'static> Clone for SingleCallRouter<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            catalog: Arc::clone(&self.catalog),
            limiter: Arc::clone(&self.limiter),
            accountant: Arc::clone(&self.accountant),
            call_timeout: self.call_timeout,
        }
    }
}

impl<G: ProviderGateway + 'static> SingleCallRouter<G> {
    pub fn new(gateway: Arc<G>, catalog: Arc<ProviderCatalog>) -> Self {
        Self {
            gateway,
            catalog,
            limiter: Arc::new(RateLimiter::new()),
            accountant: Arc::new(CostAccountant::new()),
            call_timeout: Duration::from_secs(60),
        }
    }

    pub fn with_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.limiter = limiter;
        self
    }

    pub fn with_accountant(mut self, accountant: Arc<CostAccountant>) -> Self {
        self.accountant = accountant;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn catalog(&self) -> &ProviderCatalog {
        &self.catalog
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn accountant(&self) -> &CostAccountant {
        &self.accountant
    }

    /// Capability flag count of the provider behind `provider_id`.
    pub fn capability_count(&self, provider_id: &str) -> usize {
        self.catalog
            .provider(provider_id)
            .map(|p| p.capabilities.count())
            .unwrap_or(0)
    }

    /// Send `request` to `model_id`.
    ///
    /// Admission is taken before the network call and is never returned,
    /// even when the call then fails. No retries happen here.
    pub async fn call(&self, request: &Request, model_id: &str) -> Result<Response, DomainError> {
        let (provider, model) = self.catalog.resolve(model_id)?;
        self.limiter.admit(&provider.id, &provider.rate_limit)?;

        let started = Instant::now();
        let outcome = tokio::time::timeout(
            self.call_timeout,
            self.gateway.invoke(&provider, &model, request),
        )
        .await;
        let latency = started.elapsed();

        let reply = match outcome {
            Ok(Ok(reply)) => reply,
            Ok(Err(e)) => {
                debug!(provider = %provider.id, model = %model.id, error = %e, "Provider call failed");
                return Err(e.into_domain(&provider.id));
            }
            Err(_) => {
                warn!(
                    provider = %provider.id,
                    model = %model.id,
                    timeout_ms = self.call_timeout.as_millis() as u64,
                    "Provider call timed out"
                );
                return Err(GatewayError::Timeout.into_domain(&provider.id));
            }
        };

        let cost = self
            .accountant
            .record(&provider.id, &provider.pricing, &reply.usage);

        debug!(
            provider = %provider.id,
            model = %model.id,
            latency_ms = latency.as_millis() as u64,
            cost,
            tokens = reply.usage.total_tokens,
            "Provider call completed"
        );

        Ok(Response {
            content: reply.content,
            usage: reply.usage,
            finish_reason: reply.finish_reason,
            latency,
            cost,
            provider_id: provider.id.clone(),
            model_id: model.id,
            metadata: reply.metadata,
        })
    }

    /// Send `request` to the cheapest model matching `filter`.
    ///
    /// Candidates are tried in catalog order (cost tier, then id). A
    /// rate-limited candidate is skipped; any other failure is returned as is.
    pub async fn call_best_fit(
        &self,
        request: &Request,
        filter: &ModelFilter,
    ) -> Result<Response, DomainError> {
        let mut filter = filter.clone();
        filter.requires_vision |= request.needs_vision();
        filter.requires_tools |= request.needs_tools();

        let candidates: Vec<String> = self
            .catalog
            .list_models(&filter)
            .into_iter()
            .map(|m| m.id.clone())
            .collect();
        if candidates.is_empty() {
            return Err(DomainError::NoCandidates);
        }

        let mut soonest: Option<DomainError> = None;
        for model_id in &candidates {
            match self.call(request, model_id).await {
                Ok(response) => return Ok(response),
                Err(e @ DomainError::RateLimited { .. }) => {
                    debug!(model = %model_id, "Skipping rate-limited candidate");
                    let sooner = match &soonest {
                        Some(current) => e.retry_after() < current.retry_after(),
                        None => true,
                    };
                    if sooner {
                        soonest = Some(e);
                    }
                }
                Err(e) => return Err(e),
            }
        }

        Err(soonest.unwrap_or(DomainError::NoCandidates))
    }
}
