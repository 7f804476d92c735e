//! Scripted provider gateway, catalog and record store shared by use case tests.

use crate::ports::provider_gateway::{GatewayError, ProviderGateway, ProviderReply};
use crate::ports::record_store::{RecordFilter, RecordStore, StoreError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use switchboard_domain::{
    Capabilities, Endpoint, Model, Pricing, Provider, ProviderApi, ProviderCatalog, RateLimit,
    Request, Usage,
};

type Script = Arc<dyn Fn(&Request) -> Result<ProviderReply, GatewayError> + Send + Sync>;

/// Gateway whose behaviour is scripted per model id.
///
/// Unscripted models answer with HTTP 404.
#[derive(Default)]
pub(crate) struct StubGateway {
    scripts: HashMap<String, (Option<Duration>, Script)>,
    calls: Mutex<Vec<(String, String)>>,
}

impl StubGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond_with(
        mut self,
        model: &str,
        script: impl Fn(&Request) -> Result<ProviderReply, GatewayError> + Send + Sync + 'static,
    ) -> Self {
        self.scripts
            .insert(model.to_string(), (None, Arc::new(script)));
        self
    }

    /// Fixed answer with 10 prompt and 5 completion tokens
    pub fn reply(self, model: &str, content: &str) -> Self {
        let content = content.to_string();
        self.respond_with(model, move |_| {
            Ok(ProviderReply::new(content.clone(), Usage::new(10, 5)))
        })
    }

    pub fn fail(self, model: &str, code: u16) -> Self {
        self.respond_with(model, move |_| {
            Err(GatewayError::Status {
                code,
                message: "scripted failure".to_string(),
            })
        })
    }

    pub fn slow(mut self, model: &str, delay: Duration, content: &str) -> Self {
        let content = content.to_string();
        let script: Script =
            Arc::new(move |_| Ok(ProviderReply::new(content.clone(), Usage::new(10, 5))));
        self.scripts
            .insert(model.to_string(), (Some(delay), script));
        self
    }

    /// `(model, prompt)` pairs in call order
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, model: &str) -> usize {
        self.calls().iter().filter(|(m, _)| m == model).count()
    }
}

#[async_trait]
impl ProviderGateway for StubGateway {
    async fn invoke(
        &self,
        _provider: &Provider,
        model: &Model,
        request: &Request,
    ) -> Result<ProviderReply, GatewayError> {
        self.calls
            .lock()
            .unwrap()
            .push((model.id.clone(), request.prompt.clone()));

        let Some((delay, script)) = self.scripts.get(&model.id) else {
            return Err(GatewayError::Status {
                code: 404,
                message: format!("no script for {}", model.id),
            });
        };
        if let Some(delay) = delay {
            tokio::time::sleep(*delay).await;
        }
        script(request)
    }
}

/// Three providers:
///
/// - `alpha`: every capability, cheap, models `a1` (tier 1) and `a2` (tier 2)
/// - `beta`: no capabilities, pricier, models `b1` (tier 1) and `b2` (tier 3)
/// - `tight`: one request per minute, model `t1` (tier 0)
pub(crate) fn catalog() -> ProviderCatalog {
    let alpha = Provider::new(
        "alpha",
        "Alpha",
        Endpoint::new("http://alpha.invalid/v1", ProviderApi::OpenAi),
    )
    .with_capabilities(Capabilities::all())
    .with_pricing(Pricing::new(0.001, 0.002))
    .with_rate_limit(RateLimit::new(100, 60_000))
    .with_model(Model::new("a1").with_cost_tier(1).with_tag("general"))
    .with_model(Model::new("a2").with_cost_tier(2).with_tag("general"));

    let beta = Provider::new(
        "beta",
        "Beta",
        Endpoint::new("http://beta.invalid", ProviderApi::Anthropic),
    )
    .with_pricing(Pricing::new(0.01, 0.03))
    .with_rate_limit(RateLimit::new(100, 60_000))
    .with_model(Model::new("b1").with_cost_tier(1).with_tag("general"))
    .with_model(Model::new("b2").with_cost_tier(3));

    let tight = Provider::new(
        "tight",
        "Tight",
        Endpoint::new("http://tight.invalid/v1", ProviderApi::OpenAi),
    )
    .with_rate_limit(RateLimit::new(1, 60_000))
    .with_model(Model::new("t1").with_cost_tier(0));

    ProviderCatalog::from_providers([alpha, beta, tight])
}

/// Record store kept in a mutex-guarded map.
#[derive(Default)]
pub(crate) struct VecStore {
    tables: Mutex<HashMap<String, Vec<serde_json::Map<String, serde_json::Value>>>>,
}

#[async_trait]
impl RecordStore for VecStore {
    async fn insert(&self, table: &str, record: serde_json::Value) -> Result<String, StoreError> {
        let serde_json::Value::Object(mut record) = record else {
            return Err(StoreError::NotAnObject);
        };
        let mut tables = self.tables.lock().unwrap();
        let rows = tables.entry(table.to_string()).or_default();
        let id = format!("{}-{}", table, rows.len() + 1);
        record.insert("id".to_string(), id.clone().into());
        rows.push(record);
        Ok(id)
    }

    async fn select(
        &self,
        table: &str,
        filter: &RecordFilter,
    ) -> Result<Vec<serde_json::Value>, StoreError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .get(table)
            .map(|rows| filter.apply(rows))
            .unwrap_or_default())
    }
}
