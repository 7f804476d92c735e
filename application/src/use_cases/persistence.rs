//! Chat history and graph library on top of the record store.

use crate::ports::record_store::{RecordFilter, RecordStore, StoreError};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use switchboard_domain::{ChainGraph, DomainError, GraphDescription, Request, Response, Role, Turn};
use thiserror::Error;
use tracing::debug;

/// Table holding one row per chat message
pub const CHAT_MESSAGES: &str = "chat_messages";

/// Table holding saved graph descriptions
pub const CHAIN_GRAPHS: &str = "chain_graphs";

/// Errors that can occur while persisting or loading records
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Malformed {table} record: {message}")]
    Malformed { table: String, message: String },

    #[error("No graph named '{0}'")]
    GraphNotFound(String),

    #[error("Refusing to save graph: {0}")]
    InvalidGraph(#[from] DomainError),
}

/// One stored chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub conversation_id: String,
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    /// RFC 3339 timestamp
    pub created_at: String,
}

/// Saved graph description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedGraph {
    pub name: String,
    pub description: GraphDescription,
    pub saved_at: String,
}

pub struct ChatHistory {
    store: Arc<dyn RecordStore>,
}

impl ChatHistory {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Store the user prompt and the model answer as two messages.
    pub async fn record_exchange(
        &self,
        conversation_id: &str,
        request: &Request,
        response: &Response,
    ) -> Result<(), PersistenceError> {
        let now = Utc::now().to_rfc3339();
        let user = ChatMessage {
            conversation_id: conversation_id.to_string(),
            role: Role::User,
            content: request.prompt.clone(),
            model_id: None,
            cost: None,
            created_at: now.clone(),
        };
        let assistant = ChatMessage {
            conversation_id: conversation_id.to_string(),
            role: Role::Assistant,
            content: response.content.clone(),
            model_id: Some(response.model_id.clone()),
            cost: Some(response.cost),
            created_at: now,
        };

        for message in [user, assistant] {
            self.store
                .insert(CHAT_MESSAGES, encode(CHAT_MESSAGES, &message)?)
                .await?;
        }
        debug!(conversation = conversation_id, "Exchange recorded");
        Ok(())
    }

    /// Messages of one conversation in the order they were recorded
    pub async fn conversation(
        &self,
        conversation_id: &str,
    ) -> Result<Vec<ChatMessage>, PersistenceError> {
        let filter = RecordFilter::new().field("conversation_id", conversation_id);
        self.store
            .select(CHAT_MESSAGES, &filter)
            .await?
            .into_iter()
            .map(|row| decode(CHAT_MESSAGES, row))
            .collect()
    }

    /// Conversation as request history
    pub async fn history(&self, conversation_id: &str) -> Result<Vec<Turn>, PersistenceError> {
        Ok(self
            .conversation(conversation_id)
            .await?
            .into_iter()
            .map(|m| Turn {
                role: m.role,
                content: m.content,
            })
            .collect())
    }
}

pub struct GraphLibrary {
    store: Arc<dyn RecordStore>,
}

impl GraphLibrary {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Save a description under `name`. Earlier versions are kept.
    ///
    /// The description must build into an acyclic graph; nothing is
    /// written otherwise.
    pub async fn save(
        &self,
        name: &str,
        description: &GraphDescription,
    ) -> Result<String, PersistenceError> {
        ChainGraph::from_description(description)?.execution_order()?;

        let saved = SavedGraph {
            name: name.to_string(),
            description: description.clone(),
            saved_at: Utc::now().to_rfc3339(),
        };
        let id = self
            .store
            .insert(CHAIN_GRAPHS, encode(CHAIN_GRAPHS, &saved)?)
            .await?;
        debug!(graph = name, id = %id, "Graph saved");
        Ok(id)
    }

    /// Most recently saved description for `name`
    pub async fn load(&self, name: &str) -> Result<GraphDescription, PersistenceError> {
        let filter = RecordFilter::new().field("name", name);
        let latest = self
            .store
            .select(CHAIN_GRAPHS, &filter)
            .await?
            .pop()
            .ok_or_else(|| PersistenceError::GraphNotFound(name.to_string()))?;
        let saved: SavedGraph = decode(CHAIN_GRAPHS, latest)?;
        Ok(saved.description)
    }

    /// Distinct graph names in first-saved order
    pub async fn names(&self) -> Result<Vec<String>, PersistenceError> {
        let mut names: Vec<String> = Vec::new();
        for row in self.store.select(CHAIN_GRAPHS, &RecordFilter::new()).await? {
            if let Some(name) = row.get("name").and_then(|n| n.as_str())
                && !names.iter().any(|seen| seen == name)
            {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }
}

fn encode<T: Serialize>(table: &str, value: &T) -> Result<serde_json::Value, PersistenceError> {
    serde_json::to_value(value).map_err(|e| PersistenceError::Malformed {
        table: table.to_string(),
        message: e.to_string(),
    })
}

fn decode<T: DeserializeOwned>(table: &str, row: serde_json::Value) -> Result<T, PersistenceError> {
    serde_json::from_value(row).map_err(|e| PersistenceError::Malformed {
        table: table.to_string(),
        message: e.to_string(),
    })
}
