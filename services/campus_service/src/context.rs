use std::env;
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;

use service_core::ddb::Adapter;
use service_core::simple_err_map;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::chat::ChatHub;
use crate::events::{DomainEvent, EventBus};
use crate::store::{DdbStore, DocumentStore, MemoryStore};

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";

pub enum ContextKey {
    ListenAddr,
    StoreBackend,
    DynamoDbEndpoint,
    TablePrefix,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    DynamoDb,
}

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("{key} has an invalid value '{value}'.")]
    InvalidValue { key: String, value: String },
}

/// Settings read from the environment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    pub listen_addr: SocketAddr,
    pub store_backend: StoreBackend,
    pub dynamodb_endpoint: Option<String>,
    pub table_prefix: String,
}

/// Everything the operations share: the store, the event bus and the live chat channels.
#[derive(Clone)]
pub struct Context {
    pub store: Arc<dyn DocumentStore>,
    pub events: EventBus,
    pub chat_hub: ChatHub,
}

impl fmt::Display for ContextKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::ListenAddr => write!(f, "LISTEN_ADDR"),
            Self::StoreBackend => write!(f, "STORE_BACKEND"),
            Self::DynamoDbEndpoint => write!(f, "DYNAMODB_ENDPOINT"),
            Self::TablePrefix => write!(f, "TABLE_PREFIX"),
        }
    }
}

impl FromStr for StoreBackend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "dynamodb" => Ok(Self::DynamoDb),
            _ => Err(()),
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, ContextError> {
        Self::from_lookup(|key| env::var(key.to_string()).ok())
    }

    /// Builds the settings from an arbitrary key lookup. Missing keys fall back to their defaults.
    pub fn from_lookup(lookup: impl Fn(&ContextKey) -> Option<String>) -> Result<Self, ContextError> {
        let listen_addr = parse(
            &ContextKey::ListenAddr,
            lookup(&ContextKey::ListenAddr).unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_owned()),
        )?;
        let store_backend = match lookup(&ContextKey::StoreBackend) {
            Some(raw) => parse(&ContextKey::StoreBackend, raw)?,
            None => StoreBackend::DynamoDb,
        };

        Ok(Self {
            listen_addr,
            store_backend,
            dynamodb_endpoint: lookup(&ContextKey::DynamoDbEndpoint).filter(|endpoint| !endpoint.is_empty()),
            table_prefix: lookup(&ContextKey::TablePrefix).unwrap_or_default(),
        })
    }
}

fn parse<T: FromStr>(key: &ContextKey, raw: String) -> Result<T, ContextError> {
    raw.trim().parse().map_err(|_| ContextError::InvalidValue {
        key: key.to_string(),
        value: raw,
    })
}

impl Context {
    /// Connects the configured store. Returns the receiving end of the event bus, which belongs
    /// to the [`crate::notifications::Notifier`].
    pub async fn from_settings(
        settings: &Settings,
    ) -> Result<(Self, UnboundedReceiver<DomainEvent>), ContextError> {
        let store: Arc<dyn DocumentStore> = match settings.store_backend {
            StoreBackend::Memory => {
                tracing::warn!("Using the in-memory store, data is lost on shutdown.");
                Arc::new(MemoryStore::new())
            }
            StoreBackend::DynamoDb => {
                let adapter = dynamodb_adapter(settings.dynamodb_endpoint.as_deref()).await?;
                Arc::new(DdbStore::new(adapter, settings.table_prefix.clone()))
            }
        };
        Ok(Self::with_store(store))
    }

    pub fn with_store(
        store: Arc<dyn DocumentStore>,
    ) -> (Self, UnboundedReceiver<DomainEvent>) {
        let (events, receiver) = EventBus::new();
        let ctx = Context {
            store,
            events,
            chat_hub: ChatHub::new(),
        };
        (ctx, receiver)
    }
}

async fn dynamodb_adapter(endpoint: Option<&str>) -> Result<Adapter, ContextError> {
    let shared_config = aws_config::load_from_env().await;

    let dynamodb_config = if let Some(endpoint) = endpoint {
        let uri = http::Uri::from_str(endpoint).map_err(simple_err_map!(
            "Failed to parse the DynamoDB endpoint.",
            ContextError::InvalidValue {
                key: ContextKey::DynamoDbEndpoint.to_string(),
                value: endpoint.to_owned(),
            }
        ))?;
        tracing::info!(endpoint, "Using DynamoDB with custom endpoint.");
        aws_sdk_dynamodb::config::Builder::from(&shared_config)
            .endpoint_resolver(aws_sdk_dynamodb::Endpoint::immutable(uri))
            .build()
    } else {
        tracing::info!(region = ?shared_config.region(), "Using DynamoDB.");
        aws_sdk_dynamodb::config::Config::new(&shared_config)
    };

    Ok(aws_sdk_dynamodb::Client::from_conf(dynamodb_config).into())
}
