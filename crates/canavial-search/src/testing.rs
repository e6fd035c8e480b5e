//! Test doubles shared by the unit tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::lookup::CityLookup;
use crate::types::{City, LookupError};

pub fn city(name: &str) -> City {
    let seed: u32 = name.bytes().map(u32::from).sum();
    City {
        name: name.to_string(),
        admin1: "São Paulo".to_string(),
        country: "Brasil".to_string(),
        latitude: -20.0 - f64::from(seed % 997) / 100.0,
        longitude: -45.0 - f64::from(name.len() as u32) / 10.0,
        timezone: "America/Sao_Paulo".to_string(),
        label: format!("{} - São Paulo - Brasil", name),
    }
}

#[derive(Debug, Clone)]
pub enum Reply {
    Cities(Vec<City>),
    Fail(u16),
    TooShort,
}

/// Lookup whose answers and latencies are scripted per query.
///
/// Unscripted queries answer with an empty list after 10ms.
#[derive(Debug, Default)]
pub struct ScriptedLookup {
    script: Mutex<HashMap<String, (Duration, Reply)>>,
    calls: Mutex<Vec<(String, CancellationToken)>>,
}

impl ScriptedLookup {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, query: &str, after: Duration, reply: Reply) {
        self.script
            .lock()
            .insert(query.to_string(), (after, reply));
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().iter().map(|(q, _)| q.clone()).collect()
    }

    /// Queries whose cancellation token has fired.
    pub fn cancelled(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter(|(_, token)| token.is_cancelled())
            .map(|(q, _)| q.clone())
            .collect()
    }
}

impl CityLookup for ScriptedLookup {
    async fn lookup_cities(
        &self,
        query: &str,
        cancel: CancellationToken,
    ) -> Result<Vec<City>, LookupError> {
        self.calls.lock().push((query.to_string(), cancel.clone()));
        let (after, reply) = self
            .script
            .lock()
            .get(query)
            .cloned()
            .unwrap_or((Duration::from_millis(10), Reply::Cities(Vec::new())));

        tokio::select! {
            _ = cancel.cancelled() => Err(LookupError::Cancelled),
            _ = tokio::time::sleep(after) => match reply {
                Reply::Cities(cities) => Ok(cities),
                Reply::Fail(status) => Err(LookupError::Status(status)),
                Reply::TooShort => Err(LookupError::QueryTooShort(query.trim().to_string())),
            },
        }
    }
}
