//! In-memory [`TautulliApi`] used by tests across the workspace.

use crate::error::SourceError;
use crate::traits::TautulliApi;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

type Responder = dyn Fn(&str, &HashMap<String, String>) -> Result<Value, SourceError> + Send + Sync;

/// Answers every call through a closure and records what was asked
pub struct ScriptedApi {
    responder: Box<Responder>,
    calls: Mutex<Vec<(String, HashMap<String, String>)>>,
}

impl ScriptedApi {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&str, &HashMap<String, String>) -> Result<Value, SourceError> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// An application level failure as Tautulli would report it
    pub fn api_error(command: &str) -> SourceError {
        SourceError::Api {
            command: command.to_string(),
            result: "error".to_string(),
            message: "scripted failure".to_string(),
        }
    }

    pub fn calls(&self) -> Vec<(String, HashMap<String, String>)> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    pub fn calls_for(&self, command: &str) -> usize {
        self.calls().iter().filter(|(c, _)| c == command).count()
    }
}

#[async_trait]
impl TautulliApi for ScriptedApi {
    async fn call(&self, command: &str, params: &[(&str, Option<String>)]) -> Result<Value, SourceError> {
        let params: HashMap<String, String> = params
            .iter()
            .filter_map(|(name, value)| value.clone().map(|v| (name.to_string(), v)))
            .collect();
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((command.to_string(), params.clone()));
        }
        (self.responder)(command, &params)
    }
}
