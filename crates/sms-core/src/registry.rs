use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::{SendOptions, SendResult, SmsClient, SmsError};

/// Read-only mapping from tenant application id to the client serving it.
///
/// Built once at startup; cloning is cheap and shares the same clients.
#[derive(Default, Clone)]
pub struct ClientRegistry {
    map: Arc<HashMap<String, Arc<dyn SmsClient>>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self {
            map: Arc::new(HashMap::new()),
        }
    }

    /// Bind `app_id` to `client`, replacing any previous binding.
    pub fn with(mut self, app_id: impl Into<String>, client: Arc<dyn SmsClient>) -> Self {
        let mut m = (*self.map).clone();
        m.insert(app_id.into(), client);
        self.map = Arc::new(m);
        self
    }

    pub fn get(&self, app_id: &str) -> Option<Arc<dyn SmsClient>> {
        self.map.get(app_id).cloned()
    }

    pub fn contains(&self, app_id: &str) -> bool {
        self.map.contains_key(app_id)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Configured application ids, in no particular order.
    pub fn app_ids(&self) -> impl Iterator<Item = &str> {
        self.map.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for ClientRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut apps: Vec<_> = self
            .map
            .iter()
            .map(|(app_id, client)| (app_id.as_str(), client.provider()))
            .collect();
        apps.sort();
        f.debug_struct("ClientRegistry").field("apps", &apps).finish()
    }
}

/// Dispatches send requests to the client registered for an application.
#[derive(Debug, Clone)]
pub struct SmsService {
    registry: ClientRegistry,
}

impl SmsService {
    pub fn new(registry: ClientRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ClientRegistry {
        &self.registry
    }

    /// Send `options` through the client configured for `app_id`.
    ///
    /// The client's result or error is returned unchanged.
    pub async fn send(&self, app_id: &str, options: &SendOptions) -> Result<SendResult, SmsError> {
        let client = self.registry.get(app_id).ok_or_else(|| {
            warn!("No SMS client configured for app_id {:?}", app_id);
            SmsError::UnknownApplication(app_id.to_string())
        })?;

        debug!("Dispatching app_id {:?} to provider {}", app_id, client.provider());
        client.send(options).await
    }
}
