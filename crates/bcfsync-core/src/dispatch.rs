// Routing of commands to the agent responsible for a device.

use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;

use crate::agent::ControllerAgent;
use crate::command::{BcfAnswer, BcfCommand};
use crate::error::CoreError;
use crate::inventory::DeviceRecord;

/// Delivers a command to the agent that owns `device`.
pub trait AgentDispatcher: Send + Sync {
    fn send(
        &self,
        device: &DeviceRecord,
        command: BcfCommand,
    ) -> impl Future<Output = Result<BcfAnswer, CoreError>> + Send;
}

/// In-process dispatcher keyed by device id.
#[derive(Default)]
pub struct LocalDispatcher {
    agents: DashMap<String, Arc<ControllerAgent>>,
}

impl LocalDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, device_id: impl Into<String>, agent: ControllerAgent) -> Arc<ControllerAgent> {
        let agent = Arc::new(agent);
        self.agents.insert(device_id.into(), Arc::clone(&agent));
        agent
    }

    pub fn agent(&self, device_id: &str) -> Option<Arc<ControllerAgent>> {
        self.agents.get(device_id).map(|a| Arc::clone(a.value()))
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

impl AgentDispatcher for LocalDispatcher {
    async fn send(&self, device: &DeviceRecord, command: BcfCommand) -> Result<BcfAnswer, CoreError> {
        // Clone out of the map so no shard guard is held across the await.
        let agent = self
            .agent(&device.id)
            .ok_or_else(|| CoreError::AgentUnavailable {
                host: device.host.clone(),
            })?;
        agent.execute(command).await
    }
}
