//! Shared fakes for unit tests.

use crate::action::Action;
use crate::notify::Notifier;
use crate::services::{ServiceError, ServiceHandle, SocialService};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Make {
        actor_id: String,
        content: String,
        attachments: Vec<String>,
    },
    Reply {
        actor_id: String,
        target_url: String,
        content: String,
        attachments: Vec<String>,
    },
    Delete {
        actor_id: String,
        target_url: String,
    },
    Share {
        actor_id: String,
        target_url: String,
    },
    Unshare {
        actor_id: String,
        target_url: String,
    },
}

/// Records every call; optionally fails each one with a fixed message or
/// never answers.
#[derive(Default)]
pub struct RecordingService {
    calls: Mutex<Vec<Call>>,
    failure: Option<String>,
    stall: bool,
}

impl RecordingService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(message: &str) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failure: Some(message.to_string()),
            stall: false,
        }
    }

    pub fn stalling() -> Self {
        Self {
            stall: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    async fn record(&self, call: Call) -> Result<(), ServiceError> {
        self.calls.lock().push(call);
        if self.stall {
            std::future::pending::<()>().await;
        }
        match &self.failure {
            Some(message) => Err(ServiceError::Rejected(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl SocialService for RecordingService {
    fn name(&self) -> &str {
        "recording"
    }

    async fn make(
        &self,
        actor_id: &str,
        content: &str,
        attachments: &[String],
    ) -> Result<(), ServiceError> {
        self.record(Call::Make {
            actor_id: actor_id.into(),
            content: content.into(),
            attachments: attachments.to_vec(),
        })
        .await
    }

    async fn reply(
        &self,
        actor_id: &str,
        target_url: &str,
        content: &str,
        attachments: &[String],
    ) -> Result<(), ServiceError> {
        self.record(Call::Reply {
            actor_id: actor_id.into(),
            target_url: target_url.into(),
            content: content.into(),
            attachments: attachments.to_vec(),
        })
        .await
    }

    async fn delete(&self, actor_id: &str, target_url: &str) -> Result<(), ServiceError> {
        self.record(Call::Delete {
            actor_id: actor_id.into(),
            target_url: target_url.into(),
        })
        .await
    }

    async fn share(&self, actor_id: &str, target_url: &str) -> Result<(), ServiceError> {
        self.record(Call::Share {
            actor_id: actor_id.into(),
            target_url: target_url.into(),
        })
        .await
    }

    async fn unshare(&self, actor_id: &str, target_url: &str) -> Result<(), ServiceError> {
        self.record(Call::Unshare {
            actor_id: actor_id.into(),
            target_url: target_url.into(),
        })
        .await
    }
}

/// A recording service registered under `name`.
pub fn handle(name: &str) -> (Arc<RecordingService>, ServiceHandle) {
    let recorder = Arc::new(RecordingService::new());
    let handle = ServiceHandle::new(name, recorder.clone());
    (recorder, handle)
}

/// Captures every notified action; optionally fails or stalls.
#[derive(Default)]
pub struct RecordingNotifier {
    actions: Mutex<Vec<Action>>,
    fail: bool,
    stall: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn stalling() -> Self {
        Self {
            stall: true,
            ..Self::default()
        }
    }

    pub fn actions(&self) -> Vec<Action> {
        self.actions.lock().clone()
    }

    /// Notifications run on their own task; poll until `count` have arrived
    /// or a second has passed.
    pub async fn wait_for_actions(&self, count: usize) -> Vec<Action> {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(1);
        loop {
            let actions = self.actions();
            if actions.len() >= count || tokio::time::Instant::now() >= deadline {
                return actions;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, action: &Action) -> anyhow::Result<()> {
        self.actions.lock().push(action.clone());
        if self.stall {
            std::future::pending::<()>().await;
        }
        if self.fail {
            anyhow::bail!("chat webhook unavailable");
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}
