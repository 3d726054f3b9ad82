use async_trait::async_trait;

use super::traits::{ServiceError, SocialService};

/// Dry-run back end. Every operation succeeds and is only recorded in the log.
pub struct LogService {
    label: String,
}

impl LogService {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
        }
    }
}

#[async_trait]
impl SocialService for LogService {
    fn name(&self) -> &str {
        "log"
    }

    async fn make(
        &self,
        actor_id: &str,
        content: &str,
        attachments: &[String],
    ) -> Result<(), ServiceError> {
        tracing::info!(
            service = %self.label,
            actor = actor_id,
            content,
            attachments = attachments.len(),
            "dry-run make"
        );
        Ok(())
    }

    async fn reply(
        &self,
        actor_id: &str,
        target_url: &str,
        content: &str,
        attachments: &[String],
    ) -> Result<(), ServiceError> {
        tracing::info!(
            service = %self.label,
            actor = actor_id,
            target_url,
            content,
            attachments = attachments.len(),
            "dry-run reply"
        );
        Ok(())
    }

    async fn delete(&self, actor_id: &str, target_url: &str) -> Result<(), ServiceError> {
        tracing::info!(service = %self.label, actor = actor_id, target_url, "dry-run delete");
        Ok(())
    }

    async fn share(&self, actor_id: &str, target_url: &str) -> Result<(), ServiceError> {
        tracing::info!(service = %self.label, actor = actor_id, target_url, "dry-run share");
        Ok(())
    }

    async fn unshare(&self, actor_id: &str, target_url: &str) -> Result<(), ServiceError> {
        tracing::info!(service = %self.label, actor = actor_id, target_url, "dry-run unshare");
        Ok(())
    }
}
