use anyhow::Result;
use async_trait::async_trait;

use super::traits::Notifier;
use crate::action::Action;

/// Notifier used when no chat webhook is configured; writes the summary to the log.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, action: &Action) -> Result<()> {
        tracing::info!(
            kind = %action.kind(),
            service = action.service().name(),
            actor = action.actor_id(),
            message = %action.chat_message(),
            "action completed"
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::handle;

    #[tokio::test]
    async fn log_notifier_always_succeeds() {
        let (_, service) = handle("twitter");
        let action = Action::make(service, "U1", "hello world", Vec::new());
        assert!(LogNotifier.notify(&action).await.is_ok());
        assert_eq!(LogNotifier.name(), "log");
    }
}
