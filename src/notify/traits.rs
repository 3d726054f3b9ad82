use crate::action::Action;
use async_trait::async_trait;

/// Reports a successfully executed action back to the chat channel.
///
/// Delivery is best effort: the dispatcher logs and discards any error, so
/// implementations should fail fast rather than retry.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, action: &Action) -> anyhow::Result<()>;
    fn name(&self) -> &str;
}
