use futures::future::{BoxFuture, FutureExt};

/// Somewhere to deliver text, addressed by channel name
pub trait Channel: Send + Sync {
    fn deliver<'a>(&'a self, channel: &'a str, text: &'a str) -> BoxFuture<'a, anyhow::Result<()>>;
}

/// Writes deliveries to the log. Used when no chat transport is attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogChannel;

impl Channel for LogChannel {
    fn deliver<'a>(&'a self, channel: &'a str, text: &'a str) -> BoxFuture<'a, anyhow::Result<()>> {
        async move {
            tracing::info!(channel, "{}", text);
            Ok(())
        }
        .boxed()
    }
}
