//! Notification Channel
//!
//! Best-effort WebSocket feed into a [`NotificationCenter`]. A background task
//! keeps one connection open and reconnects with capped exponential backoff
//! whenever it closes. Disconnects are never reported as errors; the only
//! observable signal is [`NotificationChannel::is_connected`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use futures::StreamExt;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use crate::notifications::backoff::ReconnectBackoff;
use crate::notifications::center::NotificationCenter;

/// How long one connect (TCP plus WebSocket handshake) may take before it
/// counts as a failed attempt.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Default)]
struct ChannelStatus {
    connected: AtomicBool,
    attempts: AtomicU32,
}

pub struct NotificationChannel {
    status: Arc<ChannelStatus>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl NotificationChannel {
    /// Start the live feed. Returns `None` when no URL is configured, leaving
    /// the center in cache-only mode.
    pub fn spawn(url: Option<&str>, center: Arc<NotificationCenter>) -> Option<Self> {
        Self::spawn_with_timeout(url, center, CONNECT_TIMEOUT)
    }

    /// [`spawn`](Self::spawn) with an explicit connect timeout.
    pub fn spawn_with_timeout(
        url: Option<&str>,
        center: Arc<NotificationCenter>,
        connect_timeout: Duration,
    ) -> Option<Self> {
        let Some(url) = url.filter(|url| !url.is_empty()) else {
            info!("No notification socket configured, running cache-only");
            return None;
        };

        let status = Arc::new(ChannelStatus::default());
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(run(url.to_string(), connect_timeout, center, status.clone(), shutdown_rx));

        Some(Self {
            status,
            shutdown: Some(shutdown_tx),
            task: Some(task),
        })
    }

    pub fn is_connected(&self) -> bool {
        self.status.connected.load(Ordering::SeqCst)
    }

    /// Reconnects scheduled since the last successful open
    pub fn reconnect_attempts(&self) -> u32 {
        self.status.attempts.load(Ordering::SeqCst)
    }

    /// Close the socket, cancel any pending reconnect and wait for the task.
    pub async fn shutdown(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for NotificationChannel {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn run(
    url: String,
    connect_timeout: Duration,
    center: Arc<NotificationCenter>,
    status: Arc<ChannelStatus>,
    mut shutdown: oneshot::Receiver<()>,
) {
    let mut backoff = ReconnectBackoff::new();

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            result = connect_and_listen(&url, connect_timeout, &center, &status, &mut backoff) => {
                if let Err(e) = result {
                    warn!(error = %e, "Notification socket error");
                }
            }
        }

        status.connected.store(false, Ordering::SeqCst);
        let delay = backoff.next_delay();
        status.attempts.store(backoff.attempt(), Ordering::SeqCst);
        info!(
            delay_ms = delay.as_millis() as u64,
            attempt = backoff.attempt(),
            "Notification socket closed, reconnecting"
        );

        tokio::select! {
            _ = &mut shutdown => break,
            _ = tokio::time::sleep(delay) => {}
        }
    }

    status.connected.store(false, Ordering::SeqCst);
    debug!("Notification channel stopped");
}

/// One connection lifetime. Returns when the socket closes.
async fn connect_and_listen(
    url: &str,
    connect_timeout: Duration,
    center: &NotificationCenter,
    status: &ChannelStatus,
    backoff: &mut ReconnectBackoff,
) -> Result<()> {
    let (mut socket, _) = tokio::time::timeout(connect_timeout, connect_async(url))
        .await
        .with_context(|| format!("Connect timed out after {}ms", connect_timeout.as_millis()))?
        .context("Failed to connect")?;

    backoff.reset();
    status.attempts.store(0, Ordering::SeqCst);
    status.connected.store(true, Ordering::SeqCst);
    info!(%url, "Notification socket connected");

    while let Some(message) = socket.next().await {
        match message.context("Notification socket read failed")? {
            Message::Text(text) => {
                center.handle_message(&text);
            }
            Message::Close(frame) => {
                debug!(?frame, "Server closed notification socket");
                break;
            }
            _ => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use futures::SinkExt;
    use serde_json::json;
    use tokio::net::TcpListener;
    use tokio_tungstenite::accept_async;

    use crate::notifications::desktop::Unsupported;
    use crate::storage::MemoryStore;

    fn center() -> Arc<NotificationCenter> {
        Arc::new(NotificationCenter::load(Arc::new(MemoryStore::new()), Arc::new(Unsupported)))
    }

    fn notification_frame(title: &str) -> Message {
        Message::Text(
            json!({"type": "notification", "notification": {"type": "info", "title": title, "message": "m"}})
                .to_string(),
        )
    }

    async fn wait_until(mut condition: impl FnMut() -> bool) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !condition() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("condition not reached in time");
    }

    #[tokio::test]
    async fn test_no_url_means_cache_only() {
        assert!(NotificationChannel::spawn(None, center()).is_none());
        assert!(NotificationChannel::spawn(Some(""), center()).is_none());
    }

    #[tokio::test]
    async fn test_receives_and_reconnects_after_close() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}", listener.local_addr().unwrap());

        // First connection: push one notification, then close. Second: push
        // another and stay open.
        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut socket = accept_async(stream).await.unwrap();
            socket.send(notification_frame("first")).await.unwrap();
            socket.send(Message::Text(r#"{"type": "presence"}"#.to_string())).await.unwrap();
            socket.close(None).await.unwrap();

            let (stream, _) = listener.accept().await.unwrap();
            let mut socket = accept_async(stream).await.unwrap();
            socket.send(notification_frame("second")).await.unwrap();
            socket
        });

        let center = center();
        let channel = NotificationChannel::spawn(Some(&url), center.clone()).unwrap();

        wait_until(|| center.len() == 2).await;
        wait_until(|| channel.is_connected()).await;

        let titles: Vec<String> = center.notifications().into_iter().map(|n| n.title).collect();
        assert_eq!(titles, vec!["second", "first"]);
        assert_eq!(channel.reconnect_attempts(), 0);

        let _socket = server.await.unwrap();
        channel.shutdown().await;
    }

    #[tokio::test]
    async fn test_stalled_handshake_times_out_and_retries() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}", listener.local_addr().unwrap());

        // Accept TCP and hold the streams without ever answering the upgrade
        let server = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                held.push(stream);
            }
        });

        let channel =
            NotificationChannel::spawn_with_timeout(Some(&url), center(), Duration::from_millis(200)).unwrap();

        wait_until(|| channel.reconnect_attempts() >= 1).await;
        assert!(!channel.is_connected());

        tokio::time::timeout(Duration::from_secs(1), channel.shutdown())
            .await
            .expect("shutdown should cancel the pending reconnect");
        server.abort();
    }

    #[tokio::test]
    async fn test_failed_connects_back_off_until_shutdown() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}", listener.local_addr().unwrap());
        drop(listener);

        let channel = NotificationChannel::spawn(Some(&url), center()).unwrap();

        wait_until(|| channel.reconnect_attempts() >= 1).await;
        assert!(!channel.is_connected());

        tokio::time::timeout(Duration::from_secs(1), channel.shutdown())
            .await
            .expect("shutdown should cancel the pending reconnect");
    }
}
