//! Health monitoring for the local inference server
//!
//! A background task probes `GET /api/tags` on a fixed interval and
//! publishes an immutable `HealthSnapshot` through a watch channel.
//! Readers clone the current `Arc` and never wait on a live probe.
//! Scheduled ticks and `check_now` requests are both served by the
//! same task, so writers are serialized and share one probe routine.

use std::sync::Arc;
use std::time::Duration;
use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::config::GatewayConfig;
use crate::error::Error;

pub const TAGS_PATH: &str = "/api/tags";

/// Tag the server appends to untagged model names
pub const DEFAULT_TAG_SUFFIX: &str = ":latest";

/// Availability of the local inference server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus
{   Available
  , Unavailable
  , /// Never produced by a probe; only the snapshot published before
    /// the first probe completes carries it
    Loading
}

/// One published view of the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthSnapshot
{   pub status: HealthStatus
  , pub last_checked: DateTime<Utc>
  , /// Sorted, default tag stripped
    pub models: Vec<String>
  , pub error: Option<String>
}

impl HealthSnapshot
{   pub fn loading() -> Self
    {   HealthSnapshot
        {   status: HealthStatus::Loading
          , last_checked: Utc::now()
          , models: vec![]
          , error: None
        }
    }

    pub fn available(mut models: Vec<String>) -> Self
    {   models.sort();
        HealthSnapshot
        {   status: HealthStatus::Available
          , last_checked: Utc::now()
          , models
          , error: None
        }
    }

    pub fn unavailable(error: impl Into<String>) -> Self
    {   HealthSnapshot
        {   status: HealthStatus::Unavailable
          , last_checked: Utc::now()
          , models: vec![]
          , error: Some(error.into())
        }
    }

    pub fn is_available(&self) -> bool
    {   self.status == HealthStatus::Available
    }
}

/// Drop a trailing default tag; other names come back unchanged
pub fn strip_default_tag(name: &str) -> &str
{   name.strip_suffix(DEFAULT_TAG_SUFFIX).unwrap_or(name)
}

#[derive(Debug, Deserialize)]
struct TagsResponse
{   #[serde(default)]
    models: Vec<TagEntry>
}

#[derive(Debug, Deserialize)]
struct TagEntry
{   name: String
}

/// Parse a tag-listing body into sorted, normalized model names
pub fn parse_tags(body: &str) -> Result<Vec<String>, Error>
{   let tags: TagsResponse = serde_json::from_str(body)
      .map_err(|e| Error::MalformedResponse(e.to_string()))?;
    let mut models: Vec<String> = tags.models
      .into_iter()
      .map(|entry| strip_default_tag(&entry.name).to_string())
      .collect();
    models.sort();
    Ok(models)
}

// ===== Probe =====

/// Single-cycle probe shared by the poll loop and on-demand checks
#[derive(Debug, Clone)]
pub struct HealthProbe
{   http_client: reqwest::Client
  , tags_url: String
  , timeout: Duration
}

impl HealthProbe
{   pub fn new(
      http_client: reqwest::Client
    , base_url: &str
    , timeout: Duration
    ) -> Self
    {   HealthProbe
        {   http_client
          , tags_url: format!("{}{}", base_url.trim_end_matches('/'), TAGS_PATH)
          , timeout
        }
    }

    pub fn from_config(config: &GatewayConfig) -> Self
    {   HealthProbe::new(
          reqwest::Client::new(),
          &config.ollama.base_url,
          config.health.probe_timeout()
        )
    }

    /// Probe once. Every failure is folded into an `Unavailable` snapshot.
    pub async fn check(&self) -> HealthSnapshot
    {   match self.fetch_models().await
        {   Ok(models) => {
              debug!("Local server available with {} models", models.len());
              HealthSnapshot::available(models)
            }
          , Err(err) => {
              warn!("Local server unavailable: {}", err);
              HealthSnapshot::unavailable(err.to_string())
            }
        }
    }

    async fn fetch_models(&self) -> Result<Vec<String>, Error>
    {   let response = self.http_client
          .get(&self.tags_url)
          .timeout(self.timeout)
          .send()
          .await
          .map_err(Error::from_transport)?;

        let status = response.status();
        let body = response.text().await.map_err(Error::from_transport)?;
        if !status.is_success()
        {   return Err(Error::backend(status.as_u16(), &body));
        }
        parse_tags(&body)
    }
}

// ===== Monitor Actor =====

const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

enum MonitorCommand
{   CheckNow
    {   reply: oneshot::Sender<Arc<HealthSnapshot>>
    }
}

/// Owns the poll task and the published snapshot.
/// Dropping the monitor cancels the task.
pub struct HealthMonitor
{   probe: HealthProbe
  , cmd_tx: mpsc::UnboundedSender<MonitorCommand>
  , snapshot_rx: watch::Receiver<Arc<HealthSnapshot>>
  , shutdown: CancellationToken
  , task: Option<tokio::task::JoinHandle<()>>
}

impl HealthMonitor
{   /// Spawn the poll loop. The first probe runs immediately.
    /// Must be called from within a tokio runtime.
    pub fn start(probe: HealthProbe, interval: Duration) -> Self
    {   // tokio's interval rejects a zero period
        let interval = interval.max(MIN_POLL_INTERVAL);
        debug!("Starting health monitor, interval {:?}", interval);
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx)
          = watch::channel(Arc::new(HealthSnapshot::loading()));
        let shutdown = CancellationToken::new();

        let task = tokio::spawn(run_monitor_loop(
          probe.clone(),
          interval,
          cmd_rx,
          snapshot_tx,
          shutdown.clone()
        ));

        HealthMonitor
        {   probe
          , cmd_tx
          , snapshot_rx
          , shutdown
          , task: Some(task)
        }
    }

    pub fn from_config(config: &GatewayConfig) -> Self
    {   HealthMonitor::start(
          HealthProbe::from_config(config),
          config.health.poll_interval()
        )
    }

    /// Latest published snapshot, without waiting
    pub fn snapshot(&self) -> Arc<HealthSnapshot>
    {   self.snapshot_rx.borrow().clone()
    }

    /// Receiver that wakes on every publish
    pub fn subscribe(&self) -> watch::Receiver<Arc<HealthSnapshot>>
    {   self.snapshot_rx.clone()
    }

    /// Probe now and publish the result.
    /// If the poll task has stopped, probes inline without publishing.
    pub async fn check_now(&self) -> Arc<HealthSnapshot>
    {   let (reply, reply_rx) = oneshot::channel();
        if self.cmd_tx.send(MonitorCommand::CheckNow { reply }).is_ok()
        {   if let Ok(snapshot) = reply_rx.await
            {   return snapshot;
            }
        }
        debug!("Health monitor stopped, probing inline");
        Arc::new(self.probe.check().await)
    }

    /// Stop the poll task and wait for it to finish
    pub async fn shutdown(mut self)
    {   info!("Shutting down health monitor");
        self.shutdown.cancel();
        if let Some(task) = self.task.take()
        {   if let Err(e) = task.await
            {   error!("Health monitor task failed: {}", e);
            }
        }
    }
}

impl Drop for HealthMonitor
{   fn drop(&mut self)
    {   self.shutdown.cancel();
    }
}

/// Poll loop. Probe failures are published, never propagated, so the
/// loop only ends on cancellation or when the monitor is dropped.
async fn run_monitor_loop(
  probe: HealthProbe
, interval: Duration
, mut cmd_rx: mpsc::UnboundedReceiver<MonitorCommand>
, snapshot_tx: watch::Sender<Arc<HealthSnapshot>>
, shutdown: CancellationToken
)
{   let mut tick = tokio::time::interval(interval);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop
    { tokio::select!
      { biased;
        _ = shutdown.cancelled() => {
          debug!("Health monitor cancelled");
          break;
        }
      , cmd = cmd_rx.recv() => {
          match cmd
          {   Some(MonitorCommand::CheckNow { reply }) => {
                debug!("Processing CheckNow");
                let snapshot = Arc::new(probe.check().await);
                snapshot_tx.send_replace(snapshot.clone());
                let _ = reply.send(snapshot);
              }
            , None => {
                debug!("Command channel closed");
                break;
              }
          }
        }
      , _ = tick.tick() => {
          let snapshot = tokio::select!
          { s = probe.check() => s
          , _ = shutdown.cancelled() => break
          };
          snapshot_tx.send_replace(Arc::new(snapshot));
        }
      }
    }
    info!("Health monitor stopped");
}

#[cfg(test)]
mod tests
{   use super::*;

    #[test]
    fn strip_then_reappend_round_trips()
    {   for name in ["llama3:latest", "qwen2.5:latest", ":latest"]
        {   let stripped = strip_default_tag(name);
            assert_eq!(format!("{}{}", stripped, DEFAULT_TAG_SUFFIX), name);
        }
    }

    #[test]
    fn names_without_default_tag_are_untouched()
    {   for name in ["llama3", "llama3:8b", "mistral:latest-q4", "latest"]
        {   assert_eq!(strip_default_tag(name), name);
        }
    }

    #[test]
    fn only_one_suffix_is_stripped()
    {   assert_eq!(strip_default_tag("odd:latest:latest"), "odd:latest");
    }

    #[test]
    fn tags_are_stripped_and_sorted()
    {   let models = parse_tags(r#"{"models": [
          {"name": "b:latest"}, {"name": "a"}, {"name": "c:latest"}
        ]}"#).unwrap();
        assert_eq!(models, vec!["a", "b", "c"]);
    }

    #[test]
    fn duplicates_are_kept()
    {   let models = parse_tags(r#"{"models": [
          {"name": "a:latest"}, {"name": "a"}
        ]}"#).unwrap();
        assert_eq!(models, vec!["a", "a"]);
    }

    #[test]
    fn missing_models_key_is_empty_inventory()
    {   assert_eq!(parse_tags("{}").unwrap(), Vec::<String>::new());
    }

    #[test]
    fn garbage_body_is_malformed()
    {   let err = parse_tags("<html>").unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::MalformedResponse);
    }

    #[test]
    fn snapshot_serializes_outward_shape()
    {   let snapshot = HealthSnapshot::available(vec!["b".into(), "a".into()]);
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["status"], "available");
        assert_eq!(json["models"], serde_json::json!(["a", "b"]));
        assert!(json["lastChecked"].is_string());
        assert!(json["error"].is_null());
    }

    #[test]
    fn unavailable_clears_models()
    {   let snapshot = HealthSnapshot::unavailable("connection refused");
        assert!(!snapshot.is_available());
        assert!(snapshot.models.is_empty());
        assert_eq!(snapshot.error.as_deref(), Some("connection refused"));
    }

    #[tokio::test]
    async fn unreachable_server_yields_unavailable()
    {   // Port 9 (discard) is closed on test machines.
        let probe = HealthProbe::new(
          reqwest::Client::new(),
          "http://127.0.0.1:9",
          Duration::from_secs(2)
        );
        let snapshot = probe.check().await;
        assert_eq!(snapshot.status, HealthStatus::Unavailable);
        assert!(snapshot.models.is_empty());
        assert!(snapshot.error.is_some());
    }

    #[tokio::test]
    async fn monitor_starts_loading_and_stops_cleanly()
    {   let probe = HealthProbe::new(
          reqwest::Client::new(),
          "http://127.0.0.1:9",
          Duration::from_millis(500)
        );
        let monitor = HealthMonitor::start(probe, Duration::from_secs(3600));
        // Current-thread runtime: the poll task has not run yet.
        let first = monitor.snapshot();
        assert_eq!(first.status, HealthStatus::Loading);
        assert!(first.models.is_empty());

        let fresh = monitor.check_now().await;
        assert_eq!(fresh.status, HealthStatus::Unavailable);
        assert_eq!(monitor.snapshot().status, HealthStatus::Unavailable);

        monitor.shutdown().await;
    }

    #[tokio::test]
    async fn zero_interval_still_polls()
    {   let probe = HealthProbe::new(
          reqwest::Client::new(),
          "http://127.0.0.1:9",
          Duration::from_millis(200)
        );
        let monitor = HealthMonitor::start(probe, Duration::ZERO);
        let mut updates = monitor.subscribe();
        tokio::time::timeout(Duration::from_secs(2), updates.changed())
          .await
          .unwrap()
          .unwrap();
        assert_eq!(monitor.snapshot().status, HealthStatus::Unavailable);

        let fresh = monitor.check_now().await;
        assert_eq!(fresh.status, HealthStatus::Unavailable);
        monitor.shutdown().await;
    }
}
