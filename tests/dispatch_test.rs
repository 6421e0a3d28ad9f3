use anyhow::{anyhow, Result};
use heating_monitor::notification::{ChannelFactory, NotificationChannel, NotificationMessage, SendResult};
use heating_monitor::{AlertDispatcher, DispatcherConfig, FileParameterStore};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::{tempdir, TempDir};

const INACTIVE_EVENT: &str = r#"{
    "device_id": "heating-pump-pi-01",
    "timestamp": 1760000000,
    "status": "INACTIVE",
    "sensor_voltage": 0,
    "metadata": {"reason": "event_change", "location": "Boiler Room"}
}"#;

/// Factory whose channels record what they were built with and what they sent
#[derive(Default)]
struct RecordingFactory {
    built: Mutex<Vec<String>>,
    sent: Arc<Mutex<Vec<(String, String)>>>,
    failing: Vec<&'static str>,
}

impl RecordingFactory {
    fn failing(names: Vec<&'static str>) -> Self {
        Self {
            failing: names,
            ..Self::default()
        }
    }

    fn channel(&self, name: &str, detail: String) -> Box<dyn NotificationChannel> {
        self.built.lock().unwrap().push(detail);
        Box::new(RecordingChannel {
            name: name.to_string(),
            fail: self.failing.iter().any(|f| *f == name),
            sent: Arc::clone(&self.sent),
        })
    }
}

impl ChannelFactory for RecordingFactory {
    fn telegram(&self, token: String, chat_id: String) -> Result<Box<dyn NotificationChannel>> {
        Ok(self.channel("telegram", format!("telegram {} {}", token, chat_id)))
    }

    fn discord(&self, webhook_url: String) -> Result<Box<dyn NotificationChannel>> {
        Ok(self.channel("discord", format!("discord {}", webhook_url)))
    }
}

struct RecordingChannel {
    name: String,
    fail: bool,
    sent: Arc<Mutex<Vec<(String, String)>>>,
}

impl NotificationChannel for RecordingChannel {
    fn name(&self) -> &str {
        &self.name
    }

    fn send(&self, message: &NotificationMessage) -> Result<SendResult> {
        self.sent.lock().unwrap().push((self.name.clone(), message.content.clone()));
        if self.fail {
            Err(anyhow!("connection reset"))
        } else {
            Ok(SendResult::Sent)
        }
    }
}

fn parameter_file(dir: &TempDir, body: &str) -> PathBuf {
    let path = dir.path().join("parameters.json");
    fs::write(&path, body).unwrap();
    path
}

fn dispatcher(store: &Path, factory: Arc<RecordingFactory>, escalate: bool) -> AlertDispatcher {
    let config = DispatcherConfig {
        escalate_on_total_failure: escalate,
        ..DispatcherConfig::default()
    };
    AlertDispatcher::new(config, Arc::new(FileParameterStore::new(store)), factory)
}

const ALL_SECRETS: &str = r#"{
    "/heating-monitor/telegram-token": {"value": "123:abc", "secure": true},
    "/heating-monitor/telegram-chat-id": "4242",
    "/heating-monitor/discord-webhook": {"value": "https://discord.com/api/webhooks/1/x", "secure": true}
}"#;

#[test]
fn test_both_channels_deliver() {
    let dir = tempdir().unwrap();
    let store = parameter_file(&dir, ALL_SECRETS);
    let factory = Arc::new(RecordingFactory::default());

    let outcome = dispatcher(&store, Arc::clone(&factory), false).dispatch_json(INACTIVE_EVENT).unwrap();

    assert_eq!(outcome.status_code, 200);
    assert_eq!(outcome.body, "Message sent to 2/2 channels.");
    assert_eq!(
        *factory.built.lock().unwrap(),
        vec!["telegram 123:abc 4242".to_string(), "discord https://discord.com/api/webhooks/1/x".to_string()]
    );

    let sent = factory.sent.lock().unwrap();
    assert_eq!(sent.len(), 2);
    assert!(sent.iter().all(|(_, content)| content.contains("The boiler is inactive!")));
}

#[test]
fn test_no_secrets_means_no_channels_without_error() {
    let dir = tempdir().unwrap();
    let store = parameter_file(&dir, "{}");
    let factory = Arc::new(RecordingFactory::default());

    let outcome = dispatcher(&store, Arc::clone(&factory), true).dispatch_json(INACTIVE_EVENT).unwrap();

    assert_eq!(outcome.status_code, 500);
    assert_eq!(outcome.channels_attempted, 0);
    assert!(factory.sent.lock().unwrap().is_empty());
}

#[test]
fn test_missing_chat_id_leaves_discord_alone() {
    let dir = tempdir().unwrap();
    let store = parameter_file(
        &dir,
        r#"{
            "/heating-monitor/telegram-token": {"value": "123:abc", "secure": true},
            "/heating-monitor/discord-webhook": "https://discord.com/api/webhooks/1/x"
        }"#,
    );
    let factory = Arc::new(RecordingFactory::default());

    let outcome = dispatcher(&store, Arc::clone(&factory), false).dispatch_json(INACTIVE_EVENT).unwrap();

    assert_eq!(outcome.status_code, 200);
    assert_eq!(outcome.channels_attempted, 1);
    assert_eq!(outcome.channels[0].channel, "discord");
}

#[test]
fn test_plain_http_webhook_is_excluded() {
    let dir = tempdir().unwrap();
    let store = parameter_file(
        &dir,
        r#"{
            "/heating-monitor/telegram-token": {"value": "123:abc", "secure": true},
            "/heating-monitor/telegram-chat-id": "4242",
            "/heating-monitor/discord-webhook": "http://discord.com/api/webhooks/1/x"
        }"#,
    );
    let factory = Arc::new(RecordingFactory::default());

    let outcome = dispatcher(&store, Arc::clone(&factory), false).dispatch_json(INACTIVE_EVENT).unwrap();

    assert_eq!(outcome.body, "Message sent to 1/1 channels.");
    assert_eq!(factory.built.lock().unwrap().len(), 1);
}

#[test]
fn test_one_failing_channel_does_not_stop_the_other() {
    let dir = tempdir().unwrap();
    let store = parameter_file(&dir, ALL_SECRETS);
    let factory = Arc::new(RecordingFactory::failing(vec!["telegram"]));

    let outcome = dispatcher(&store, Arc::clone(&factory), true).dispatch_json(INACTIVE_EVENT).unwrap();

    assert_eq!(outcome.status_code, 200);
    assert_eq!(outcome.channels_succeeded, 1);
    assert_eq!(outcome.channels_attempted, 2);
    assert_eq!(factory.sent.lock().unwrap().len(), 2);
}

#[test]
fn test_total_failure_reports_or_escalates() {
    let dir = tempdir().unwrap();
    let store = parameter_file(&dir, ALL_SECRETS);

    let factory = Arc::new(RecordingFactory::failing(vec!["telegram", "discord"]));
    let outcome = dispatcher(&store, factory, false).dispatch_json(INACTIVE_EVENT).unwrap();
    assert_eq!(outcome.status_code, 502);
    assert_eq!(outcome.body, "Message sent to 0/2 channels.");

    let factory = Arc::new(RecordingFactory::failing(vec!["telegram", "discord"]));
    assert!(dispatcher(&store, factory, true).dispatch_json(INACTIVE_EVENT).is_err());
}

#[test]
fn test_outcome_serializes_for_logs() {
    let dir = tempdir().unwrap();
    let store = parameter_file(&dir, ALL_SECRETS);
    let factory = Arc::new(RecordingFactory::failing(vec!["discord"]));

    let outcome = dispatcher(&store, factory, false).dispatch_json(INACTIVE_EVENT).unwrap();
    let json = serde_json::to_value(&outcome).unwrap();

    assert_eq!(json["statusCode"], 200);
    assert_eq!(json["channelsSucceeded"], 1);
    assert_eq!(json["channels"][0]["channel"], "telegram");
    assert_eq!(json["channels"][0]["result"], "sent");
    assert_eq!(json["channels"][1]["result"], "failed");
    assert_eq!(json["channels"][1]["detail"], "connection reset");
}
