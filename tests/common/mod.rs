//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Duration;

use config_admin::config::{ChangeEvent, Config, Format, Store};
use config_admin::form::Submission;
use config_admin::record;
use serde::{Deserialize, Serialize};
use tempfile::TempDir;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Listener {
    pub host: String,
    pub port: u16,
    pub tls: bool,
}

record!(Listener {
    host as "Host" { required },
    port as "Port" { min = 1, max = 65535 },
    tls as "TLS",
});

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub name: String,
    pub weight: u32,
    #[serde(default)]
    pub roles: Vec<String>,
}

record!(Service {
    name as "Name",
    weight as "Weight",
    roles as "Roles",
});

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub name: String,
    pub version: String,
    pub listener: Listener,
    #[serde(default)]
    pub services: Vec<Service>,
}

record!(Settings {
    name as "Name",
    version as "Version" { readonly },
    listener as "Listener",
    services as "Services",
});

pub fn service(name: &str) -> Service {
    Service {
        name: name.into(),
        weight: 1,
        roles: vec!["read".into()],
    }
}

pub fn settings() -> Settings {
    Settings {
        name: "edge".into(),
        version: "1.0.0".into(),
        listener: Listener {
            host: "localhost".into(),
            port: 8080,
            tls: true,
        },
        services: vec![service("a"), service("b")],
    }
}

/// Write `value` to `file` inside `dir`, encoded by the file's extension.
pub fn write_config<T: Serialize>(dir: &TempDir, file: &str, value: &T) -> PathBuf {
    let path = dir.path().join(file);
    let bytes = Format::from_path(&path).unwrap().encode(value).unwrap();
    std::fs::write(&path, bytes).unwrap();
    path
}

pub fn form(pairs: &[(&str, &str)]) -> Submission {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Collect every change event the store emits.
pub fn record_events<T: Config>(store: &Store<T>) -> mpsc::Receiver<ChangeEvent> {
    let (tx, rx) = mpsc::channel();
    store.subscribe(move |event| {
        let _ = tx.send(event.clone());
    });
    rx
}

/// Drain events for `window`, returning everything received.
pub fn events_within(rx: &mpsc::Receiver<ChangeEvent>, window: Duration) -> Vec<ChangeEvent> {
    let deadline = std::time::Instant::now() + window;
    let mut events = Vec::new();
    while let Some(left) = deadline.checked_duration_since(std::time::Instant::now()) {
        match rx.recv_timeout(left) {
            Ok(event) => events.push(event),
            Err(_) => break,
        }
    }
    events
}
