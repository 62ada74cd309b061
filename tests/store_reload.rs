//! Store behaviour against real files: loading, form edits, saving,
//! reloading and the file watcher.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;

use config_admin::config::{Source, Store, StoreError, StoreOptions};
use config_admin::form::ListError;
use config_admin::Path;
use tempfile::TempDir;

mod common;
use common::{events_within, form, record_events, service, settings, write_config, Settings};

fn load(dir: &TempDir, file: &str, options: StoreOptions) -> Store<Settings> {
    let path = write_config(dir, file, &settings());
    Store::<Settings>::load(path, options).unwrap()
}

#[test]
fn test_load_every_format() {
    let dir = TempDir::new().unwrap();
    for file in ["app.json", "app.toml", "app.yaml", "app.yml"] {
        let store = load(&dir, file, StoreOptions::new());
        assert_eq!(store.snapshot(), settings(), "{}", file);
    }
}

#[test]
fn test_load_failures_are_fatal() {
    let dir = TempDir::new().unwrap();

    let missing = Store::<Settings>::load(dir.path().join("absent.toml"), StoreOptions::new());
    assert!(matches!(missing, Err(StoreError::Read { .. })));

    let broken = dir.path().join("broken.json");
    std::fs::write(&broken, "{ \"name\": ").unwrap();
    let parsed = Store::<Settings>::load(&broken, StoreOptions::new());
    assert!(matches!(parsed, Err(StoreError::Parse { .. })));

    let unknown = write_config(&dir, "app.json", &settings());
    let renamed = dir.path().join("app.ini");
    std::fs::rename(&unknown, &renamed).unwrap();
    let format = Store::<Settings>::load(&renamed, StoreOptions::new());
    assert!(matches!(format, Err(StoreError::Format(_))));
}

#[test]
fn test_apply_preserves_absent_fields() {
    let dir = TempDir::new().unwrap();
    let store = load(&dir, "app.toml", StoreOptions::new());
    let events = record_events(&store);

    let event = store.apply(&form(&[("Listener.Port", "9000")])).unwrap();

    let mut expected = settings();
    expected.listener.port = 9000;
    assert_eq!(store.snapshot(), expected);

    assert_eq!(event.source, Source::FormSubmit);
    assert_eq!(event.path.to_string(), "Listener.Port");
    assert_eq!(events.try_recv().unwrap(), event);
}

#[test]
fn test_apply_is_all_or_nothing() {
    let dir = TempDir::new().unwrap();
    let store = load(&dir, "app.toml", StoreOptions::new());
    let events = record_events(&store);

    let err = store
        .apply(&form(&[("Name", "renamed"), ("Services.0.Weight", "heavy")]))
        .unwrap_err();

    match err {
        StoreError::Rejected(rejection) => {
            assert_eq!(rejection.fields.len(), 1);
            assert_eq!(rejection.fields[0].path, "Services.0.Weight");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(store.snapshot(), settings());
    assert!(events.try_recv().is_err());
}

#[test]
fn test_unindexed_list_key_is_rejected() {
    let dir = TempDir::new().unwrap();
    let store = load(&dir, "app.toml", StoreOptions::new());

    for key in ["Services.Name", "Services.01.Name", "Listener.Port.0"] {
        let err = store.apply(&form(&[(key, "x")])).unwrap_err();
        let StoreError::Rejected(rejection) = err else {
            panic!("expected a rejection for {}", key);
        };
        assert_eq!(rejection.fields.len(), 1, "{}", key);
        assert_eq!(rejection.fields[0].path, key);
    }
    assert_eq!(store.snapshot(), settings());
}

#[test]
fn test_validation_blocks_apply() {
    let dir = TempDir::new().unwrap();
    let store = load(&dir, "app.toml", StoreOptions::new());

    let err = store
        .apply(&form(&[("Listener.Port", "0"), ("Listener.Host", "")]))
        .unwrap_err();
    let StoreError::Rejected(rejection) = err else {
        panic!("expected a rejection");
    };
    let paths: Vec<_> = rejection.fields.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(paths, vec!["Listener.Host", "Listener.Port"]);
    assert_eq!(store.snapshot(), settings());
}

#[test]
fn test_preview_never_mutates() {
    let dir = TempDir::new().unwrap();
    let store = load(&dir, "app.toml", StoreOptions::new().auto_apply(false));
    assert!(!store.auto_apply());

    let preview = store
        .preview(&form(&[("Services.2.Name", "c"), ("Version", "9.9.9")]))
        .unwrap();
    assert_eq!(preview.list_len("Services"), 3);
    assert_eq!(preview.get("Services.2.Name").unwrap(), "c");
    assert_eq!(preview.get("Version").unwrap(), "1.0.0");

    assert_eq!(store.snapshot(), settings());
}

#[test]
fn test_list_edits_emit_events() {
    let dir = TempDir::new().unwrap();
    let store = load(&dir, "app.toml", StoreOptions::new());
    let events = record_events(&store);

    let roles = Path::parse("Services.1.Roles").unwrap();
    assert_eq!(store.add_item(&roles).unwrap(), 2);
    assert_eq!(store.remove_item(&Path::new("Services"), 0).unwrap(), 1);

    let value = store.snapshot();
    assert_eq!(value.services.len(), 1);
    assert_eq!(value.services[0].name, "b");
    assert_eq!(value.services[0].roles, vec!["read".to_string(), String::new()]);

    let received: Vec<_> = events.try_iter().map(|e| e.path.to_string()).collect();
    assert_eq!(received, vec!["Services.1.Roles", "Services"]);

    assert!(matches!(
        store.remove_item(&Path::new("Services"), 5),
        Err(StoreError::List(ListError::OutOfRange { index: 5, len: 1, .. }))
    ));
}

#[test]
fn test_save_then_reload() {
    let dir = TempDir::new().unwrap();
    let store = load(&dir, "app.yaml", StoreOptions::new());

    store.apply(&form(&[("Name", "saved")])).unwrap();
    store.save().unwrap();

    let fresh = Store::<Settings>::load(store.file(), StoreOptions::new()).unwrap();
    assert_eq!(fresh.read(|s| s.name.clone()), "saved");

    let mut external = settings();
    external.services.push(service("c"));
    write_config(&dir, "app.yaml", &external);

    let events = record_events(&store);
    let event = store.reload().unwrap();
    assert_eq!(event.source, Source::Manual);
    assert!(event.path.is_root());
    assert_eq!(store.snapshot(), external);
    assert_eq!(events.try_recv().unwrap(), event);
}

#[test]
fn test_custom_persist_and_auto_save() {
    let dir = TempDir::new().unwrap();
    let writes = Arc::new(AtomicUsize::new(0));
    let counter = writes.clone();
    let options = StoreOptions::new().auto_save(true).persist(move |path, bytes| {
        counter.fetch_add(1, Ordering::SeqCst);
        std::fs::write(path, bytes)
    });
    let store = load(&dir, "app.json", options);

    store.apply(&form(&[("Listener.TLS", "")])).unwrap();
    store.add_item(&Path::new("Services")).unwrap();
    assert_eq!(writes.load(Ordering::SeqCst), 2);

    let on_disk = std::fs::read_to_string(store.file()).unwrap();
    let parsed: Settings = serde_json::from_str(&on_disk).unwrap();
    assert!(!parsed.listener.tls);
    assert_eq!(parsed.services.len(), 3);
}

#[test]
fn test_failed_save_keeps_value() {
    let dir = TempDir::new().unwrap();
    let options = StoreOptions::new().persist(|_, _| {
        Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only disk"))
    });
    let store = load(&dir, "app.toml", options);
    store.apply(&form(&[("Name", "kept")])).unwrap();

    assert!(matches!(store.save(), Err(StoreError::Write { .. })));
    assert_eq!(store.read(|s| s.name.clone()), "kept");
}

#[test]
fn test_failed_reload_keeps_value() {
    let dir = TempDir::new().unwrap();
    let store = load(&dir, "app.toml", StoreOptions::new());
    std::fs::write(store.file(), "name = [").unwrap();

    assert!(matches!(store.reload(), Err(StoreError::Parse { .. })));
    assert_eq!(store.snapshot(), settings());
}

#[test]
fn test_own_save_does_not_trigger_reload() {
    let dir = TempDir::new().unwrap();
    let options = StoreOptions::new()
        .watch(true)
        .debounce(Duration::from_millis(500));
    let store = load(&dir, "app.toml", options);
    assert!(store.is_watching());

    store.update(|s| s.listener.port = 9000);
    let events = record_events(&store);
    store.save().unwrap();

    let echoed = events_within(&events, Duration::from_millis(700));
    assert!(
        echoed.iter().all(|e| e.source != Source::FileChange),
        "own save was reloaded: {:?}",
        echoed
    );

    let mut external = settings();
    external.listener.port = 7000;
    write_config(&dir, "app.toml", &external);

    let seen = events_within(&events, Duration::from_secs(3));
    let reloads: Vec<_> = seen.iter().filter(|e| e.source == Source::FileChange).collect();
    assert_eq!(reloads.len(), 1, "{:?}", seen);
    assert_eq!(store.read(|s| s.listener.port), 7000);

    store.stop();
}

#[test]
fn test_stop_halts_reloads() {
    let dir = TempDir::new().unwrap();
    let options = StoreOptions::new()
        .watch(true)
        .debounce(Duration::from_millis(100));
    let store = load(&dir, "app.toml", options);
    let events = record_events(&store);

    store.stop();
    store.stop();
    assert!(!store.is_watching());

    let mut external = settings();
    external.name = "changed".into();
    write_config(&dir, "app.toml", &external);

    assert!(events_within(&events, Duration::from_millis(600)).is_empty());
    assert_eq!(store.snapshot(), settings());
}

#[test]
fn test_watcher_errors_reach_callback() {
    let dir = TempDir::new().unwrap();
    let (tx, rx) = mpsc::channel();
    let options = StoreOptions::new()
        .watch(true)
        .debounce(Duration::from_millis(100))
        .on_error(move |e| {
            let _ = tx.send(e.to_string());
        });
    let store = load(&dir, "app.toml", options);

    std::fs::write(store.file(), "listener = 3").unwrap();

    let reported = rx.recv_timeout(Duration::from_secs(3)).unwrap();
    assert!(reported.contains("failed to parse"), "{}", reported);
    assert_eq!(store.snapshot(), settings());
    store.stop();
}

/// Whether `(name, port, host)` is the fixture or one complete writer step.
fn whole_state(name: &str, port: u64, host: &str) -> bool {
    if (name, port, host) == ("edge", 8080, "localhost") {
        return true;
    }
    match name.strip_prefix('v').and_then(|n| n.parse::<u64>().ok()) {
        Some(step) => port == 1000 + step && host == format!("h{}", step),
        None => false,
    }
}

#[test]
fn test_readers_never_see_partial_writes() {
    let dir = TempDir::new().unwrap();
    let store = load(&dir, "app.toml", StoreOptions::new());
    let services = Path::new("Services");
    let done = AtomicBool::new(false);

    std::thread::scope(|scope| {
        let readers: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(|| {
                    let mut reads = 0;
                    loop {
                        let finished = done.load(Ordering::SeqCst);

                        let (name, port, host, len) = store.read(|s| {
                            (s.name.clone(), s.listener.port, s.listener.host.clone(), s.services.len())
                        });
                        assert!(whole_state(&name, port.into(), &host), "{} {} {}", name, port, host);
                        assert!(len == 2 || len == 3, "{} services", len);

                        let values = store.extract();
                        let name = values.get("Name").unwrap().as_str().unwrap().to_string();
                        let port = values.get("Listener.Port").unwrap().as_u64().unwrap();
                        let host = values.get("Listener.Host").unwrap().as_str().unwrap().to_string();
                        assert!(whole_state(&name, port, &host), "{} {} {}", name, port, host);

                        reads += 1;
                        if finished {
                            return reads;
                        }
                    }
                })
            })
            .collect();

        for step in 1..=200u32 {
            let name = format!("v{}", step);
            let port = (1000 + step).to_string();
            let host = format!("h{}", step);
            store
                .apply(&form(&[
                    ("Name", name.as_str()),
                    ("Listener.Port", port.as_str()),
                    ("Listener.Host", host.as_str()),
                ]))
                .unwrap();
            assert_eq!(store.add_item(&services).unwrap(), 3);
            assert_eq!(store.remove_item(&services, 2).unwrap(), 2);
            if step % 20 == 0 {
                store.reload().unwrap();
            }
        }
        done.store(true, Ordering::SeqCst);

        for reader in readers {
            assert!(reader.join().unwrap() > 0);
        }
    });

    assert_eq!(store.snapshot(), settings());
}
