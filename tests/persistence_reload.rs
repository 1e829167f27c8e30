//! Reload tests for the file-backed backend.
//!
//! These tests verify that:
//! - Progress written through a store survives a restart
//! - Corrupt or truncated record files fall back to a fresh state
//! - The write-behind decorator delivers the latest state on shutdown

#![cfg(feature = "persistent")]

use std::fs;
use std::io::Write;
use std::sync::Arc;

use operator_xp::{
    open_file_storage, LoadSource, ModuleId, PersistentConfig, ProgressStorage, ProgressionConfig,
    ProgressionStore, WriteBehindConfig, WriteBehindStorage, DEFAULT_RECORD_NAME,
};
use tempfile::tempdir;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn open_store(dir: &std::path::Path) -> ProgressionStore {
    let storage = open_file_storage(dir, DEFAULT_RECORD_NAME, None).unwrap();
    ProgressionStore::open(ProgressionConfig::default(), Arc::new(storage)).unwrap()
}

#[test]
fn progress_survives_restart() {
    let dir = tempdir().unwrap();

    {
        let mut store = open_store(dir.path());
        assert_eq!(store.load_source(), &LoadSource::Fresh);
        store.open_module(ModuleId::Origin);
        for star in ["husband", "dad", "builder", "entrepreneur"] {
            store.origin_hover_star(star);
        }
        store.discover_easter_egg("konami");
    }

    let store = open_store(dir.path());
    assert!(matches!(
        store.load_source(),
        LoadSource::Restored { from_version: 2, saved_at: Some(_) }
    ));
    let s = store.snapshot();
    assert_eq!(s.xp(), 100);
    assert!(s.is_completed(ModuleId::Origin));
    assert_eq!(s.progress().origin.stars_hovered.len(), 4);
    assert!(s.easter_eggs_found().contains("konami"));
    assert_eq!(s.system_understanding(), 29);
}

#[test]
fn operator_mode_preference_is_restored() {
    let dir = tempdir().unwrap();

    {
        let mut store = open_store(dir.path());
        store.complete_tpm_simulator();
        for egg in ["a", "b", "c", "d", "e"] {
            store.discover_easter_egg(egg);
        }
        assert!(store.toggle_operator_mode().changed);
    }

    let store = open_store(dir.path());
    assert!(store.snapshot().operator_unlocked());
    assert!(store.snapshot().operator_mode_enabled());
}

#[test]
fn truncated_record_falls_back_to_defaults() {
    init_tracing();
    let dir = tempdir().unwrap();
    let path = {
        let storage = open_file_storage(dir.path(), DEFAULT_RECORD_NAME, None).unwrap();
        let path = storage.path().to_path_buf();
        let mut store = ProgressionStore::open(ProgressionConfig::default(), Arc::new(storage)).unwrap();
        store.open_module(ModuleId::Lab);
        path
    };

    let bytes = fs::read(&path).unwrap();
    fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();

    let mut store = open_store(dir.path());
    assert!(matches!(store.load_source(), LoadSource::Recovered { .. }));
    assert_eq!(store.snapshot().xp(), 0);

    // The next change overwrites the damaged file.
    store.open_module(ModuleId::Signal);
    let store = open_store(dir.path());
    assert_eq!(store.snapshot().xp(), 10);
    assert!(!store.snapshot().is_opened(ModuleId::Lab));
}

#[test]
fn flipped_byte_is_detected() {
    init_tracing();
    let dir = tempdir().unwrap();
    let path = {
        let storage = open_file_storage(dir.path(), DEFAULT_RECORD_NAME, None).unwrap();
        let path = storage.path().to_path_buf();
        let mut store = ProgressionStore::open(ProgressionConfig::default(), Arc::new(storage)).unwrap();
        store.discover_easter_egg("konami");
        path
    };

    let mut bytes = fs::read(&path).unwrap();
    let mid = bytes.len() / 2;
    bytes[mid] ^= 0xFF;
    fs::File::create(&path).unwrap().write_all(&bytes).unwrap();

    let store = open_store(dir.path());
    assert!(matches!(store.load_source(), LoadSource::Recovered { .. }));
}

#[test]
fn records_are_isolated_by_name() {
    let dir = tempdir().unwrap();
    let a = open_file_storage(dir.path(), "profile-a", None).unwrap();
    let b = open_file_storage(dir.path(), "profile-b", None).unwrap();

    let mut store_a = ProgressionStore::open(ProgressionConfig::default(), Arc::new(a)).unwrap();
    store_a.open_module(ModuleId::Systems);

    let store_b = ProgressionStore::open(ProgressionConfig::default(), Arc::new(b)).unwrap();
    assert_eq!(store_b.load_source(), &LoadSource::Fresh);
}

#[test]
fn configured_record_name_picks_the_file() {
    let dir = tempdir().unwrap();
    let profile_a = ProgressionConfig {
        record_name: "profile-a".to_string(),
        ..ProgressionConfig::default()
    };

    {
        let mut store = ProgressionStore::open_in_dir(dir.path(), profile_a.clone(), None).unwrap();
        store.open_module(ModuleId::Lab);
    }

    let mut files: Vec<String> = fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    files.sort();
    assert_eq!(files, ["profile-a.opxp"]);

    let reopened = ProgressionStore::open_in_dir(dir.path(), profile_a, None).unwrap();
    assert!(reopened.snapshot().is_opened(ModuleId::Lab));

    let default_store = ProgressionStore::open_in_dir(dir.path(), ProgressionConfig::default(), None).unwrap();
    assert_eq!(default_store.load_source(), &LoadSource::Fresh);
}

#[test]
fn invalid_record_name_is_rejected_before_touching_disk() {
    let dir = tempdir().unwrap();
    let config = ProgressionConfig {
        record_name: "../escape".to_string(),
        ..ProgressionConfig::default()
    };
    let err = ProgressionStore::open_in_dir(dir.path(), config, None).unwrap_err();
    assert!(err.is_config());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn write_behind_delivers_latest_state() {
    let dir = tempdir().unwrap();
    let config = PersistentConfig {
        sync_on_write: false,
        ..PersistentConfig::default()
    };

    {
        let file = open_file_storage(dir.path(), DEFAULT_RECORD_NAME, Some(config)).unwrap();
        let writer = WriteBehindStorage::new(Arc::new(file), WriteBehindConfig::default()).unwrap();
        let writer = Arc::new(writer);
        let port: Arc<dyn ProgressStorage> = writer.clone();

        let mut store = ProgressionStore::open(ProgressionConfig::default(), port).unwrap();
        for module in ModuleId::ALL {
            store.open_module(module);
        }
        store.signal_switch_tone();

        writer.flush();
        assert_eq!(writer.failed_writes(), 0);
        assert!(writer.completed_writes() >= 1);
        assert_eq!(store.persist_failures(), 0);
    }

    let store = open_store(dir.path());
    assert_eq!(store.snapshot().xp(), 110);
    assert!(store.snapshot().is_completed(ModuleId::Signal));
}
