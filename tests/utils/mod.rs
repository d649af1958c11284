#![allow(dead_code)]

use log::kv::Key;
use log::{set_max_level, Level, Log, Metadata, Record};
use rand::distr::{Alphanumeric, SampleString};
use server_features::{InMemorySettings, SettingsStore};
use std::cell::RefCell;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

pub const SETTINGS_KEY: &str = "ServerFeatures";

pub fn rand_guild_id() -> String {
    rand_str(18)
}

pub fn rand_str(len: usize) -> String {
    Alphanumeric.sample_string(&mut rand::rng(), len)
}

/// Settings backed by memory that can be told to reject writes.
#[derive(Default)]
pub struct FlakySettings {
    inner: InMemorySettings,
    failing: AtomicBool,
    writes: AtomicUsize,
}

impl FlakySettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(value: &str) -> Self {
        Self {
            inner: InMemorySettings::new().with_value(SETTINGS_KEY, value),
            ..Self::default()
        }
    }

    pub fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn stored(&self) -> Option<String> {
        self.inner.read(SETTINGS_KEY)
    }
}

impl SettingsStore for FlakySettings {
    fn read(&self, key: &str) -> Option<String> {
        self.inner.read(key)
    }

    fn write(&self, key: &str, value: &str) -> Result<(), String> {
        if self.failing.load(Ordering::SeqCst) {
            return Err("settings are read-only".to_owned());
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.write(key, value)
    }
}

thread_local!(pub static LOGS: RefCell<String> = RefCell::new(String::default()));

pub struct RecordingLogger {}

impl Log for RecordingLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level() && metadata.target().contains("server_features")
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let level = match record.level() {
            Level::Error => "ERROR",
            Level::Warn => "WARNING",
            Level::Info => "INFO",
            Level::Debug => "DEBUG",
            Level::Trace => "TRACE",
        };
        let event_id = record
            .key_values()
            .get(Key::from("event_id"))
            .and_then(|id| id.to_i64())
            .unwrap_or_default();
        let line = format!("{level} [{event_id}] {}\n", record.args());
        LOGS.with_borrow_mut(|l| l.push_str(line.as_str()));
    }

    fn flush(&self) {}
}

pub fn log_record_init() {
    set_max_level(log::LevelFilter::Info);
    _ = log::set_logger(&RecordingLogger {});
}

pub fn take_logs() -> String {
    LOGS.take()
}
