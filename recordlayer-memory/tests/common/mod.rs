//! Shared fixtures for the memory store integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use recordlayer_core::{
    contract::{Loader, Saver},
    error::{PersistenceError, PersistenceResult},
    record::Identifiable,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dummy {
    pub id: Option<String>,
    pub key: String,
    pub content: String,
}

impl Dummy {
    pub fn new(key: &str, content: &str) -> Self {
        Self { id: None, key: key.to_string(), content: content.to_string() }
    }

    pub fn with_id(id: &str, key: &str, content: &str) -> Self {
        Self { id: Some(id.to_string()), key: key.to_string(), content: content.to_string() }
    }
}

impl Identifiable for Dummy {
    type Id = String;

    fn id(&self) -> Option<&String> {
        self.id.as_ref()
    }

    fn set_id(&mut self, id: String) {
        self.id = Some(id);
    }
}

/// Loader and saver double that counts calls and remembers the last saved collection.
#[derive(Clone, Default)]
pub struct RecordingPersister {
    initial: Arc<Mutex<Vec<Dummy>>>,
    saved: Arc<Mutex<Vec<Dummy>>>,
    loads: Arc<AtomicUsize>,
    saves: Arc<AtomicUsize>,
    fail_load: Arc<AtomicBool>,
    fail_save: Arc<AtomicBool>,
}

impl RecordingPersister {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(items: Vec<Dummy>) -> Self {
        let persister = Self::default();
        *persister.initial.lock().unwrap() = items;
        persister
    }

    pub fn set_items(&self, items: Vec<Dummy>) {
        *self.initial.lock().unwrap() = items;
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn saved(&self) -> Vec<Dummy> {
        self.saved.lock().unwrap().clone()
    }

    pub fn fail_loads(&self, fail: bool) {
        self.fail_load.store(fail, Ordering::SeqCst);
    }

    pub fn fail_saves(&self, fail: bool) {
        self.fail_save.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl Loader<Dummy> for RecordingPersister {
    async fn load(&self, _trace_id: Option<&str>) -> PersistenceResult<Vec<Dummy>> {
        self.loads.fetch_add(1, Ordering::SeqCst);

        if self.fail_load.load(Ordering::SeqCst) {
            return Err(PersistenceError::Io("medium unavailable".to_string()));
        }

        Ok(self.initial.lock().unwrap().clone())
    }
}

#[async_trait]
impl Saver<Dummy> for RecordingPersister {
    async fn save(&self, _trace_id: Option<&str>, items: &[Dummy]) -> PersistenceResult<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);

        if self.fail_save.load(Ordering::SeqCst) {
            return Err(PersistenceError::Io("disk full".to_string()));
        }

        *self.saved.lock().unwrap() = items.to_vec();
        Ok(())
    }
}

pub fn dummies(count: usize) -> Vec<Dummy> {
    (1..=count)
        .map(|i| Dummy::with_id(&format!("{i}"), &format!("Key {i}"), &format!("Content {i}")))
        .collect()
}

pub fn fields(value: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
    value.as_object().cloned().unwrap()
}
