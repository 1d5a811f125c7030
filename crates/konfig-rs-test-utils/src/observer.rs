use konfig_rs_core::ConfigObserver;
use parking_lot::Mutex;
use serde_json::Value;

/// One observed change: key, old value, new value.
pub type RecordedChange = (String, Option<Value>, Option<Value>);

/// Observer recording every change it sees.
#[derive(Default)]
pub struct RecordingObserver {
    changes: Mutex<Vec<RecordedChange>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn changes(&self) -> Vec<RecordedChange> {
        self.changes.lock().clone()
    }

    pub fn keys(&self) -> Vec<String> {
        self.changes.lock().iter().map(|(key, _, _)| key.clone()).collect()
    }
}

impl ConfigObserver for RecordingObserver {
    fn on_config_changed(
        &self,
        key: &str,
        old_value: Option<&Value>,
        new_value: Option<&Value>,
    ) -> anyhow::Result<()> {
        self.changes
            .lock()
            .push((key.to_string(), old_value.cloned(), new_value.cloned()));
        Ok(())
    }
}

/// Observer that fails on every notification.
#[derive(Clone, Copy, Default)]
pub struct FailingObserver;

impl ConfigObserver for FailingObserver {
    fn on_config_changed(
        &self,
        key: &str,
        _old_value: Option<&Value>,
        _new_value: Option<&Value>,
    ) -> anyhow::Result<()> {
        anyhow::bail!("observer rejected change to '{key}'")
    }
}
