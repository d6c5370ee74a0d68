use crate::app::config::Settings;
use color_eyre::{Result, eyre::WrapErr};
use fjall::PartitionHandle;

#[derive(Clone)]
pub struct SettingsRepository {
    handle: PartitionHandle,
}

impl SettingsRepository {
    const SETTINGS_KEY: &'static str = "v1::settings";

    pub(crate) fn new(handle: PartitionHandle) -> Self {
        Self { handle }
    }

    pub fn load(&self) -> Result<Option<Settings>> {
        self.handle
            .get(Self::SETTINGS_KEY.as_bytes())
            .wrap_err("failed to read settings")?
            .map(|bytes| {
                serde_json::from_slice(bytes.as_ref()).wrap_err("failed to deserialize settings")
            })
            .transpose()
    }

    pub fn save(&self, settings: &Settings) -> Result<()> {
        let stored = serde_json::to_vec(settings).wrap_err("failed to serialize settings")?;
        self.handle
            .insert(Self::SETTINGS_KEY.as_bytes(), stored)
            .wrap_err("failed to write settings")
    }

    pub fn clear(&self) -> Result<()> {
        self.handle
            .remove(Self::SETTINGS_KEY.as_bytes())
            .wrap_err("failed to remove settings")
    }
}
