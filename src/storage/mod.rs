use color_eyre::Result;
use fjall::{Config, Keyspace, PartitionCreateOptions};
use std::{
    fs,
    path::{Path, PathBuf},
};

mod repositories;

pub use repositories::SettingsRepository;

pub struct Storage {
    root: PathBuf,
    #[allow(dead_code)]
    keyspace: Keyspace,
    settings: SettingsRepository,
}

impl Storage {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let root = path.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;

        let keyspace = Config::new(root.join("db")).open()?;
        let settings = keyspace.open_partition("settings", PartitionCreateOptions::default())?;

        Ok(Self {
            root,
            settings: SettingsRepository::new(settings),
            keyspace,
        })
    }

    pub fn settings(&self) -> &SettingsRepository {
        &self.settings
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

pub fn default_data_dir() -> Result<PathBuf> {
    let explicit = std::env::var("EVM_ACCOUNT_TUI_DATA_DIR").map(PathBuf::from);
    let path = match explicit {
        Ok(path) => path,
        Err(_) => {
            let mut root = dirs::data_local_dir()
                .unwrap_or(std::env::current_dir()?)
                .join("evm-account-tui");
            if cfg!(debug_assertions) {
                root = root.join("dev");
            }
            root
        }
    };
    Ok(path)
}
