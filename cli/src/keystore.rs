//! Named account keys, one hex file per account under `<data-dir>/keys/`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use strongbox_protocol::crypto::Keypair;

/// Directory of `<name>.key` files.
#[derive(Debug, Clone)]
pub struct Keystore {
    dir: PathBuf,
}

impl Keystore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            dir: data_dir.join("keys"),
        }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.key"))
    }

    /// Whether a key named `name` exists.
    pub fn contains(&self, name: &str) -> bool {
        self.path(name).exists()
    }

    /// Writes `keypair` as `name`. Refuses to overwrite.
    pub fn save(&self, name: &str, keypair: &Keypair) -> Result<PathBuf> {
        if name.is_empty() || name.contains(['/', '\\', '.']) {
            bail!("invalid key name '{name}'");
        }
        let path = self.path(name);
        if path.exists() {
            bail!("key '{name}' already exists at {}", path.display());
        }
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create key directory {}", self.dir.display()))?;
        fs::write(&path, keypair.to_hex())
            .with_context(|| format!("failed to write key to {}", path.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o600))?;
        }
        Ok(path)
    }

    /// Reads the key named `name`.
    pub fn load(&self, name: &str) -> Result<Keypair> {
        let path = self.path(name);
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("no key named '{name}' (looked in {})", path.display()))?;
        Keypair::from_hex(raw.trim()).with_context(|| format!("corrupt key file {}", path.display()))
    }
}
