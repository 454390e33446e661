//! [`KeyPairManager`]: load-or-generate for the persisted key pair.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::config::KeyStoreConfig;
use crate::crypto::encoding::{base58_decode, base58_encode};
use crate::crypto::keys::{KeyAlgorithm, KeyError, KeyPair, PrivateKey, PublicKey};

/// Loads the persisted key pair, or generates and persists one when absent.
///
/// Construct one per key directory and share it. The configuration is fixed
/// at construction.
#[derive(Debug)]
pub struct KeyPairManager {
    config: KeyStoreConfig,
    /// Serializes `ensure_key_pair` so the existence check and the write of a
    /// fresh pair happen as one step.
    lock: Mutex<()>,
}

impl KeyPairManager {
    /// Creates a manager for `config`. Touches nothing on disk.
    pub fn new(config: KeyStoreConfig) -> Self {
        Self {
            config,
            lock: Mutex::new(()),
        }
    }

    /// The configuration this manager was built with.
    pub fn config(&self) -> &KeyStoreConfig {
        &self.config
    }

    /// Whether both key files are present. The only existence predicate: a
    /// lone file counts as absent.
    pub fn exists(&self) -> bool {
        self.config.public_key_path().is_file() && self.config.private_key_path().is_file()
    }

    /// Returns the persisted key pair, generating and persisting a new one
    /// first if either file is missing.
    ///
    /// Idempotent: once a pair is on disk every call returns that same pair.
    pub fn ensure_key_pair(&self) -> Result<KeyPair, KeyError> {
        let _guard = self.lock.lock();

        if self.exists() {
            return self.load();
        }
        self.generate_and_persist()
    }

    /// The private half, ensuring a pair exists first.
    pub fn private_key(&self) -> Result<PrivateKey, KeyError> {
        Ok(self.ensure_key_pair()?.private_key().clone())
    }

    /// The public half, ensuring a pair exists first.
    pub fn public_key(&self) -> Result<PublicKey, KeyError> {
        Ok(self.ensure_key_pair()?.public_key().clone())
    }

    // -----------------------------------------------------------------------
    // Load
    // -----------------------------------------------------------------------

    fn load(&self) -> Result<KeyPair, KeyError> {
        let algorithm = KeyAlgorithm::parse(&self.config.algorithm)?;

        let public_path = self.config.public_key_path();
        let private_path = self.config.private_key_path();

        let public_der = read_key_file(&public_path)?;
        let private_der = read_key_file(&private_path)?;

        let public = PublicKey::from_der(&public_der).map_err(|e| corrupt(&public_path, e))?;
        let private = PrivateKey::from_der(&private_der).map_err(|e| corrupt(&private_path, e))?;
        let pair = KeyPair::from_parts(public, private, algorithm)?;

        if pair.key_size_bits() != self.config.key_size_bits {
            warn!(
                persisted = pair.key_size_bits(),
                configured = self.config.key_size_bits,
                "persisted key size differs from configuration, using persisted key"
            );
        }
        info!(
            dir = %self.config.dir().display(),
            fingerprint = %pair.public_key().fingerprint(),
            "reusing existing key pair"
        );
        Ok(pair)
    }

    // -----------------------------------------------------------------------
    // Generate
    // -----------------------------------------------------------------------

    fn generate_and_persist(&self) -> Result<KeyPair, KeyError> {
        let algorithm = self.config.validate()?;
        let dir = self.config.dir();

        info!(
            dir = %dir.display(),
            algorithm = %algorithm,
            bits = self.config.key_size_bits,
            "no key pair found, generating"
        );
        let pair = KeyPair::generate(algorithm, self.config.key_size_bits)?;

        fs::create_dir_all(dir).map_err(|e| io_error(dir, e))?;
        clear_directory(dir)?;

        // Private first: a crash between the two writes leaves only
        // private.pem, which reads as "absent" and regenerates next time.
        let private_text = base58_encode(&pair.private_key().to_der()?);
        write_key_file(&self.config.private_key_path(), &private_text, true)?;
        let public_text = pair.public_key_base58()?;
        write_key_file(&self.config.public_key_path(), &public_text, false)?;

        info!(
            dir = %dir.display(),
            fingerprint = %pair.public_key().fingerprint(),
            "generated and persisted new key pair"
        );
        Ok(pair)
    }
}

// ---------------------------------------------------------------------------
// File Helpers
// ---------------------------------------------------------------------------

fn read_key_file(path: &Path) -> Result<Vec<u8>, KeyError> {
    let text = fs::read_to_string(path).map_err(|e| io_error(path, e))?;
    let text = text.trim();
    if text.is_empty() {
        return Err(KeyError::Corrupt {
            path: path.to_path_buf(),
            reason: "file is empty".to_string(),
        });
    }
    base58_decode(text).map_err(|e| corrupt(path, e))
}

/// Writes `contents` next to `path` and renames it into place, so readers
/// never see a half-written key file.
fn write_key_file(path: &Path, contents: &str, secret: bool) -> Result<(), KeyError> {
    let tmp = temp_path(path);

    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        if secret {
            options.mode(0o600);
        }
    }
    #[cfg(not(unix))]
    let _ = secret;

    let mut file = options.open(&tmp).map_err(|e| io_error(&tmp, e))?;
    file.write_all(contents.as_bytes())
        .and_then(|_| file.sync_all())
        .map_err(|e| io_error(&tmp, e))?;
    drop(file);

    fs::rename(&tmp, path).map_err(|e| io_error(path, e))?;
    debug!(path = %path.display(), "wrote key file");
    Ok(())
}

/// Empties `dir` ahead of a fresh pair: files and symlinks are removed, and
/// so are empty subdirectories. A subdirectory with contents is kept.
fn clear_directory(dir: &Path) -> Result<(), KeyError> {
    let entries = fs::read_dir(dir).map_err(|e| io_error(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| io_error(dir, e))?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| io_error(&path, e))?;
        if file_type.is_dir() {
            if fs::remove_dir(&path).is_ok() {
                warn!(path = %path.display(), "removed empty directory from key directory");
            } else {
                debug!(path = %path.display(), "keeping non-empty directory");
            }
            continue;
        }
        warn!(path = %path.display(), "removing stale entry from key directory");
        fs::remove_file(&path).map_err(|e| io_error(&path, e))?;
    }
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.tmp"))
}

fn io_error(path: &Path, source: std::io::Error) -> KeyError {
    KeyError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn corrupt(path: &Path, reason: impl std::fmt::Display) -> KeyError {
    KeyError::Corrupt {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}
