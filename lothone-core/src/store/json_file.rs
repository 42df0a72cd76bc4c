//! JSON file-backed account store
//!
//! One collection file per file-backed protocol. Every mutation runs under that
//! protocol's lock for the whole load-mutate-persist span, and persistence is a
//! temp-file write followed by an atomic rename in the same directory.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::codec;
use crate::error::{CoreError, CoreResult};
use crate::traits::{AccountStore, CollectionMutation};
use crate::types::{AccountCollection, AccountRecord, Protocol};

/// Collection store over plain JSON files.
pub struct JsonFileStore {
    paths: HashMap<Protocol, PathBuf>,
    /// One mutation lock per collection file
    locks: HashMap<Protocol, Mutex<()>>,
}

impl JsonFileStore {
    /// Create a store over explicit collection file paths
    ///
    /// # Arguments
    /// * `vmess_path` - VMess collection file
    /// * `shadowsocks_path` - Shadowsocks collection file
    #[must_use]
    pub fn new(vmess_path: impl Into<PathBuf>, shadowsocks_path: impl Into<PathBuf>) -> Self {
        let paths = HashMap::from([
            (Protocol::Vmess, vmess_path.into()),
            (Protocol::Shadowsocks, shadowsocks_path.into()),
        ]);
        let locks = paths.keys().map(|p| (*p, Mutex::new(()))).collect();
        Self { paths, locks }
    }

    /// Path of a protocol's collection file
    pub fn path(&self, protocol: Protocol) -> CoreResult<&Path> {
        self.paths
            .get(&protocol)
            .map(PathBuf::as_path)
            .ok_or_else(|| unsupported(protocol))
    }

    fn lock(&self, protocol: Protocol) -> CoreResult<&Mutex<()>> {
        self.locks.get(&protocol).ok_or_else(|| unsupported(protocol))
    }

    async fn read(path: &Path) -> CoreResult<AccountCollection> {
        let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => CoreError::CollectionMissing {
                path: path.display().to_string(),
            },
            _ => io_error(path, &e),
        })?;
        codec::decode(&bytes, path)
    }

    async fn write_atomic(path: &Path, collection: &AccountCollection) -> CoreResult<()> {
        let bytes = codec::encode(collection)?;

        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let temp_path = dir.join(format!(".{file_name}.{}.tmp", Uuid::new_v4().simple()));

        // The replacement inherits the mode of the file it replaces
        let permissions = match tokio::fs::metadata(path).await {
            Ok(meta) => Some(meta.permissions()),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => return Err(io_error(path, &e)),
        };

        let result = async {
            let mut file = tokio::fs::File::create(&temp_path).await?;
            file.write_all(&bytes).await?;
            file.sync_all().await?;
            drop(file);
            if let Some(permissions) = permissions {
                tokio::fs::set_permissions(&temp_path, permissions).await?;
            }
            tokio::fs::rename(&temp_path, path).await
        }
        .await;

        if let Err(e) = result {
            if let Err(cleanup_err) = tokio::fs::remove_file(&temp_path).await {
                log::warn!(
                    "Cleanup: failed to remove temp file {}: {cleanup_err}",
                    temp_path.display()
                );
            }
            return Err(io_error(path, &e));
        }
        Ok(())
    }
}

fn unsupported(protocol: Protocol) -> CoreError {
    CoreError::UnsupportedProtocol {
        protocol: protocol.to_string(),
        operation: "collection storage".to_string(),
    }
}

fn io_error(path: &Path, e: &std::io::Error) -> CoreError {
    CoreError::StorageIo {
        path: path.display().to_string(),
        detail: e.to_string(),
    }
}

#[async_trait]
impl AccountStore for JsonFileStore {
    async fn load(&self, protocol: Protocol) -> CoreResult<AccountCollection> {
        Self::read(self.path(protocol)?).await
    }

    async fn mutate(
        &self,
        protocol: Protocol,
        mutation: CollectionMutation,
    ) -> CoreResult<Option<AccountRecord>> {
        let path = self.path(protocol)?;
        let _guard = self.lock(protocol)?.lock().await;

        let mut collection = Self::read(path).await?;
        let before = collection.len();
        let affected = mutation(&mut collection)?;
        Self::write_atomic(path, &collection).await?;

        log::debug!(
            "[{protocol}] collection persisted: {before} -> {} records",
            collection.len()
        );
        Ok(affected)
    }

    async fn initialize(&self, protocol: Protocol) -> CoreResult<bool> {
        let path = self.path(protocol)?;
        let _guard = self.lock(protocol)?.lock().await;

        if tokio::fs::try_exists(path)
            .await
            .map_err(|e| io_error(path, &e))?
        {
            return Ok(false);
        }
        Self::write_atomic(path, &AccountCollection::default()).await?;
        log::info!("[{protocol}] created empty collection at {}", path.display());
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::test_utils::{record, CREDENTIAL, DEVICE_ID, IDENTIFIER};
    use crate::types::LookupKey;

    async fn store_in(dir: &tempfile::TempDir) -> JsonFileStore {
        let store = JsonFileStore::new(
            dir.path().join("vmess.json"),
            dir.path().join("shadowsocks.json"),
        );
        store.initialize(Protocol::Vmess).await.unwrap();
        store.initialize(Protocol::Shadowsocks).await.unwrap();
        store
    }

    fn push(r: AccountRecord) -> CollectionMutation {
        Box::new(move |c: &mut AccountCollection| {
            c.push(r);
            Ok(None)
        })
    }

    fn dir_entries(dir: &tempfile::TempDir) -> Vec<String> {
        let mut names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn write_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir).await;

        store
            .mutate(Protocol::Vmess, push(record(IDENTIFIER, "", "alice")))
            .await
            .unwrap();
        let loaded = store.load(Protocol::Vmess).await.unwrap();
        assert_eq!(
            loaded,
            AccountCollection::new(vec![record(IDENTIFIER, "", "alice")])
        );
        assert_eq!(dir_entries(&dir), ["shadowsocks.json", "vmess.json"]);
    }

    #[tokio::test]
    async fn missing_and_corrupt_are_distinct() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(
            dir.path().join("vmess.json"),
            dir.path().join("shadowsocks.json"),
        );

        let err = store.load(Protocol::Vmess).await.unwrap_err();
        assert!(matches!(err, CoreError::CollectionMissing { .. }));

        std::fs::write(dir.path().join("shadowsocks.json"), b"not json").unwrap();
        let err = store.load(Protocol::Shadowsocks).await.unwrap_err();
        assert!(matches!(err, CoreError::CorruptCollection { .. }));

        let err = store
            .mutate(Protocol::Vmess, push(record(IDENTIFIER, "", "alice")))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::CollectionMissing { .. }));
    }

    #[tokio::test]
    async fn failed_mutation_is_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir).await;
        store
            .mutate(Protocol::Shadowsocks, push(record("", CREDENTIAL, "bob")))
            .await
            .unwrap();
        let before = std::fs::read(dir.path().join("shadowsocks.json")).unwrap();

        let err = store
            .mutate(
                Protocol::Shadowsocks,
                Box::new(|c: &mut AccountCollection| {
                    c.records.clear();
                    Err(CoreError::NotFound {
                        protocol: "shadowsocks".to_string(),
                        key: "x".to_string(),
                    })
                }),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::NotFound { ref key, .. } if key == "x"));
        let after = std::fs::read(dir.path().join("shadowsocks.json")).unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn mutate_returns_affected_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir).await;
        store
            .mutate(Protocol::Vmess, push(record(IDENTIFIER, "", "alice")))
            .await
            .unwrap();

        let key = LookupKey::Identifier(IDENTIFIER.to_string());
        let replaced = store
            .mutate(
                Protocol::Vmess,
                Box::new(move |c: &mut AccountCollection| Ok(c.replace(&key, record(IDENTIFIER, "", "alicia")))),
            )
            .await
            .unwrap();
        assert_eq!(replaced.unwrap().username, "alice");
        let loaded = store.load(Protocol::Vmess).await.unwrap();
        assert_eq!(loaded.records[0].username, "alicia");
    }

    #[tokio::test]
    async fn initialize_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir).await;
        store
            .mutate(Protocol::Vmess, push(record(IDENTIFIER, "", "alice")))
            .await
            .unwrap();

        assert!(!store.initialize(Protocol::Vmess).await.unwrap());
        assert_eq!(store.load(Protocol::Vmess).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn rewrite_keeps_unmanaged_client_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir).await;
        let seeded = serde_json::json!({"clients": [{
            "id": IDENTIFIER,
            "alterId": 1,
            "email": "alice@vpn",
            "username": "alice",
            "deviceId": DEVICE_ID,
            "startDate": "2024-01-01",
            "expireDate": "2024-02-01"
        }]});
        std::fs::write(dir.path().join("vmess.json"), seeded.to_string()).unwrap();

        let other = Uuid::new_v4().to_string();
        store
            .mutate(Protocol::Vmess, push(record(&other, "", "bob")))
            .await
            .unwrap();

        let text = std::fs::read_to_string(dir.path().join("vmess.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["clients"][0]["email"], "alice@vpn");
        assert!(value["clients"][1].get("email").is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn rewrite_keeps_file_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir).await;
        let path = dir.path().join("vmess.json");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600)).unwrap();

        store
            .mutate(Protocol::Vmess, push(record(IDENTIFIER, "", "alice")))
            .await
            .unwrap();
        // A mutation that changes nothing still rewrites the file
        store
            .mutate(Protocol::Vmess, Box::new(|_: &mut AccountCollection| Ok(None)))
            .await
            .unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(store.load(Protocol::Vmess).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn sstp_has_no_collection() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir).await;
        let err = store.load(Protocol::Sstp).await.unwrap_err();
        assert!(matches!(err, CoreError::UnsupportedProtocol { .. }));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_creates_lose_nothing() {
        const WRITERS: usize = 24;
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(store_in(&dir).await);

        let handles: Vec<_> = (0..WRITERS)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    let id = Uuid::new_v4().to_string();
                    store
                        .mutate(Protocol::Vmess, push(record(&id, "", &format!("user{i}"))))
                        .await
                })
            })
            .collect();

        let mut succeeded = 0;
        for result in futures::future::join_all(handles).await {
            if result.unwrap().is_ok() {
                succeeded += 1;
            }
        }

        let loaded = store.load(Protocol::Vmess).await.unwrap();
        assert_eq!(succeeded, WRITERS);
        assert!(loaded.len() >= succeeded);
        assert_eq!(dir_entries(&dir), ["shadowsocks.json", "vmess.json"]);
    }
}
