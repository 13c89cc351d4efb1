//! Document store kept in a single zlib-compressed protobuf snapshot.
//!
//! The whole snapshot is loaded on open and rewritten on every successful
//! commit. Writes go to `{path}.tmp` first and are renamed over the old
//! file, so a crash mid-write leaves the previous snapshot intact.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use futures::lock::Mutex;
use prost::Message;
use tracing::{debug, span, trace, Level};

use hal_map::store::{DocumentStore, WriteBatch};
use hal_map::{Program, Shop, StoreError};

use crate::store_pb::{ProgramRecord, ShopRecord, StoreSnapshot, SNAPSHOT_VERSION};

#[derive(Debug, Default, Clone)]
struct Snapshot {
    shops: BTreeMap<String, Shop>,
    programs: Vec<Program>,
}

#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    state: Mutex<Snapshot>,
}

impl FileStore {
    /// Opens the snapshot at `path`. A missing file is an empty store; it is
    /// created on the first write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let _span = span!(Level::DEBUG, "open_store", path = %path.display()).entered();
        let snapshot = if path.exists() {
            read_snapshot(&path)?
        } else {
            debug!("no snapshot yet, starting empty");
            Snapshot::default()
        };
        debug!("loaded {} shops, {} programs", snapshot.shops.len(), snapshot.programs.len());
        Ok(Self { path, state: Mutex::new(snapshot) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn read_snapshot(path: &Path) -> Result<Snapshot, StoreError> {
    let mut bytes = Vec::new();
    ZlibDecoder::new(File::open(path)?).read_to_end(&mut bytes)?;
    trace!("decompressed {} bytes", bytes.len());

    let pb = StoreSnapshot::decode(bytes.as_slice()).map_err(|e| StoreError::Decode(e.to_string()))?;
    if pb.version > SNAPSHOT_VERSION {
        return Err(StoreError::Decode(format!(
            "snapshot version {} is newer than supported version {}",
            pb.version, SNAPSHOT_VERSION
        )));
    }
    Ok(Snapshot {
        shops: pb
            .shops
            .into_iter()
            .map(|r| {
                let shop = Shop::from(r);
                (shop.id.clone(), shop)
            })
            .collect(),
        programs: pb.programs.into_iter().map(Program::from).collect(),
    })
}

fn encode_snapshot(snapshot: &Snapshot) -> Result<Vec<u8>, StoreError> {
    let pb = StoreSnapshot {
        version: SNAPSHOT_VERSION,
        shops: snapshot.shops.values().map(ShopRecord::from).collect(),
        programs: snapshot.programs.iter().map(ProgramRecord::from).collect(),
    };
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(&pb.encode_to_vec())
        .map_err(|e| StoreError::Encode(e.to_string()))?;
    encoder.finish().map_err(|e| StoreError::Encode(e.to_string()))
}

/// Writes `data` to `{path}.tmp`, syncs it and renames it over `path`.
fn atomic_write(path: &Path, data: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let mut file = File::create(&tmp)?;
    file.write_all(data)?;
    file.sync_all()?;
    fs::rename(&tmp, path)
}

impl FileStore {
    /// Persists `next` and only then makes it the in-memory state.
    fn persist(&self, state: &mut Snapshot, next: Snapshot) -> Result<(), StoreError> {
        let bytes = encode_snapshot(&next)?;
        atomic_write(&self.path, &bytes)?;
        trace!("wrote {} compressed bytes to {}", bytes.len(), self.path.display());
        *state = next;
        Ok(())
    }
}

impl DocumentStore for FileStore {
    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        let mut next = state.clone();
        batch.apply_to(&mut next.shops)?;
        debug!("committing batch of {} operations", batch.len());
        self.persist(&mut state, next)
    }

    async fn list_shops(&self) -> Result<Vec<Shop>, StoreError> {
        Ok(self.state.lock().await.shops.values().cloned().collect())
    }

    async fn get_shop(&self, id: &str) -> Result<Option<Shop>, StoreError> {
        Ok(self.state.lock().await.shops.get(id).cloned())
    }

    async fn load_programs(&self) -> Result<Vec<Program>, StoreError> {
        Ok(self.state.lock().await.programs.clone())
    }

    async fn save_programs(&self, programs: &[Program]) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        let next = Snapshot { shops: state.shops.clone(), programs: programs.to_vec() };
        self.persist(&mut state, next)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use hal_map::store::WriteOp;

    /// Fresh path under the system temp dir, removed before use.
    fn temp_store_path(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("hal_file_store_test_{}_{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir.join("store.pb.z")
    }

    fn shop(id: &str, no: &str) -> Shop {
        Shop { id: id.into(), name: format!("Shop {no}"), no: no.into(), ..Default::default() }
    }

    #[test]
    fn missing_file_is_empty_store() {
        let path = temp_store_path("missing");
        let store = FileStore::open(&path).unwrap();
        assert!(block_on(store.list_shops()).unwrap().is_empty());
        assert!(!path.exists());
    }

    #[test]
    fn survives_reopen() {
        let path = temp_store_path("reopen");
        {
            let store = FileStore::open(&path).unwrap();
            let mut batch = WriteBatch::new();
            batch.push(WriteOp::Create(shop("a", "1")));
            batch.push(WriteOp::Create(shop("b", "2")));
            block_on(store.commit(batch)).unwrap();
            let programs = vec![Program { label: "Logo".into(), value: "logo".into(), color: "#123456".into() }];
            block_on(store.save_programs(&programs)).unwrap();
        }
        assert!(path.exists());
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        assert!(!PathBuf::from(tmp).exists());

        let store = FileStore::open(&path).unwrap();
        let shops = block_on(store.list_shops()).unwrap();
        assert_eq!(shops.len(), 2);
        assert_eq!(block_on(store.get_shop("b")).unwrap().unwrap().no, "2");
        assert_eq!(block_on(store.load_programs()).unwrap()[0].value, "logo");
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn failed_batch_leaves_file_untouched() {
        let path = temp_store_path("conflict");
        let store = FileStore::open(&path).unwrap();
        let mut batch = WriteBatch::new();
        batch.push(WriteOp::Create(shop("a", "1")));
        block_on(store.commit(batch)).unwrap();
        let before = fs::read(&path).unwrap();

        let mut batch = WriteBatch::new();
        batch.push(WriteOp::Create(shop("c", "3")));
        batch.push(WriteOp::Create(shop("a", "1")));
        assert!(matches!(block_on(store.commit(batch)), Err(StoreError::AlreadyExists(_))));
        assert_eq!(fs::read(&path).unwrap(), before);
        assert!(block_on(store.get_shop("c")).unwrap().is_none());
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn garbage_file_is_a_decode_error() {
        let path = temp_store_path("garbage");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"definitely not zlib").unwrap();
        let err = FileStore::open(&path).unwrap_err();
        assert!(matches!(err, StoreError::Io(_) | StoreError::Decode(_)), "got {err:?}");
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }
}
