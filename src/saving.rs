use bincode::{deserialize_from, serialize_into};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use std::fs::File;
use std::io::{BufReader, BufWriter, Error, ErrorKind};
use std::path::Path;

use crate::airdrop::Airdrop;

/// Snapshot a record collection to a gzip-compressed bincode file.
pub fn save_collection(records: &[Airdrop], path: impl AsRef<Path>) -> std::io::Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(GzEncoder::new(file, Compression::default()));
    serialize_into(&mut writer, records).map_err(|e| Error::new(ErrorKind::Other, e))
}

/// Read a collection snapshot back from disk.
pub fn load_collection(path: impl AsRef<Path>) -> std::io::Result<Vec<Airdrop>> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(GzDecoder::new(file));
    deserialize_from(&mut reader).map_err(|e| Error::new(ErrorKind::InvalidData, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::airdrop::AirdropInput;
    use crate::store::AirdropStore;

    #[test]
    fn snapshot_round_trip() {
        let mut store = AirdropStore::new();
        store.add(
            "guest",
            AirdropInput {
                name: Some("saved".to_string()),
                notes: Some("remember the wallet".to_string()),
                ..Default::default()
            },
        );

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("airdrops.bin.gz");
        save_collection(store.records(), &path).unwrap();

        let loaded = load_collection(&path).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "saved");
        assert_eq!(loaded[0].notes.as_deref(), Some("remember the wallet"));
        assert_eq!(loaded[0].status, store.records()[0].status);
    }
}
