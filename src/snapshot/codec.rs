use std::io::Read;
use std::path::{Path, PathBuf};

use bincode::config::{Configuration, Fixint, LittleEndian, Limit};
use bincode::{Decode, Encode};
use compio::fs;
use snafu::prelude::*;
use tracing::{debug, info};

use crate::ext::BestEffortPathExt;
use crate::snapshot::Snapshot;

/// File extension used for saved snapshots.
pub const SNAPSHOT_EXTENSION: &str = "spaceguard";

const MAGIC: [u8; 4] = *b"SPGD";
const FORMAT_VERSION: u32 = 1;
const COMPRESSION_LEVEL: i32 = 3;
/// Upper bound for the decompressed payload and for every length claimed inside it.
const MAX_PAYLOAD_LEN: usize = 1 << 30;

#[derive(Debug, Encode, Decode)]
struct Header {
    magic: [u8; 4],
    version: u32,
}

fn bincode_config() -> Configuration<LittleEndian, Fixint, Limit<MAX_PAYLOAD_LEN>> {
    bincode::config::standard()
        .with_fixed_int_encoding()
        .with_limit::<MAX_PAYLOAD_LEN>()
}

fn decompress(bytes: &[u8], limit: usize) -> Result<Vec<u8>, SnapshotDecodingError> {
    let decoder = zstd::stream::read::Decoder::new(bytes).context(DecompressSnafu)?;
    let mut payload = Vec::new();
    decoder
        .take(limit as u64 + 1)
        .read_to_end(&mut payload)
        .context(DecompressSnafu)?;
    ensure!(payload.len() <= limit, PayloadTooLargeSnafu { limit });
    Ok(payload)
}

impl Snapshot {
    /// Serializes the snapshot into its compressed on-disk representation.
    ///
    /// Children are stored in key order, so the same tree always encodes to the same bytes.
    pub fn encode(&self) -> Result<Vec<u8>, SnapshotEncodingError> {
        let header = Header {
            magic: MAGIC,
            version: FORMAT_VERSION,
        };
        let mut payload =
            bincode::encode_to_vec(&header, bincode_config()).context(SerializeSnafu)?;
        payload.extend(bincode::encode_to_vec(self, bincode_config()).context(SerializeSnafu)?);

        let compressed =
            zstd::encode_all(payload.as_slice(), COMPRESSION_LEVEL).context(CompressSnafu)?;
        debug!(
            "Encoded snapshot of {}: {} bytes, {} compressed",
            self.root_path.display(),
            payload.len(),
            compressed.len()
        );
        Ok(compressed)
    }

    /// Reconstructs a snapshot from bytes produced by [`Snapshot::encode`].
    pub fn decode(bytes: &[u8]) -> Result<Self, SnapshotDecodingError> {
        let payload = decompress(bytes, MAX_PAYLOAD_LEN)?;

        let (header, header_len): (Header, usize) =
            bincode::decode_from_slice(&payload, bincode_config()).context(DeserializeSnafu)?;
        ensure!(header.magic == MAGIC, BadMagicSnafu);
        ensure!(
            header.version == FORMAT_VERSION,
            UnsupportedVersionSnafu {
                found: header.version
            }
        );

        let body = &payload[header_len..];
        let (snapshot, body_len): (Snapshot, usize) =
            bincode::decode_from_slice(body, bincode_config()).context(DeserializeSnafu)?;
        ensure!(
            body_len == body.len(),
            TrailingBytesSnafu {
                count: body.len() - body_len
            }
        );
        ensure!(snapshot.root.is_consistent(), InconsistentSizesSnafu);

        Ok(snapshot)
    }

    /// Writes the snapshot to `path`, replacing any existing file.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<(), SaveError> {
        let path = path.as_ref();
        let bytes = self.encode().context(EncodeSnafu {
            path: path.to_path_buf(),
        })?;
        let len = bytes.len();

        fs::write(path, bytes).await.0.context(WriteSnafu {
            path: path.to_path_buf(),
        })?;
        info!("Saved snapshot to {} ({} bytes)", path.display(), len);
        Ok(())
    }

    /// Reads a snapshot previously written by [`Snapshot::save`].
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let bytes = fs::read(path).await.context(ReadSnafu {
            path: path.to_path_buf(),
        })?;
        let snapshot = Self::decode(&bytes).context(DecodeSnafu {
            path: path.to_path_buf(),
        })?;
        info!(
            "Loaded snapshot of {} from {}",
            snapshot.root_path.display(),
            path.display()
        );
        Ok(snapshot)
    }

    /// Replaces this snapshot with the one stored at `path`.
    ///
    /// On failure `self` is left untouched.
    pub async fn reload(&mut self, path: impl AsRef<Path>) -> Result<(), LoadError> {
        *self = Self::load(path).await?;
        Ok(())
    }
}

#[derive(Debug, Snafu)]
pub enum SnapshotEncodingError {
    #[snafu(display("Failed to serialize snapshot"))]
    SerializeError { source: bincode::error::EncodeError },
    #[snafu(display("Failed to compress snapshot"))]
    CompressError { source: std::io::Error },
}

#[derive(Debug, Snafu)]
pub enum SnapshotDecodingError {
    #[snafu(display("Snapshot data is not valid compressed data"))]
    DecompressError { source: std::io::Error },
    #[snafu(display("Snapshot data exceeds {} bytes once decompressed", limit))]
    PayloadTooLarge { limit: usize },
    #[snafu(display("Snapshot data is malformed"))]
    DeserializeError { source: bincode::error::DecodeError },
    #[snafu(display("Data is not a snapshot"))]
    BadMagic,
    #[snafu(display("Unsupported snapshot format version {}", found))]
    UnsupportedVersion { found: u32 },
    #[snafu(display("Snapshot data has {} unexpected trailing bytes", count))]
    TrailingBytes { count: usize },
    #[snafu(display("Snapshot directory sizes do not add up"))]
    InconsistentSizes,
}

#[derive(Debug, Snafu)]
pub enum SaveError {
    #[snafu(display("Failed to encode snapshot for {}", path.display()))]
    EncodeError {
        path: PathBuf,
        source: SnapshotEncodingError,
    },
    #[snafu(display("Failed to save the snapshot to {}", path.best_effort_path_display()))]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Snafu)]
pub enum LoadError {
    #[snafu(display("Failed to read the snapshot from {}", path.best_effort_path_display()))]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Failed to load the snapshot from {}", path.best_effort_path_display()))]
    DecodeError {
        path: PathBuf,
        source: SnapshotDecodingError,
    },
}
