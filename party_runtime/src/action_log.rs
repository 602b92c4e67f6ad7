//! Append-only action log — binary protobuf frames.
//!
//! Storage format:
//!   [4-byte LE length][protobuf bytes][4-byte LE length][protobuf bytes]...
//!
//! Rules:
//!   - Strict append only; no mutation, deletion or reordering
//!   - fsync after every write
//!   - Sequence strictly increasing (validated on append and on load)
//!   - Rejected party actions are logged like accepted ones: they are part
//!     of the replayable stream

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use prost::Message;
use tracing::{debug, warn};

use crate::errors::RuntimeError;
use crate::proto_types::ProtoActionEnvelope;

/// Largest frame accepted when reading back.
pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

pub struct ActionLog {
    path: PathBuf,
    last_sequence: u64,
}

impl ActionLog {
    /// Open or create a log, scanning existing frames for the last sequence.
    pub fn open(path: &Path) -> Result<Self, RuntimeError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let last_sequence = if path.exists() {
            Self::read_all_from_file(path)?
                .last()
                .map(|e| e.sequence)
                .unwrap_or(0)
        } else {
            0
        };
        debug!(path = %path.display(), last_sequence, "action log opened");
        Ok(Self {
            path: path.to_path_buf(),
            last_sequence,
        })
    }

    pub fn append(&mut self, envelope: &ProtoActionEnvelope) -> Result<(), RuntimeError> {
        let expected = self.last_sequence + 1;
        if envelope.sequence != expected {
            return Err(RuntimeError::LogSequence {
                expected,
                got: envelope.sequence,
            });
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let buf = envelope.encode_to_vec();
        let len = u32::try_from(buf.len()).map_err(|_| RuntimeError::CorruptLog {
            path: self.path.clone(),
            detail: format!("frame of {} bytes is too large", buf.len()),
        })?;
        {
            let mut writer = BufWriter::new(&mut file);
            writer.write_all(&len.to_le_bytes())?;
            writer.write_all(&buf)?;
            writer.flush()?;
        }
        file.sync_all()?;

        self.last_sequence = envelope.sequence;
        Ok(())
    }

    pub fn load_all(&self) -> Result<Vec<ProtoActionEnvelope>, RuntimeError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        Self::read_all_from_file(&self.path)
    }

    /// Frames with a sequence above `after`, for replay on top of a snapshot.
    pub fn load_after(&self, after: u64) -> Result<Vec<ProtoActionEnvelope>, RuntimeError> {
        let mut all = self.load_all()?;
        all.retain(|e| e.sequence > after);
        Ok(all)
    }

    pub fn last_sequence(&self) -> u64 {
        self.last_sequence
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all_from_file(path: &Path) -> Result<Vec<ProtoActionEnvelope>, RuntimeError> {
        let corrupt = |detail: String| {
            warn!(path = %path.display(), %detail, "action log is corrupt");
            RuntimeError::CorruptLog {
                path: path.to_path_buf(),
                detail,
            }
        };

        let mut reader = BufReader::new(File::open(path)?);
        let mut envelopes: Vec<ProtoActionEnvelope> = Vec::new();
        let mut len_buf = [0u8; 4];

        loop {
            match reader.read_exact(&mut len_buf) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e.into()),
            }

            let len = u32::from_le_bytes(len_buf) as usize;
            if len == 0 || len > MAX_FRAME_LEN {
                return Err(corrupt(format!(
                    "invalid frame length {} after {} frames",
                    len,
                    envelopes.len()
                )));
            }

            let mut frame = vec![0u8; len];
            reader
                .read_exact(&mut frame)
                .map_err(|e| corrupt(format!("truncated frame {}: {}", envelopes.len() + 1, e)))?;

            let envelope = ProtoActionEnvelope::decode(frame.as_slice())?;
            let expected = envelopes.last().map(|e| e.sequence).unwrap_or(0) + 1;
            if envelope.sequence != expected {
                return Err(corrupt(format!(
                    "frame {} has sequence {}, expected {}",
                    envelopes.len() + 1,
                    envelope.sequence,
                    expected
                )));
            }
            envelopes.push(envelope);
        }

        Ok(envelopes)
    }
}
