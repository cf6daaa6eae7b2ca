//! Event Journal
//!
//! Append-only record of every state change, chained with SHA-256 so that a
//! persisted journal can be checked for tampering.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::airlines::types::{AirlineId, Amount};
use crate::error::MembershipError;

pub const GENESIS_HASH: &str =
    "sha256:0000000000000000000000000000000000000000000000000000000000000000";

/// State change recorded by the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NetworkEvent {
    NetworkInitialized {
        owner: AirlineId,
        seed_funding: Amount,
    },
    OperatingStatusChanged {
        operational: bool,
        changed_by: AirlineId,
    },
    AirlineRegistered {
        airline: AirlineId,
        registered_by: AirlineId,
        registered_count: usize,
    },
    VoteRecorded {
        candidate: AirlineId,
        voter: AirlineId,
        votes: usize,
        required: usize,
    },
    AirlineFunded {
        airline: AirlineId,
        amount: Amount,
        total: Amount,
    },
    StateRestored {
        owner: AirlineId,
        registered_count: usize,
        funded_count: usize,
    },
}

impl NetworkEvent {
    pub fn name(&self) -> &'static str {
        match self {
            NetworkEvent::NetworkInitialized { .. } => "network_initialized",
            NetworkEvent::OperatingStatusChanged { .. } => "operating_status_changed",
            NetworkEvent::AirlineRegistered { .. } => "airline_registered",
            NetworkEvent::VoteRecorded { .. } => "vote_recorded",
            NetworkEvent::AirlineFunded { .. } => "airline_funded",
            NetworkEvent::StateRestored { .. } => "state_restored",
        }
    }

    /// Deterministic field listing used for hashing
    pub fn canonical_string(&self) -> String {
        let fields = match self {
            NetworkEvent::NetworkInitialized {
                owner,
                seed_funding,
            } => format!("owner={},seed_funding={}", owner, seed_funding),
            NetworkEvent::OperatingStatusChanged {
                operational,
                changed_by,
            } => format!("operational={},changed_by={}", operational, changed_by),
            NetworkEvent::AirlineRegistered {
                airline,
                registered_by,
                registered_count,
            } => format!(
                "airline={},registered_by={},registered_count={}",
                airline, registered_by, registered_count
            ),
            NetworkEvent::VoteRecorded {
                candidate,
                voter,
                votes,
                required,
            } => format!(
                "candidate={},voter={},votes={},required={}",
                candidate, voter, votes, required
            ),
            NetworkEvent::AirlineFunded {
                airline,
                amount,
                total,
            } => format!("airline={},amount={},total={}", airline, amount, total),
            NetworkEvent::StateRestored {
                owner,
                registered_count,
                funded_count,
            } => format!(
                "owner={},registered_count={},funded_count={}",
                owner, registered_count, funded_count
            ),
        };
        format!("{}({})", self.name(), fields)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub event: NetworkEvent,
    pub previous_hash: String,
    pub hash: String,
}

impl JournalEntry {
    fn new(sequence: u64, event: NetworkEvent, previous_hash: String) -> Self {
        let mut entry = Self {
            sequence,
            timestamp: Utc::now(),
            event,
            previous_hash,
            hash: String::new(),
        };
        entry.hash = entry.calculate_hash();
        entry
    }

    /// Canonical string representation for hashing
    pub fn canonical_string(&self) -> String {
        format!(
            "sequence:{}|timestamp:{}|event:{}|previous_hash:{}",
            self.sequence,
            self.timestamp.to_rfc3339(),
            self.event.canonical_string(),
            self.previous_hash
        )
    }

    pub fn calculate_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.canonical_string().as_bytes());
        format!("sha256:{}", hex::encode(hasher.finalize()))
    }

    pub fn verify_hash(&self) -> bool {
        self.hash == self.calculate_hash()
    }
}

/// In-memory tail of the hash chain. Entries already persisted elsewhere can
/// be discarded; `first_sequence` and `base_hash` anchor what remains.
#[derive(Debug, Clone)]
pub struct EventJournal {
    first_sequence: u64,
    base_hash: String,
    entries: Vec<JournalEntry>,
}

impl Default for EventJournal {
    fn default() -> Self {
        Self {
            first_sequence: 0,
            base_hash: GENESIS_HASH.to_string(),
            entries: Vec::new(),
        }
    }
}

impl EventJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, event: NetworkEvent) -> &JournalEntry {
        let entry = JournalEntry::new(self.next_sequence(), event, self.head_hash());
        debug!("Journal #{}: {}", entry.sequence, entry.event.name());
        self.entries.push(entry);
        &self.entries[self.entries.len() - 1]
    }

    pub fn head_hash(&self) -> String {
        self.entries
            .last()
            .map(|entry| entry.hash.clone())
            .unwrap_or_else(|| self.base_hash.clone())
    }

    /// Sequence of the oldest entry still held in memory
    pub fn first_sequence(&self) -> u64 {
        self.first_sequence
    }

    /// Sequence the next appended entry will get; also the total ever appended
    pub fn next_sequence(&self) -> u64 {
        self.first_sequence + self.entries.len() as u64
    }

    /// Drop held entries with a sequence below `sequence`. Returns how many
    /// were dropped.
    pub fn discard_before(&mut self, sequence: u64) -> usize {
        let count =
            (sequence.saturating_sub(self.first_sequence) as usize).min(self.entries.len());
        if count == 0 {
            return 0;
        }

        self.base_hash = self.entries[count - 1].hash.clone();
        self.entries.drain(..count);
        self.first_sequence += count as u64;
        debug!(
            "Discarded {} journal entries, first held is #{}",
            count, self.first_sequence
        );
        count
    }

    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check sequence numbers, entry hashes and the hash chain
    pub fn verify(&self) -> Result<(), MembershipError> {
        let mut previous = self.base_hash.clone();

        for (index, entry) in self.entries.iter().enumerate() {
            let expected = self.first_sequence + index as u64;
            if entry.sequence != expected {
                return Err(MembershipError::JournalError(format!(
                    "Entry {} has sequence {}",
                    expected, entry.sequence
                )));
            }

            if entry.previous_hash != previous {
                return Err(MembershipError::JournalError(format!(
                    "Hash chain broken at entry {}",
                    expected
                )));
            }

            if !entry.verify_hash() {
                return Err(MembershipError::JournalError(format!(
                    "Invalid hash in entry {}",
                    expected
                )));
            }

            previous = entry.hash.clone();
        }

        Ok(())
    }

    /// Read and verify a JSONL journal
    pub fn load(path: &Path) -> Result<Self, MembershipError> {
        let file = File::open(path).map_err(|e| {
            MembershipError::JournalError(format!("Failed to open {:?}: {}", path, e))
        })?;

        let mut entries = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let entry: JournalEntry = serde_json::from_str(&line).map_err(|e| {
                MembershipError::JournalError(format!(
                    "Failed to parse entry {}: {}",
                    entries.len(),
                    e
                ))
            })?;
            entries.push(entry);
        }

        let journal = Self {
            entries,
            ..Self::default()
        };
        journal.verify()?;
        info!("Loaded {} journal entries from {:?}", journal.len(), path);
        Ok(journal)
    }
}

/// Entries kept in memory after the sink has written them
pub const DEFAULT_JOURNAL_RETENTION: usize = 1024;

/// Appends journal entries to a JSONL file as they are produced
#[derive(Debug)]
pub struct JournalSink {
    path: PathBuf,
    next_sequence: u64,
    retention: usize,
}

impl JournalSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            next_sequence: 0,
            retention: DEFAULT_JOURNAL_RETENTION,
        }
    }

    pub fn with_retention(mut self, retention: usize) -> Self {
        self.retention = retention;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn retention(&self) -> usize {
        self.retention
    }

    /// Sequence of the first entry not yet written
    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    /// Oldest sequence the journal must still hold: everything unwritten,
    /// plus the last `retention` entries
    pub fn keep_from(&self, journal: &EventJournal) -> u64 {
        journal
            .next_sequence()
            .saturating_sub(self.retention as u64)
            .min(self.next_sequence)
    }

    /// Move a journal left by an earlier run aside, so a new chain can start
    /// at genesis. Returns where the old file went.
    pub fn rotate_existing(&self) -> Result<Option<PathBuf>, MembershipError> {
        let has_entries = fs::metadata(&self.path)
            .map(|meta| meta.len() > 0)
            .unwrap_or(false);
        if !has_entries {
            return Ok(None);
        }

        let mut rotated = self.path.clone().into_os_string();
        rotated.push(format!(".{}", Utc::now().format("%Y%m%dT%H%M%S")));
        let rotated = PathBuf::from(rotated);

        fs::rename(&self.path, &rotated)?;
        info!("Rotated previous journal to {:?}", rotated);
        Ok(Some(rotated))
    }

    /// Write every entry not yet persisted. On failure nothing is marked as
    /// written, so the next call retries the same entries.
    pub fn sync(&mut self, journal: &EventJournal) -> Result<usize, MembershipError> {
        if journal.first_sequence() > self.next_sequence {
            return Err(MembershipError::JournalError(format!(
                "Entries from #{} were discarded before being written",
                self.next_sequence
            )));
        }

        let skip = (self.next_sequence - journal.first_sequence()) as usize;
        let pending = &journal.entries()[skip.min(journal.len())..];
        if pending.is_empty() {
            return Ok(0);
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut buffer = String::new();
        for entry in pending {
            let line = serde_json::to_string(entry).map_err(|e| {
                MembershipError::JournalError(format!("Failed to serialize entry: {}", e))
            })?;
            buffer.push_str(&line);
            buffer.push('\n');
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(buffer.as_bytes())?;
        file.flush()?;

        self.next_sequence = journal.next_sequence();
        Ok(pending.len())
    }
}
