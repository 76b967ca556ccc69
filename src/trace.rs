//! Execution trace for replay verification.
//!
//! Records every dispatched event into an append-only trace, takes periodic
//! checkpoints carrying a running hash, and round-trips through a
//! line-oriented text format so two runs can be compared after the fact.

use std::io::{self, BufRead, Write};

use serde::{Deserialize, Serialize};

use crate::event::EventId;
use crate::task::TaskId;
use crate::time::SimTime;

// ── Hash utility ──────────────────────────────────────────────────────

/// Combine two u64 hashes deterministically.
pub fn hash_combine(a: u64, b: u64) -> u64 {
    let mut h = a;
    h = h.wrapping_mul(0x517cc1b727220a95);
    h = h.wrapping_add(b);
    h ^= h >> 32;
    h
}

// ── Entries ───────────────────────────────────────────────────────────

/// Where a dispatched event came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// A one-shot `schedule*` call.
    Once,
    /// An occurrence of a periodic task.
    Task(u64),
}

impl Origin {
    pub(crate) fn task(id: TaskId) -> Self {
        Origin::Task(id.raw())
    }

    fn hash(self) -> u64 {
        match self {
            Origin::Once => 0,
            Origin::Task(id) => hash_combine(1, id),
        }
    }
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Origin::Once => write!(f, "once"),
            Origin::Task(id) => write!(f, "task:{}", id),
        }
    }
}

/// One dispatched event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEntry {
    /// Zero-based position in dispatch order.
    pub index: u64,
    pub event: EventId,
    pub at: SimTime,
    pub origin: Origin,
}

impl TraceEntry {
    fn hash(&self) -> u64 {
        let mut h = hash_combine(self.index, self.event.raw());
        h = hash_combine(h, self.at.as_nanos());
        hash_combine(h, self.origin.hash())
    }
}

/// A snapshot taken every `checkpoint_interval` dispatched events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Number of events dispatched when the checkpoint was taken.
    pub event_index: u64,
    pub time: SimTime,
    /// Running hash over all entries so far.
    pub trace_hash: u64,
    /// Live events still queued.
    pub pending: usize,
}

// ── Execution Trace ───────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct ExecutionTrace {
    entries: Vec<TraceEntry>,
    checkpoints: Vec<Checkpoint>,
    checkpoint_interval: Option<u64>,
    running_hash: u64,
}

impl ExecutionTrace {
    pub fn new() -> Self {
        Self::default()
    }

    /// A trace that checkpoints every `n` entries.
    pub fn with_checkpoint_interval(n: u64) -> Self {
        ExecutionTrace {
            checkpoint_interval: Some(n),
            ..Self::default()
        }
    }

    /// Append a dispatched event, checkpointing if the interval is due.
    pub(crate) fn record(&mut self, event: EventId, at: SimTime, origin: Origin, pending: usize) {
        let entry = TraceEntry {
            index: self.entries.len() as u64,
            event,
            at,
            origin,
        };
        self.running_hash = hash_combine(self.running_hash, entry.hash());
        self.entries.push(entry);

        let recorded = self.entries.len() as u64;
        if matches!(self.checkpoint_interval, Some(n) if n > 0 && recorded % n == 0) {
            self.checkpoints.push(Checkpoint {
                event_index: recorded,
                time: at,
                trace_hash: self.running_hash,
                pending,
            });
        }
    }

    /// Recorded events in dispatch order.
    pub fn entries(&self) -> &[TraceEntry] {
        &self.entries
    }

    pub fn checkpoints(&self) -> &[Checkpoint] {
        &self.checkpoints
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Deterministic digest of every recorded entry.
    pub fn trace_hash(&self) -> u64 {
        self.running_hash
    }

    // ── Export / Import ───────────────────────────────────────────

    /// Write the trace in the `KAIROS TRACE v1` text format.
    pub fn export<W: Write>(&self, w: &mut W) -> io::Result<()> {
        writeln!(w, "# KAIROS TRACE v1")?;
        writeln!(w, "# entries: {}", self.entries.len())?;
        writeln!(w, "# checkpoints: {}", self.checkpoints.len())?;

        for e in &self.entries {
            writeln!(w, "E {} {} {} {}", e.index, e.event.raw(), e.at.as_nanos(), e.origin)?;
        }
        for cp in &self.checkpoints {
            writeln!(
                w,
                "C {} {} {:016x} {}",
                cp.event_index,
                cp.time.as_nanos(),
                cp.trace_hash,
                cp.pending
            )?;
        }
        Ok(())
    }

    /// [`export`](Self::export) into a newly created file.
    pub fn export_to_file(&self, path: impl AsRef<std::path::Path>) -> io::Result<()> {
        let mut f = io::BufWriter::new(std::fs::File::create(path)?);
        self.export(&mut f)?;
        f.flush()
    }

    /// Read a trace written by [`export`](Self::export).
    ///
    /// The running hash is recomputed from the entries, so a trace whose
    /// entries were edited no longer matches its checkpoints.
    pub fn import<R: BufRead>(r: R) -> io::Result<Self> {
        let mut trace = ExecutionTrace::new();

        for (lineno, line) in r.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let invalid = |msg: String| {
                io::Error::new(io::ErrorKind::InvalidData, format!("line {}: {}", lineno + 1, msg))
            };

            if let Some(rest) = line.strip_prefix("E ") {
                let entry = parse_entry(rest).map_err(invalid)?;
                if entry.index != trace.entries.len() as u64 {
                    return Err(invalid(format!("entry index {} out of sequence", entry.index)));
                }
                trace.running_hash = hash_combine(trace.running_hash, entry.hash());
                trace.entries.push(entry);
            } else if let Some(rest) = line.strip_prefix("C ") {
                trace.checkpoints.push(parse_checkpoint(rest).map_err(invalid)?);
            } else {
                return Err(invalid(format!("unrecognised record: {}", line)));
            }
        }

        Ok(trace)
    }

    /// [`import`](Self::import) from a file.
    pub fn import_from_file(path: impl AsRef<std::path::Path>) -> io::Result<Self> {
        let f = std::fs::File::open(path)?;
        Self::import(io::BufReader::new(f))
    }

    /// Whether every checkpoint agrees with the hash recomputed from the
    /// entries that precede it.
    pub fn verify_checkpoints(&self) -> bool {
        let mut h = 0u64;
        let mut cps = self.checkpoints.iter().peekable();
        for (i, entry) in self.entries.iter().enumerate() {
            h = hash_combine(h, entry.hash());
            while let Some(cp) = cps.peek() {
                if cp.event_index != i as u64 + 1 {
                    break;
                }
                if cp.trace_hash != h {
                    return false;
                }
                cps.next();
            }
        }
        cps.next().is_none()
    }
}

// ── Verification ──────────────────────────────────────────────────────

/// Compare two traces entry by entry.
pub fn traces_match(a: &ExecutionTrace, b: &ExecutionTrace) -> bool {
    a.entries == b.entries
}

/// Compare the checkpoints of two traces.
pub fn checkpoints_match(a: &ExecutionTrace, b: &ExecutionTrace) -> bool {
    a.checkpoints == b.checkpoints
}

// ── Parsing helpers ───────────────────────────────────────────────────

fn field<'a>(parts: &mut impl Iterator<Item = &'a str>, name: &str) -> Result<&'a str, String> {
    parts.next().ok_or_else(|| format!("missing {}", name))
}

fn parse_u64(s: &str, name: &str) -> Result<u64, String> {
    s.parse().map_err(|e| format!("{}: {}", name, e))
}

fn parse_origin(s: &str) -> Result<Origin, String> {
    if s == "once" {
        return Ok(Origin::Once);
    }
    match s.strip_prefix("task:") {
        Some(id) => Ok(Origin::Task(parse_u64(id, "task id")?)),
        None => Err(format!("unknown origin: {}", s)),
    }
}

fn parse_entry(s: &str) -> Result<TraceEntry, String> {
    let mut parts = s.split_whitespace();
    let index = parse_u64(field(&mut parts, "index")?, "index")?;
    let event = EventId::new(parse_u64(field(&mut parts, "event")?, "event")?);
    let at = SimTime::from_nanos(parse_u64(field(&mut parts, "time")?, "time")?);
    let origin = parse_origin(field(&mut parts, "origin")?)?;
    Ok(TraceEntry { index, event, at, origin })
}

fn parse_checkpoint(s: &str) -> Result<Checkpoint, String> {
    let mut parts = s.split_whitespace();
    let event_index = parse_u64(field(&mut parts, "index")?, "index")?;
    let time = SimTime::from_nanos(parse_u64(field(&mut parts, "time")?, "time")?);
    let hash = field(&mut parts, "hash")?;
    let trace_hash = u64::from_str_radix(hash, 16).map_err(|e| format!("hash: {}", e))?;
    let pending = field(&mut parts, "pending")?
        .parse()
        .map_err(|e| format!("pending: {}", e))?;
    Ok(Checkpoint {
        event_index,
        time,
        trace_hash,
        pending,
    })
}
