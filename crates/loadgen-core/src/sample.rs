//! Runtime sample state: the loaded candidate pool and time windows.

use crate::error::{LoadError, SampleError};
use crate::schema::{GenerationMode, SampleSpec};
use crate::timemath::parse_offset;
use crate::token::Token;
use chrono::{DateTime, Duration, Utc};
use std::fs;
use std::sync::Arc;
use tracing::warn;

/// One raw candidate record and its byte length.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateRecord {
    /// Raw record text.
    pub raw: String,
    /// Byte length of the raw text, used by byte-budget sizing.
    pub bytes: usize,
}

/// Ordered, immutable pool of candidate records.
///
/// The pool is shared by reference between the governor and all work items;
/// only a reload swaps in a new pool.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidatePool {
    records: Vec<CandidateRecord>,
}

impl CandidatePool {
    /// Build a pool from an iterator of lines. Blank lines are skipped.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let records = lines
            .into_iter()
            .map(Into::into)
            .filter(|line| !line.trim().is_empty())
            .map(|raw| {
                let bytes = raw.len();
                CandidateRecord { raw, bytes }
            })
            .collect();
        Self { records }
    }

    /// Load a pool from a line-oriented candidate file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, LoadError> {
        let content = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        if content.contains('\u{0}') {
            return Err(LoadError::Format {
                path: path.display().to_string(),
                reason: "binary content in line-oriented sample file".to_string(),
            });
        }
        Ok(Self::from_lines(content.lines().map(str::to_string)))
    }

    /// Load the pool named by a sample spec.
    pub fn load(spec: &SampleSpec) -> Result<Self, LoadError> {
        match &spec.file {
            Some(path) => Self::from_file(path),
            None => Ok(Self::from_lines(spec.lines.iter().cloned())),
        }
    }

    pub fn records(&self) -> &[CandidateRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Total byte length of one full pass over the pool.
    pub fn total_bytes(&self) -> usize {
        self.records.iter().map(|r| r.bytes).sum()
    }

    /// Byte length of the first record, the representative size used by
    /// the leftover-budget check.
    pub fn first_record_size(&self) -> Option<usize> {
        self.records.first().map(|r| r.bytes)
    }
}

/// A configured sample plus its loaded candidate pool.
#[derive(Debug, Clone)]
pub struct Sample {
    spec: SampleSpec,
    earliest_offset: Duration,
    latest_offset: Duration,
    pool: Arc<CandidatePool>,
}

impl Sample {
    /// Build a runtime sample from its spec.
    ///
    /// Window offsets must parse; a candidate pool load failure is logged
    /// and left for per-round reload, it does not fail construction.
    pub fn from_spec(spec: SampleSpec) -> Result<Self, SampleError> {
        let earliest_offset = match &spec.earliest {
            Some(s) => parse_offset(s).map_err(|source| SampleError::Offset {
                sample: spec.name.clone(),
                field: "earliest",
                source,
            })?,
            None => -Duration::seconds(spec.interval as i64),
        };
        let latest_offset = match &spec.latest {
            Some(s) => parse_offset(s).map_err(|source| SampleError::Offset {
                sample: spec.name.clone(),
                field: "latest",
                source,
            })?,
            None => Duration::zero(),
        };

        let mut sample = Self {
            spec,
            earliest_offset,
            latest_offset,
            pool: Arc::new(CandidatePool::default()),
        };
        if let Err(err) = sample.reload() {
            warn!(sample = %sample.spec.name, error = %err, "initial sample load failed; will retry per round");
        }
        Ok(sample)
    }

    /// Re-load the candidate pool from the sample's source.
    pub fn reload(&mut self) -> Result<(), LoadError> {
        self.pool = Arc::new(CandidatePool::load(&self.spec)?);
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn interval(&self) -> u64 {
        self.spec.interval
    }

    pub fn delay(&self) -> u64 {
        self.spec.delay
    }

    pub fn workers(&self) -> usize {
        self.spec.workers
    }

    pub fn mode(&self) -> GenerationMode {
        self.spec.mode
    }

    pub fn tokens(&self) -> &[Token] {
        &self.spec.tokens
    }

    /// Shared handle to the current candidate pool.
    pub fn pool(&self) -> Arc<CandidatePool> {
        Arc::clone(&self.pool)
    }

    pub fn pool_is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    /// Representative record size for the leftover-budget check.
    pub fn representative_record_size(&self) -> Option<usize> {
        self.pool.first_record_size()
    }

    /// Start of the live window for a round at `now`.
    pub fn earliest_time(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + self.earliest_offset
    }

    /// End of the live window for a round at `now`.
    pub fn latest_time(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + self.latest_offset
    }

    pub fn spec(&self) -> &SampleSpec {
        &self.spec
    }
}
