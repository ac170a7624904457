// sink/src/lines.rs

//! Non-SQL sink kinds: `stdout`, `file`, and `null`. All three serialize
//! each non-empty table in a `RowSet` as one JSON line (`{"table": ..,
//! "rows": [..]}`), for piping into `jq` or a log aggregator. `null`
//! discards rows entirely and exists for throughput benchmarking and
//! dry-run validation of the fetch/decode/assemble path. None of the three
//! persists `last_height` across a restart — only `postgres` supports
//! durable resume.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use types::RowSet;

use crate::{Sink, SinkError};

enum Target {
    Stdout,
    File(Mutex<BufWriter<File>>),
    Null,
}

pub struct LineSink {
    target: Target,
    flush_every: u64,
    writes_since_flush: AtomicU64,
}

impl LineSink {
    pub fn stdout() -> Self {
        LineSink {
            target: Target::Stdout,
            flush_every: 1,
            writes_since_flush: AtomicU64::new(0),
        }
    }

    pub fn null() -> Self {
        LineSink {
            target: Target::Null,
            flush_every: u64::MAX,
            writes_since_flush: AtomicU64::new(0),
        }
    }

    pub fn file(path: PathBuf, flush_every: u64) -> Result<Self, SinkError> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(LineSink {
            target: Target::File(Mutex::new(BufWriter::new(file))),
            flush_every: flush_every.max(1),
            writes_since_flush: AtomicU64::new(0),
        })
    }

    fn write_lines(&self, lines: &[String]) -> Result<(), SinkError> {
        match &self.target {
            Target::Null => Ok(()),
            Target::Stdout => {
                let stdout = io::stdout();
                let mut handle = stdout.lock();
                for line in lines {
                    writeln!(handle, "{line}")?;
                }
                Ok(())
            }
            Target::File(writer) => {
                let mut writer = writer.lock().expect("line sink writer poisoned");
                for line in lines {
                    writeln!(writer, "{line}")?;
                }
                Ok(())
            }
        }
    }

    fn flush_target(&self) -> Result<(), SinkError> {
        match &self.target {
            Target::Null => Ok(()),
            Target::Stdout => Ok(io::stdout().flush()?),
            Target::File(writer) => {
                let mut writer = writer.lock().expect("line sink writer poisoned");
                Ok(writer.flush()?)
            }
        }
    }
}

/// One `(table name, serialized rows)` entry per non-empty vector in `rows`.
fn table_lines(rows: &RowSet) -> Result<Vec<String>, serde_json::Error> {
    let mut out = Vec::new();
    macro_rules! push_table {
        ($name:literal, $field:ident) => {
            if !rows.$field.is_empty() {
                let line = serde_json::json!({ "table": $name, "rows": &rows.$field });
                out.push(serde_json::to_string(&line)?);
            }
        };
    }
    push_table!("blocks", blocks);
    push_table!("transactions", transactions);
    push_table!("messages", messages);
    push_table!("events", events);
    push_table!("event_attrs", event_attrs);
    push_table!("transfers", transfers);
    push_table!("stake_delegation_events", stake_delegation_events);
    push_table!("stake_distribution_events", stake_distribution_events);
    push_table!("wasm_executions", wasm_executions);
    push_table!("wasm_events", wasm_events);
    push_table!("gov_deposits", gov_deposits);
    push_table!("gov_votes", gov_votes);
    push_table!("gov_proposals", gov_proposals);
    Ok(out)
}

#[async_trait]
impl Sink for LineSink {
    async fn write(&self, rows: RowSet) -> Result<(), SinkError> {
        if rows.is_empty() {
            return Ok(());
        }
        let lines = table_lines(&rows)?;
        self.write_lines(&lines)?;

        let n = self.writes_since_flush.fetch_add(1, Ordering::Relaxed) + 1;
        if n >= self.flush_every {
            self.writes_since_flush.store(0, Ordering::Relaxed);
            self.flush_target()?;
        }
        Ok(())
    }

    async fn flush(&self) -> Result<(), SinkError> {
        self.flush_target()
    }

    async fn close(&self) -> Result<(), SinkError> {
        self.flush_target()
    }

    async fn resume_height(&self) -> Result<Option<u64>, SinkError> {
        Ok(None)
    }
}
