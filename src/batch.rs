//! CSV batch mode: read emails, run them through the pipeline, write results.

use std::io;
use std::path::Path;
use std::time::Instant;

use futures::stream::{self, StreamExt};
use tracing::{error, info};

use crate::error::{BatchError, PipelineError};
use crate::pipeline::ReplyPipeline;
use crate::pipeline::types::{DraftOptions, Email, TriageOutcome, UrgencyLabel};

const SUBJECT_COLUMN: &str = "subject";
const BODY_COLUMN: &str = "body";

/// Output columns, in order.
pub const RESULT_COLUMNS: [&str; 11] = [
    "subject",
    "body",
    "urgency",
    "score_urgent",
    "score_normal",
    "score_low",
    "intent_summary",
    "reply_subject",
    "reply_draft",
    "reply_source",
    "error",
];

/// One processed input row.
#[derive(Debug, Clone)]
pub struct BatchRow {
    /// Zero-based position in the input.
    pub index: usize,
    pub email: Email,
    pub outcome: Result<TriageOutcome, PipelineError>,
}

/// Read `subject` and `body` columns. Header names match case-insensitively
/// and other columns are ignored.
///
/// Fails before yielding any row if either column is missing.
pub fn read_emails<R: io::Read>(reader: R) -> Result<Vec<Email>, BatchError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

    let headers = reader.headers()?.clone();
    let position = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim().trim_start_matches('\u{feff}').eq_ignore_ascii_case(name))
    };

    let (subject_idx, body_idx) = match (position(SUBJECT_COLUMN), position(BODY_COLUMN)) {
        (Some(s), Some(b)) => (s, b),
        (s, b) => {
            let mut missing = Vec::new();
            if s.is_none() {
                missing.push(SUBJECT_COLUMN.to_string());
            }
            if b.is_none() {
                missing.push(BODY_COLUMN.to_string());
            }
            return Err(BatchError::MissingColumns(missing));
        }
    };

    let mut emails = Vec::new();
    for record in reader.records() {
        let record = record?;
        emails.push(Email::new(
            record.get(subject_idx).unwrap_or_default(),
            record.get(body_idx).unwrap_or_default(),
        ));
    }
    Ok(emails)
}

pub fn read_emails_from_path(path: impl AsRef<Path>) -> Result<Vec<Email>, BatchError> {
    let file = std::fs::File::open(path)?;
    read_emails(io::BufReader::new(file))
}

/// Process every email with up to `concurrency` runs in flight.
///
/// Results come back in input order. A failed row is recorded and the
/// batch continues.
pub async fn process_batch(
    pipeline: &ReplyPipeline,
    emails: Vec<Email>,
    options: &DraftOptions,
    concurrency: usize,
) -> Vec<BatchRow> {
    let count = emails.len();
    let started = Instant::now();
    info!(count, concurrency, "Processing email batch");

    let rows: Vec<BatchRow> = stream::iter(emails.into_iter().enumerate())
        .map(|(index, email)| async move {
            let outcome = pipeline.run(&email, options).await;
            if let Err(e) = &outcome {
                error!(index, error = %e, "Failed to process email in batch");
            }
            BatchRow {
                index,
                email,
                outcome,
            }
        })
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let failed = rows.iter().filter(|r| r.outcome.is_err()).count();
    info!(
        total = count,
        failed,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Batch processing complete"
    );
    rows
}

/// Write one output record per row, in row order.
pub fn write_results<W: io::Write>(writer: W, rows: &[BatchRow]) -> Result<(), BatchError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(RESULT_COLUMNS)?;

    for row in rows {
        let email = &row.email;
        let record: [String; 11] = match &row.outcome {
            Ok(outcome) => [
                email.subject.clone(),
                email.body.clone(),
                outcome.label.to_string(),
                format_score(outcome.scores.get(UrgencyLabel::Urgent)),
                format_score(outcome.scores.get(UrgencyLabel::Normal)),
                format_score(outcome.scores.get(UrgencyLabel::Low)),
                outcome.intent.clone(),
                outcome.reply_subject.clone(),
                outcome.reply.clone(),
                outcome.source.to_string(),
                String::new(),
            ],
            Err(e) => [
                email.subject.clone(),
                email.body.clone(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                e.to_string(),
            ],
        };
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn write_results_to_path(path: impl AsRef<Path>, rows: &[BatchRow]) -> Result<(), BatchError> {
    let file = std::fs::File::create(path)?;
    write_results(io::BufWriter::new(file), rows)
}

fn format_score(score: f64) -> String {
    format!("{score:.4}")
}
