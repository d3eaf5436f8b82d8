//! Batch mode against real files.

use std::io::Write;

use email_triage::ReplyPipeline;
use email_triage::batch::{
    RESULT_COLUMNS, process_batch, read_emails_from_path, write_results_to_path,
};
use email_triage::error::BatchError;
use email_triage::pipeline::types::DraftOptions;

#[tokio::test]
async fn csv_in_csv_out() {
    let mut input = tempfile::NamedTempFile::new().unwrap();
    write!(
        input,
        "Subject,Body,From\n\
         Payment failure,\"Checkout fails with an error. We need a fix today.\",a@example.com\n\
         Monthly newsletter,\"FYI, no action needed.\",b@example.com\n\
         Question,\"Could you send the invoice?\",c@example.com\n"
    )
    .unwrap();

    let emails = read_emails_from_path(input.path()).unwrap();
    assert_eq!(emails.len(), 3);

    let rows = process_batch(
        &ReplyPipeline::offline(),
        emails,
        &DraftOptions::default().with_sender_name("Sam"),
        3,
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("results.csv");
    write_results_to_path(&output, &rows).unwrap();

    let mut reader = csv::Reader::from_path(&output).unwrap();
    let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
    assert_eq!(headers, RESULT_COLUMNS);

    let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(records.len(), 3);
    assert_eq!(&records[0][0], "Payment failure");
    assert_eq!(&records[0][2], "Urgent");
    assert_eq!(&records[1][2], "Low");
    assert_eq!(&records[2][0], "Question");
    for record in &records {
        assert!(record[8].starts_with("Subject: Re: "));
        assert!(record[8].ends_with("Sam\nSupport"));
        assert_eq!(&record[9], "template");
        assert_eq!(&record[10], "");
    }
}

#[test]
fn missing_column_fails_before_processing() {
    let mut input = tempfile::NamedTempFile::new().unwrap();
    write!(input, "subject,text\nHello,World\n").unwrap();

    let err = read_emails_from_path(input.path()).unwrap_err();
    assert!(matches!(err, BatchError::MissingColumns(ref cols) if cols == &["body"]));
}

#[test]
fn missing_file_is_io_error() {
    let err = read_emails_from_path("/nonexistent/emails.csv").unwrap_err();
    assert!(matches!(err, BatchError::Io(_)));
}
