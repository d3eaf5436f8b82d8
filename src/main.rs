use anyhow::{Context, bail};

use email_triage::batch;
use email_triage::channels::{read_eml, read_text};
use email_triage::config::TriageConfig;
use email_triage::pipeline::ReplyPipeline;
use email_triage::pipeline::types::{DraftOptions, Email, UrgencyLabel};

const USAGE: &str = "\
Usage:
  email-triage                         read `Subject: ...` + body from stdin
  email-triage eml <file.eml>          triage a single RFC 822 message
  email-triage batch <in.csv> [out.csv] triage every row (subject, body)";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider before any TLS usage. Already installed is fine.
    let _ = rustls::crypto::ring::default_provider().install_default();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = TriageConfig::from_env()?;
    let pipeline = ReplyPipeline::from_config(&config)?;
    let options = config.draft_options();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        None => {
            let email = read_text(std::io::stdin().lock()).context("reading stdin")?;
            run_single(&pipeline, &email, &options).await
        }
        Some("eml") => {
            let path = args.get(1).context(USAGE)?;
            let email = read_eml(path).with_context(|| format!("reading {path}"))?;
            run_single(&pipeline, &email, &options).await
        }
        Some("batch") => {
            let input = args.get(1).context(USAGE)?;
            let output = args.get(2).map(String::as_str).unwrap_or("results.csv");
            run_batch(&pipeline, &config, input, output).await
        }
        Some("-h" | "--help" | "help") => {
            eprintln!("{USAGE}");
            Ok(())
        }
        Some(other) => bail!("unknown command '{other}'\n\n{USAGE}"),
    }
}

async fn run_single(
    pipeline: &ReplyPipeline,
    email: &Email,
    options: &DraftOptions,
) -> anyhow::Result<()> {
    let outcome = pipeline.run(email, options).await?;

    let scores = UrgencyLabel::ALL
        .iter()
        .map(|label| format!("{label}={:.2}", outcome.scores.get(*label)))
        .collect::<Vec<_>>()
        .join(" ");
    eprintln!("Urgency: {} ({scores})", outcome.label);
    eprintln!("Intent:  {}", outcome.intent);
    eprintln!("Source:  {}", outcome.source);
    eprintln!();

    println!("{}", outcome.reply);
    Ok(())
}

async fn run_batch(
    pipeline: &ReplyPipeline,
    config: &TriageConfig,
    input: &str,
    output: &str,
) -> anyhow::Result<()> {
    let emails = batch::read_emails_from_path(input)?;
    let rows = batch::process_batch(
        pipeline,
        emails,
        &config.draft_options(),
        config.batch_concurrency,
    )
    .await;
    batch::write_results_to_path(output, &rows)?;

    let failed = rows.iter().filter(|r| r.outcome.is_err()).count();
    eprintln!(
        "Processed {} email(s), {failed} failed. Results written to {output}",
        rows.len()
    );
    Ok(())
}
