//! Offline evidence check for a saved transcript
//!
//! Runs the same evidence gate the server uses, without touching storage or a
//! provider, and prints what the engine would decide.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Args;
use learnstyle_core::evidence::{has_sensory_language, is_low_signal};
use learnstyle_core::{GradeBand, follow_up_questions};
use learnstyle_models::{Message, Role};
use serde::Deserialize;
use serde_json::Value;

use crate::config::ConfigLoader;

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// JSON file: a messages array or an assessment request object
    pub file: PathBuf,

    /// Grade band used to pick follow-up questions (K-2, 3-5, 6-8, 9-12)
    #[arg(long)]
    pub grade_band: Option<GradeBand>,

    /// Evidence threshold (defaults to engine.min_evidence from config)
    #[arg(long)]
    pub min_evidence: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranscriptFile {
    messages: Vec<Message>,
    #[serde(default)]
    grade_band: Option<GradeBand>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Classification {
    Evidence,
    LowSignal,
    NotCounted,
}

impl Classification {
    fn label(self) -> &'static str {
        match self {
            Classification::Evidence => "evidence",
            Classification::LowSignal => "low-signal",
            Classification::NotCounted => "not counted",
        }
    }
}

#[derive(Debug)]
struct CheckReport {
    classifications: Vec<Classification>,
    evidence_count: usize,
    min_evidence: usize,
    questions: Vec<String>,
}

impl CheckReport {
    fn is_final(&self) -> bool {
        self.evidence_count >= self.min_evidence
    }
}

pub fn run(args: CheckArgs) -> Result<()> {
    let contents = std::fs::read_to_string(&args.file)
        .with_context(|| format!("reading {}", args.file.display()))?;
    let transcript = parse_transcript(&contents)?;

    let min_evidence = match args.min_evidence {
        Some(n) => n,
        None => ConfigLoader::load()?.engine.min_evidence,
    };
    let band = args.grade_band.or(transcript.grade_band);
    let report = analyze(&transcript.messages, band, min_evidence);

    for (index, (message, class)) in transcript
        .messages
        .iter()
        .zip(&report.classifications)
        .enumerate()
    {
        let sensory = if message.role == Role::User && has_sensory_language(&message.content) {
            " (sensory)"
        } else {
            ""
        };
        println!(
            "[{index}] {:<9} {:<11}{sensory} {}",
            message.role.as_str(),
            class.label(),
            preview(&message.content)
        );
    }

    println!();
    println!(
        "Evidence: {} of {} required",
        report.evidence_count, report.min_evidence
    );
    if report.is_final() {
        println!("Decision: final (the provider would be called)");
    } else {
        println!("Decision: needs_more_data");
        println!("Follow-up questions:");
        for question in &report.questions {
            println!("  - {question}");
        }
    }

    Ok(())
}

fn parse_transcript(contents: &str) -> Result<TranscriptFile> {
    let value: Value = serde_json::from_str(contents).context("transcript is not valid JSON")?;
    let transcript = match value {
        Value::Array(_) => TranscriptFile {
            messages: serde_json::from_value(value).context("invalid messages array")?,
            grade_band: None,
        },
        Value::Object(_) => {
            serde_json::from_value(value).context("expected an object with a messages array")?
        }
        _ => bail!("transcript must be a messages array or an object with messages"),
    };
    Ok(transcript)
}

fn analyze(messages: &[Message], band: Option<GradeBand>, min_evidence: usize) -> CheckReport {
    let classifications: Vec<Classification> = messages
        .iter()
        .map(|m| match m.role {
            Role::User if is_low_signal(&m.content) => Classification::LowSignal,
            Role::User => Classification::Evidence,
            _ => Classification::NotCounted,
        })
        .collect();
    let evidence_count = classifications
        .iter()
        .filter(|c| **c == Classification::Evidence)
        .count();

    let questions = if evidence_count >= min_evidence {
        Vec::new()
    } else {
        follow_up_questions(band, &[])
    };

    CheckReport {
        classifications,
        evidence_count,
        min_evidence,
        questions,
    }
}

fn preview(content: &str) -> String {
    const MAX: usize = 60;
    let line = content.replace('\n', " ");
    if line.chars().count() > MAX {
        let cut: String = line.chars().take(MAX).collect();
        format!("{cut}...")
    } else {
        line
    }
}
