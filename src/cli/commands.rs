//! CLI command definitions and handlers

use clap::Subcommand;
use std::path::PathBuf;
use std::sync::Arc;

use crate::core::cancel::CancelToken;
use crate::core::client::GoogleTranslateService;
use crate::core::config::TranslatorConfig;
use crate::core::languages::{language_name, resolve_language, COMMON_LANGUAGES};
use crate::core::progress::{EventLevel, ProgressEvent, ProgressSink};
use crate::processors::batch::BatchTranslator;
use crate::processors::discovery::TargetDiscovery;

/// Commands for RimWorld Translator
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Translate every localization file under a mod directory in place
    Translate {
        /// Mod directory (required)
        #[arg(short, long)]
        dir: PathBuf,

        /// Source language, as a code or English name (default: english)
        #[arg(short, long, default_value = "english")]
        source: String,

        /// Target language, as a code or English name (default: korean)
        #[arg(short, long, default_value = "korean")]
        target: String,
    },

    /// List the files a translation run would touch
    Scan {
        /// Mod directory (required)
        #[arg(short, long)]
        dir: PathBuf,
    },

    /// List common language names and codes
    Languages,
}

/// Handle translate command
pub async fn handle_translate(
    dir: PathBuf,
    source: String,
    target: String,
    config: TranslatorConfig,
) -> anyhow::Result<()> {
    use indicatif::{ProgressBar, ProgressStyle};
    use std::time::Instant;
    use tracing::info;

    let start_time = Instant::now();

    let src = resolve_language(&source)?;
    let dest = resolve_language(&target)?;

    info!("Starting mod translation");
    info!("Directory: {}", dir.display());
    info!("Languages: {} -> {}", src, dest);
    info!("Workers: {}", config.max_workers);

    let service = Arc::new(GoogleTranslateService::new(&config)?);
    let (sink, mut events) = ProgressSink::channel();
    let batch = BatchTranslator::from_config(&config, service, sink);

    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                match on_interrupt(&cancel) {
                    Interrupt::Cancel => tracing::warn!(
                        "Interrupted, finishing files in progress (Ctrl-C again to quit now)"
                    ),
                    Interrupt::ForceExit => {
                        eprintln!("\nInterrupted twice, exiting");
                        std::process::exit(130);
                    }
                }
            }
        });
    }

    let run = tokio::spawn(async move { batch.run(&dir, &src, &dest, &cancel).await });

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap(),
    );
    pb.enable_steady_tick(std::time::Duration::from_millis(120));

    while let Some(event) = events.recv().await {
        match event {
            ProgressEvent::Done => break,
            ProgressEvent::Message { level, message, .. } => match level {
                EventLevel::Info => pb.set_message(message),
                EventLevel::Success => pb.println(format!("✅ {}", message)),
                EventLevel::Warning => pb.println(format!("⚠️  {}", message)),
                EventLevel::Error => pb.println(format!("❌ {}", message)),
            },
        }
    }

    pb.finish_and_clear();

    let report = run.await??;
    let duration = start_time.elapsed();

    println!("\n✅ Translation completed!");
    println!("   Files: {}", report.total);
    println!("   Translated: {}", report.succeeded);
    println!("   Failed: {}", report.failed);
    if report.skipped > 0 {
        println!("   Skipped: {}", report.skipped);
    }
    println!("   Time: {:?}", duration);

    for failure in &report.failures {
        eprintln!("   {} - {}", failure.path.display(), failure.message);
    }

    Ok(())
}

/// What a Ctrl-C means at this point of the run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Interrupt {
    /// Stop dispatching and let in-flight files finish
    Cancel,
    /// Already cancelling; the user wants out now
    ForceExit,
}

fn on_interrupt(cancel: &CancelToken) -> Interrupt {
    if cancel.is_cancelled() {
        Interrupt::ForceExit
    } else {
        cancel.cancel();
        Interrupt::Cancel
    }
}

/// Handle scan command
pub fn handle_scan(dir: PathBuf, config: TranslatorConfig) -> anyhow::Result<()> {
    let targets = TargetDiscovery::from_config(&config).discover(&dir, &CancelToken::new())?;

    if targets.is_empty() {
        println!("No translatable files found under {}", dir.display());
        return Ok(());
    }

    for (i, target) in targets.iter().enumerate() {
        println!("{:>4}. {}", i + 1, target);
    }
    println!("\n📝 {} files would be translated", targets.len());

    Ok(())
}

/// Handle languages command
pub fn handle_languages() {
    for code in COMMON_LANGUAGES {
        let name = language_name(code).unwrap_or_default();
        println!("{:<6} {}", code, name);
    }
    println!("\nAny ISO 639-1 code or English language name is accepted.");
}
