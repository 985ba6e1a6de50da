use anyhow::Context;
use clap::Parser;
use shop_deck::domain::model::BusinessRecord;
use shop_deck::utils::error::ErrorSeverity;
use shop_deck::utils::prompt::{choose_run_mode, PromptOutcome};
use shop_deck::utils::{logger, validation::Validate};
use shop_deck::{
    CliConfig, ConsoleProgress, DeckEngine, DeckError, FileImageProbe, LogFormat, PptxDocument,
    RunSummary,
};
use std::io;

fn main() {
    let cli = CliConfig::parse();

    // 初始化日誌
    match cli.log_format {
        LogFormat::Compact => logger::init_cli_logger(cli.verbose),
        LogFormat::Json => logger::init_json_logger(cli.verbose),
    }

    tracing::info!("Starting shop-deck");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    if let Err(e) = run(&cli) {
        let Some(deck_error) = e.downcast_ref::<DeckError>() else {
            tracing::error!("❌ {:#}", e);
            eprintln!("❌ {:#}", e);
            std::process::exit(1);
        };

        if matches!(deck_error, DeckError::Cancelled) {
            println!("Cancelled, no presentation was written.");
            return;
        }

        // 記錄詳細錯誤信息
        tracing::error!(
            "❌ Run failed: {} (Category: {:?}, Severity: {:?})",
            deck_error,
            deck_error.category(),
            deck_error.severity()
        );
        eprintln!("❌ {}", deck_error.user_friendly_message());
        eprintln!("💡 Suggestion: {}", deck_error.recovery_suggestion());

        // 根據錯誤嚴重程度決定退出碼
        let exit_code = match deck_error.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }
}

fn run(cli: &CliConfig) -> anyhow::Result<()> {
    // 載入並驗證配置
    let config = cli.load_config()?;
    config.validate()?;

    // 模板必須在掃描之前開啟
    let mut doc = PptxDocument::open(&config.paths.template, config.layout.slide_layout_index)?;

    let mut console = ConsoleProgress::stdout();
    let mut engine = DeckEngine::new(&config, FileImageProbe);
    let businesses = engine.prepare(&mut console)?;

    if cli.dry_run {
        print_order(&businesses);
        return Ok(());
    }

    let mode = match cli.run_mode() {
        Some(mode) => mode,
        None => {
            let stdin = io::stdin();
            let outcome = choose_run_mode(
                &mut stdin.lock(),
                &mut io::stdout(),
                config.run.sample_size,
                businesses.len(),
            )
            .context("failed to read the run mode from stdin")?;
            match outcome {
                PromptOutcome::Proceed(mode) => mode,
                PromptOutcome::Cancelled => return Err(DeckError::Cancelled.into()),
            }
        }
    };
    tracing::info!("Run mode: {:?}", mode);

    let summary = engine.emit(&businesses, mode, &mut doc, &mut console)?;
    print_summary(&summary);
    Ok(())
}

fn print_order(businesses: &[BusinessRecord]) {
    println!("\nDry run: {} businesses in order", businesses.len());
    for (index, business) in businesses.iter().enumerate() {
        println!(
            "{:>4}. {} (capture: {}, price: {}, images: {})",
            index + 1,
            business.name,
            if business.venue_capture.is_some() { "yes" } else { "no" },
            business.price_images.len(),
            business.interior_images.len()
        );
    }
}

fn print_summary(summary: &RunSummary) {
    match &summary.output_path {
        Some(path) => {
            println!("\n✅ Presentation generated!");
            println!("📁 Output: {}", path.display());
        }
        None => println!("\n⚠️ No businesses found, nothing was written."),
    }
    println!(
        "📊 {} of {} businesses, {} slides, {} pictures, {} warnings ({:.1?})",
        summary.businesses_emitted,
        summary.businesses_found,
        summary.slides_added,
        summary.pictures_placed,
        summary.warnings,
        summary.elapsed
    );
}
