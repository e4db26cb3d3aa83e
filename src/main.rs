use clap::Parser;
use fellow_attendance::{ai_provider::AiProvider, analyzer, cli, config, console, error, export, mail};
use fellow_attendance_common::{reconcile, Roster, WeeklySchedule};
use analyzer::{Classifier, ExcuseCache};
use cli::{Cli, Commands, ExportFormat, RangeArgs};
use config::Config;
use error::Result;
use mail::{GmailAuth, GmailClient};
use simplelog::{ColorChoice, LevelFilter, TermLogger, TerminalMode};
use std::path::{Path, PathBuf};
use std::time::Duration;

fn init_logging(verbose: bool) {
    let level = if verbose { LevelFilter::Debug } else { LevelFilter::Warn };
    // 二重初期化は無視してよい
    let _ = TermLogger::init(
        level,
        simplelog::Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = Config::load()?;
    let config_dir = config.resolve_config_dir(cli.config_dir.as_deref());

    match cli.command {
        Commands::Check { range, output, format, analyze_excuses, use_cache } => {
            let options = CheckOptions {
                output,
                format,
                analyze_excuses,
                use_cache,
            };
            let ctx = CheckContext {
                config: &config,
                config_dir: &config_dir,
                provider: cli.ai_provider,
                verbose: cli.verbose,
            };
            run_check(&ctx, &range, options).await?;
        }

        Commands::Expected { range } => {
            let schedule = WeeklySchedule::load(&config_dir)?;
            let date_range = range.date_range(chrono::Local::now().date_naive());
            let expected = schedule.expand(
                &range.week,
                date_range.start,
                date_range.end,
                &range.days_off(),
            )?;

            print!("{}", console::render_header(&range.week, &date_range, &range.days_off()));
            println!();
            if expected.is_empty() {
                println!("No sessions in the given date range (or all days are off).");
            } else {
                print!("{}", console::render_expected(&expected));
            }
        }

        Commands::Config { set_api_key, set_inbox, set_config_dir, show } => {
            let mut config = config;

            if let Some(key) = set_api_key {
                config.set_api_key(key)?;
                println!("✔ API key saved");
            }

            if let Some(inbox) = set_inbox {
                config.inbox_address = inbox;
                config.save()?;
                println!("✔ Inbox set to {}", config.inbox_address);
            }

            if let Some(dir) = set_config_dir {
                config.config_dir = Some(dir);
                config.save()?;
                println!("✔ Config directory saved");
            }

            if show {
                println!("Settings ({}):", Config::config_path()?.display());
                println!("  Model: {}", config.model);
                println!("  Inbox: {}", config.inbox_address);
                println!("  Config dir: {}", config.resolve_config_dir(None).display());
                println!("  Timeout: {}s", config.timeout_seconds);
                println!(
                    "  API key: {}",
                    if config.get_api_key().is_ok() { "set" } else { "not set" }
                );
            }
        }

        Commands::Cache { clear, info } => {
            let cache_path = ExcuseCache::cache_path(&config_dir);

            if info || !clear {
                if cache_path.exists() {
                    let cache = ExcuseCache::load(&config_dir);
                    println!("Cache: {}", cache_path.display());
                    println!("  Entries: {}", cache.len());
                } else {
                    println!("No cache: {}", cache_path.display());
                }
            }

            if clear {
                if ExcuseCache::clear(&config_dir)? {
                    println!("✔ Cache cleared: {}", cache_path.display());
                } else {
                    println!("No cache to clear");
                }
            }
        }
    }

    Ok(())
}

struct CheckContext<'a> {
    config: &'a Config,
    config_dir: &'a Path,
    provider: AiProvider,
    verbose: bool,
}

struct CheckOptions {
    output: Option<PathBuf>,
    format: Option<ExportFormat>,
    analyze_excuses: bool,
    use_cache: bool,
}

async fn run_check(ctx: &CheckContext<'_>, range: &RangeArgs, options: CheckOptions) -> Result<()> {
    let schedule = WeeklySchedule::load(ctx.config_dir)?;
    let roster = Roster::load(ctx.config_dir)?;
    let date_range = range.date_range(chrono::Local::now().date_naive());
    let days_off = range.days_off();

    let expected = schedule.expand(&range.week, date_range.start, date_range.end, &days_off)?;
    if expected.is_empty() {
        println!("No sessions in the given date range (or all days are off).");
        return Ok(());
    }

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(ctx.config.timeout_seconds))
        .build()?;

    let auth = GmailAuth::load(ctx.config_dir, http.clone())?;
    let token = auth.access_token().await?;
    let gmail = GmailClient::new(http.clone(), token, ctx.config.inbox_address.clone());

    let mut dates: Vec<_> = expected.iter().map(|e| e.date).collect();
    dates.dedup();

    let progress = mail::fetch_progress_bar(dates.len());
    let snapshot = mail::collect_senders(&gmail, &dates, &progress).await?;

    let records = reconcile(&expected, &snapshot.photo_senders, &roster);

    print!("{}", console::render_header(&range.week, &date_range, &days_off));
    println!();
    print!("{}", console::render_records(&records));
    println!();
    print!("{}", console::render_summary(&records));

    if snapshot.has_no_photo_senders() {
        println!();
        print!("{}", console::render_excuse_senders(&snapshot.no_photo_senders));

        if options.analyze_excuses {
            log::info!("analyzing excuse emails with {}", ctx.provider.name());
            let classifier = Classifier::from_config(ctx.provider, ctx.config, http, ctx.verbose);
            let mut cache = options
                .use_cache
                .then(|| ExcuseCache::load(ctx.config_dir));

            let reports =
                analyzer::analyze_excuses(&gmail, &classifier, &dates, cache.as_mut()).await?;

            if let Some(cache) = &cache {
                cache.save(ctx.config_dir)?;
            }

            println!();
            print!("{}", console::render_excuse_analyses(&reports));
        }
    }

    if let Some(output) = options.output {
        let sheet_name = format!("{} {}", range.week, date_range.start);
        let written = export::export_records(&records, &output, options.format, &sheet_name)?;
        println!("\nReport written to {}", written.display());
    }

    Ok(())
}
