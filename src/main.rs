use clap::Parser;
use elscan::cli::{Cli, Commands};
use elscan::{commands, gematria, hebrew};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "elscan=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Scan progress on stderr; hidden for JSON output and non-terminals.
fn progress_bar(hidden: bool) -> ProgressBar {
    if hidden {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(0);
    if let Ok(style) =
        ProgressStyle::with_template("{spinner:.cyan} {prefix} [{bar:40.cyan/dim}] {percent}% {msg}")
    {
        bar.set_style(style.progress_chars("━━╸"));
    }
    bar.set_prefix("Scanning");
    bar
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Search {
            term,
            search,
            sort,
            order,
            limit,
            json,
        }) => {
            let bar = progress_bar(json);
            let outcome = commands::search(&term, &search, sort, order, &mut |progress| {
                bar.set_length(progress.total_positions);
                bar.set_position(progress.positions_scanned);
                bar.set_message(format!("{} ms", progress.elapsed_ms));
            });
            bar.finish_and_clear();
            let set = outcome?;

            if json {
                println!("{}", set.to_json()?);
                return Ok(());
            }

            println!("{}", commands::format_summary(&set));
            for result in set.results().iter().take(limit) {
                println!("  {}", commands::format_result(result));
            }
            if set.len() > limit {
                println!("  ... {} more (raise --limit)", set.len() - limit);
            }
            Ok(())
        }
        Some(Commands::Crossings {
            first,
            second,
            search,
            limit,
            json,
        }) => {
            let crossings = commands::crossings(&first, &second, &search)?;
            let intersections = crossings.intersections();

            if json {
                return print_json(&intersections);
            }

            println!(
                "{} crossing(s) between {} '{}' and {} '{}' sequence(s)",
                intersections.len(),
                crossings.first.len(),
                crossings.first.search_term(),
                crossings.second.len(),
                crossings.second.search_term(),
            );
            for intersection in intersections.iter().take(limit) {
                println!("  {}", commands::format_intersection(intersection));
            }
            if intersections.len() > limit {
                println!("  ... {} more (raise --limit)", intersections.len() - limit);
            }
            Ok(())
        }
        Some(Commands::Gematria { text, json }) => {
            let report = commands::gematria(&text)?;
            let analysis = gematria::analyze(report.standard);

            if json {
                return print_json(&serde_json::json!({
                    "gematria": report,
                    "analysis": analysis,
                }));
            }

            println!("{report}");
            println!("{}", commands::format_analysis(&analysis));
            Ok(())
        }
        Some(Commands::Analyze { value, json }) => {
            let analysis = gematria::analyze(value);
            if json {
                return print_json(&analysis);
            }
            println!("{}", commands::format_analysis(&analysis));
            Ok(())
        }
        Some(Commands::Validate { term }) => {
            let normalized = hebrew::validate_search_term(&term)?;
            println!(
                "Valid: {normalized} ({} letters)",
                normalized.chars().count()
            );
            Ok(())
        }
        Some(Commands::Stats { source, json }) => {
            let stats = commands::stats(&source)?;
            if json {
                return print_json(&stats);
            }

            let s = &stats.statistics;
            println!("Source: {}", stats.source);
            println!("Letters: {}", s.total_letters);
            println!("Unique letters: {}", s.unique_letters);
            println!("Average word length: {:.2}", s.average_word_length);
            println!("Frequency:");
            for (letter, count) in &s.letter_frequency {
                println!("  {letter} {count}");
            }
            Ok(())
        }
        Some(Commands::Sources) => {
            for source in commands::sources()? {
                let missing = if source.available { "" } else { " (missing)" };
                println!("{:<12} {}{missing}", source.id, source.name);
            }
            Ok(())
        }
        #[cfg(feature = "mcp")]
        Some(Commands::Serve) => tokio::runtime::Runtime::new()?.block_on(elscan::mcp::serve()),
        None => {
            Cli::parse_from(["elscan", "--help"]);
            Ok(())
        }
    }
}
