use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use redshift_core::{
    ConfirmedCatalog, MatchKind, MatchResult, PlanetRecord, ReconciliationReport, ReportSummary, find_match,
    reconcile,
};
use redshift_ingest::{
    LikelyPlanet, append_confirmed, load_catalog, load_likely_planets, read_rows, save_candidate,
};
use redshift_verify::{
    BatchVerdict, LightCurveRenderer, NasaImages, Verdict, VerifierClient, sanitize_planet_name,
    select_dataset,
};
use serde::Serialize;
use std::path::{Path, PathBuf};

mod candidate;
mod config;
mod logging;
mod state;

use candidate::{CandidateArgs, load_candidate};
use config::Config;
use logging::{LogConfig, LogFormat};

#[derive(Parser, Debug)]
#[command(
    name = "redshift",
    version,
    long_version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("REDSHIFT_BUILD_SHA"), ")"),
    about = "Check exoplanet candidates against a confirmed-planet catalog"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[arg(long, value_enum, default_value_t = LogFormat::Pretty, global = true)]
    log_format: LogFormat,

    /// Config file (default: $REDSHIFT_HOME/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print confirmed planets
    List {
        #[arg(long, default_value_t = 20)]
        limit: usize,

        #[arg(long)]
        json: bool,
    },

    /// Search confirmed planets by name (case-insensitive substring)
    Search {
        term: String,

        #[arg(long)]
        json: bool,
    },

    /// Check one candidate against the confirmed catalog
    Check {
        #[command(flatten)]
        fields: CandidateArgs,

        /// Read candidate fields from a JSON object (flags override it)
        #[arg(long = "json", value_name = "FILE")]
        json_file: Option<PathBuf>,

        /// On no match, append the candidate to the candidates dataset
        /// (skipped when --add-if-planet adds it to the confirmed dataset)
        #[arg(long)]
        save: bool,

        /// On no match, ask the AI verifier
        #[arg(long)]
        verify: bool,

        /// On no match, verify and add to the confirmed dataset if classified as a planet
        #[arg(long)]
        add_if_planet: bool,
    },

    /// Reconcile an uploaded CSV against the confirmed catalog
    Reconcile {
        upload: PathBuf,

        /// Send unmatched candidates to the AI verifier
        #[arg(long)]
        verify: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the ranked most-likely planets export
    Top10 {
        #[arg(long, default_value_t = 10)]
        limit: usize,

        #[arg(long)]
        json: bool,
    },

    /// Append a planet to the confirmed dataset
    Add {
        #[command(flatten)]
        fields: CandidateArgs,

        #[arg(long = "json", value_name = "FILE")]
        json_file: Option<PathBuf>,
    },

    /// Render a light curve through the external plotting script
    Lightcurve {
        planet: String,

        /// Output image (default: ./<planet>_curve.png)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Dataset to plot from (default: candidates, else confirmed)
        #[arg(long)]
        dataset: Option<PathBuf>,
    },

    /// Look up a NASA image
    Image { query: String },

    /// Config file management
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write the default config unless one exists
    Init,
    /// Print the effective config
    Show,
}

/// JSON shape of `reconcile --json`.
#[derive(Debug, Serialize)]
struct ReconcileOutput<'a> {
    generated_at: DateTime<Utc>,
    upload: &'a Path,
    summary: ReportSummary,
    #[serde(flatten)]
    report: &'a ReconciliationReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    predictions: Option<&'a [BatchVerdict]>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(&LogConfig::from_verbosity(cli.verbose).with_format(cli.log_format));

    let cfg = config::load_config(cli.config.as_deref())?;

    match cli.command {
        Command::List { limit, json } => {
            let catalog = load_catalog(&cfg.data.confirmed_csv)?;
            let shown: Vec<&PlanetRecord> = catalog.iter().take(limit).collect();
            if json {
                println!("{}", serde_json::to_string_pretty(&shown)?);
            } else {
                println!(
                    "{} confirmed planets in {} (showing {})\n",
                    catalog.len(),
                    cfg.data.confirmed_csv.display(),
                    shown.len()
                );
                for r in shown {
                    println!("- {}", summary_line(r));
                }
            }
        }

        Command::Search { term, json } => {
            let catalog = load_catalog(&cfg.data.confirmed_csv)?;
            let hits = catalog.search_by_name(&term);
            if json {
                println!("{}", serde_json::to_string_pretty(&hits)?);
            } else if hits.is_empty() {
                println!("No confirmed planets matching {term:?}");
            } else {
                println!("{} match(es) for {term:?}\n", hits.len());
                for r in hits {
                    println!("- {}", summary_line(r));
                }
            }
        }

        Command::Check {
            fields,
            json_file,
            save,
            verify,
            add_if_planet,
        } => {
            let candidate = load_candidate(json_file.as_deref(), fields)?;
            if candidate == PlanetRecord::default() {
                bail!("no candidate fields given (pass --name/--ra/--dec/--period/--radius or --json <file>)");
            }
            let catalog = load_catalog(&cfg.data.confirmed_csv)?;
            check_candidate(&cfg, &catalog, candidate, save, verify || add_if_planet, add_if_planet)
                .await?;
        }

        Command::Reconcile {
            upload,
            verify,
            json,
        } => {
            let catalog = load_catalog(&cfg.data.confirmed_csv)?;
            let rows = read_rows(&upload).with_context(|| format!("reading upload {}", upload.display()))?;
            let report = reconcile(&rows, &catalog);

            let predictions = if verify {
                Some(verifier(&cfg)?.batch_verify(&report.unmatched).await?)
            } else {
                None
            };

            if json {
                let out = ReconcileOutput {
                    generated_at: Utc::now(),
                    upload: &upload,
                    summary: report.summary(),
                    report: &report,
                    predictions: predictions.as_deref(),
                };
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                print_report(&report, predictions.as_deref(), &cfg.verifier.planet_labels);
            }
        }

        Command::Top10 { limit, json } => {
            let planets = load_likely_planets(&cfg.data.top10_csv)?;
            let shown = &planets[..planets.len().min(limit)];
            if json {
                println!("{}", serde_json::to_string_pretty(shown)?);
            } else if shown.is_empty() {
                println!("No likely planets found in {}", cfg.data.top10_csv.display());
            } else {
                println!("Top {} likely planets\n", shown.len());
                for p in shown {
                    println!("{}", likely_line(p));
                }
            }
        }

        Command::Add { fields, json_file } => {
            let record = load_candidate(json_file.as_deref(), fields)?;
            if record.name.is_none() {
                bail!("a planet name is required (pass --name)");
            }
            let catalog = append_confirmed(&cfg.data.confirmed_csv, record)?;
            println!(
                "Added to {} ({} confirmed planets)",
                cfg.data.confirmed_csv.display(),
                catalog.len()
            );
        }

        Command::Lightcurve {
            planet,
            out,
            dataset,
        } => {
            let dataset = match dataset {
                Some(d) => d,
                None => select_dataset(&cfg.data.candidates_csv, &cfg.data.confirmed_csv)?,
            };
            let lc = &cfg.lightcurve;
            let renderer = LightCurveRenderer::new(&lc.program, &lc.script, &lc.output_dir)
                .with_timeout(lc.timeout());
            let bytes = renderer.render(&dataset, &planet).await?;

            let out = out.unwrap_or_else(|| {
                PathBuf::from(format!("{}_curve.png", sanitize_planet_name(&planet)))
            });
            std::fs::write(&out, &bytes).with_context(|| format!("write {}", out.display()))?;
            println!("Wrote {} ({} bytes)", out.display(), bytes.len());
        }

        Command::Image { query } => {
            let nasa = NasaImages::new(&cfg.nasa.base_url);
            match nasa.first_image(&query).await? {
                Some(hit) => {
                    println!("{}", hit.title);
                    println!("{}", hit.image_url);
                    println!("nasa_id: {}", hit.nasa_id);
                    if !hit.description.trim().is_empty() {
                        println!("\n{}", hit.description.trim());
                    }
                }
                None => println!("No image found for {query:?}"),
            }
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config(cli.config.as_deref())?,
            ConfigCommand::Show => {
                print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
            }
        },
    }

    Ok(())
}

fn verifier(cfg: &Config) -> Result<VerifierClient> {
    Ok(
        VerifierClient::new(&cfg.verifier.base_url, cfg.verifier.timeout())?
            .with_planet_labels(cfg.verifier.planet_labels.clone()),
    )
}

async fn check_candidate(
    cfg: &Config,
    catalog: &ConfirmedCatalog,
    candidate: PlanetRecord,
    save: bool,
    verify: bool,
    add_if_planet: bool,
) -> Result<()> {
    match find_match(&candidate, catalog) {
        MatchResult::ExactName(r) => {
            println!("Already confirmed: {}", summary_line(r));
            return Ok(());
        }
        MatchResult::Similar { record, basis } => {
            println!(
                "Similar to confirmed planet (by {}): {}",
                MatchKind::from(basis).label(),
                summary_line(record)
            );
            return Ok(());
        }
        MatchResult::NoMatch => {
            println!("No match for {} in {} confirmed planets", candidate.display_name(), catalog.len());
        }
    }

    let verdict = if verify {
        match verifier(cfg)?.verify(&candidate).await {
            Ok(v) => {
                println!(
                    "AI verdict: {} (confidence {:.1}%)",
                    v.predicted_class,
                    v.confidence * 100.0
                );
                for (class, p) in &v.probabilities {
                    println!("  {class}: {:.1}%", p * 100.0);
                }
                Some(v)
            }
            Err(e) => {
                // keep the candidate even though verification failed
                persist_unmatched(cfg, candidate, save, false, None)?;
                return Err(e);
            }
        }
    } else {
        None
    };

    persist_unmatched(cfg, candidate, save, add_if_planet, verdict.as_ref())?;
    Ok(())
}

/// Where an unmatched candidate ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Persisted {
    Confirmed,
    Candidate,
    Nowhere,
}

/// Store an unmatched candidate: confirmed when verified as a planet and
/// `add_if_planet` is set, otherwise the candidates dataset when `save` is set.
fn persist_unmatched(
    cfg: &Config,
    candidate: PlanetRecord,
    save: bool,
    add_if_planet: bool,
    verdict: Option<&Verdict>,
) -> Result<Persisted> {
    let is_planet = verdict.is_some_and(|v| v.is_planet);

    if add_if_planet && verdict.is_some() && !is_planet {
        println!("Not classified as a planet; confirmed dataset unchanged");
    }

    if add_if_planet && is_planet {
        if candidate.name.is_some() {
            let catalog = append_confirmed(&cfg.data.confirmed_csv, candidate)?;
            println!(
                "Added to {} ({} confirmed planets)",
                cfg.data.confirmed_csv.display(),
                catalog.len()
            );
            return Ok(Persisted::Confirmed);
        }
        if save {
            save_candidate(&cfg.data.candidates_csv, &candidate)?;
            println!("Saved candidate to {}", cfg.data.candidates_csv.display());
        }
        bail!("classified as a planet but the candidate has no name; pass --name to add it");
    }

    if save {
        save_candidate(&cfg.data.candidates_csv, &candidate)?;
        println!("Saved candidate to {}", cfg.data.candidates_csv.display());
        return Ok(Persisted::Candidate);
    }
    Ok(Persisted::Nowhere)
}

fn print_report(report: &ReconciliationReport, predictions: Option<&[BatchVerdict]>, labels: &[String]) {
    let s = report.summary();
    println!(
        "Reconciled {} candidates: {} already confirmed, {} new\n",
        s.total, s.matched, s.new_candidates
    );

    if !report.matched.is_empty() {
        println!("## Already confirmed\n");
        for m in &report.matched {
            println!(
                "- {} -> {} [{}]",
                m.candidate.display_name(),
                m.matched.display_name(),
                m.kind.label()
            );
        }
        println!();
    }

    if !report.unmatched.is_empty() {
        println!("## New candidates\n");
        for (i, r) in report.unmatched.iter().enumerate() {
            match predictions.and_then(|p| p.get(i)) {
                Some(v) => println!(
                    "- {} | {} ({:.1}%) | planet probability {}",
                    summary_line(r),
                    v.predicted_class,
                    v.confidence * 100.0,
                    fmt_pct(v.is_planet_probability(labels))
                ),
                None => println!("- {}", summary_line(r)),
            }
        }
    }
}

fn fmt_num(v: Option<f64>) -> String {
    v.map(|x| format!("{x}")).unwrap_or_else(|| "-".to_string())
}

fn fmt_pct(v: Option<f64>) -> String {
    v.map(|x| format!("{:.1}%", x * 100.0))
        .unwrap_or_else(|| "-".to_string())
}

fn likely_line(p: &LikelyPlanet) -> String {
    let r = &p.record;
    format!(
        "#{} {} | likelihood {} | period={}d radius={}Re teq={}K depth={}ppm star={}K",
        p.rank,
        r.display_name(),
        p.likelihood
            .map(|l| format!("{l}%"))
            .unwrap_or_else(|| "N/A".to_string()),
        fmt_num(r.orbital_period_days),
        fmt_num(r.planet_radius_earth),
        fmt_num(r.equilibrium_temp_k),
        fmt_num(r.transit_depth_ppm),
        fmt_num(r.stellar_temp_k)
    )
}

fn summary_line(r: &PlanetRecord) -> String {
    format!(
        "{} | ra={} dec={} | period={}d radius={}Re | {}",
        r.display_name(),
        fmt_num(r.right_ascension),
        fmt_num(r.declination),
        fmt_num(r.orbital_period_days),
        fmt_num(r.planet_radius_earth),
        r.disposition.as_deref().unwrap_or("-")
    )
}
