use anyhow::{Context, Result};
use colored::Colorize;
use humansize::{format_size, DECIMAL};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::core::config::{self, parse_duration};
use crate::core::dashboard::{
    effective_concurrency, Dashboard, DashboardResult, EventSink, GenerateOrdering, RunOptions,
    Runner, WriterSink,
};
use crate::core::render::Renderer;

/// Parsed `generate` arguments.
#[derive(Debug, Clone)]
pub struct GenerateArgs {
    pub config: PathBuf,
    pub output: PathBuf,
    pub dry_run: bool,
    pub json: bool,
    pub concurrency: usize,
    pub generate_first: bool,
    pub deadline: Option<Duration>,
    pub verbose: bool,
}

impl GenerateArgs {
    pub fn from_matches(matches: &clap::ArgMatches) -> Result<Self> {
        let deadline = matches
            .get_one::<String>("deadline")
            .map(|text| parse_duration(text).map_err(anyhow::Error::msg))
            .transpose()
            .context("invalid --deadline")?;

        Ok(Self {
            config: matches
                .get_one::<String>("config")
                .map(PathBuf::from)
                .context("config path is required")?,
            output: matches
                .get_one::<String>("output")
                .map(PathBuf::from)
                .context("output path is required")?,
            dry_run: matches.get_flag("dry-run"),
            json: matches.get_flag("json"),
            concurrency: matches.get_one::<usize>("concurrency").copied().unwrap_or(0),
            generate_first: matches.get_flag("generate-first"),
            deadline: deadline.filter(|d| !d.is_zero()),
            verbose: matches.get_flag("verbose"),
        })
    }
}

/// What a completed `generate` run produced.
#[derive(Debug)]
pub struct GenerateSummary {
    pub bytes_written: usize,
    pub slots: usize,
    pub cancelled: bool,
}

pub fn execute(matches: &clap::ArgMatches) -> Result<()> {
    let args = GenerateArgs::from_matches(matches)?;

    let cancel = CancellationToken::new();
    let handler_token = cancel.clone();
    ctrlc::set_handler(move || {
        eprintln!();
        eprintln!("{}", "Cancellation requested, stopping checks...".yellow().bold());
        handler_token.cancel();
    })
    .map_err(|e| anyhow::anyhow!("Failed to set Ctrl+C handler: {}", e))?;

    let Some(summary) = run(&args, cancel)? else {
        return Ok(());
    };

    if summary.cancelled {
        eprintln!(
            "{}",
            "Run was cancelled; unfinished checks show their fallback status.".yellow()
        );
    }
    println!(
        "{} {} slots, wrote {} to {}",
        "✓".green().bold(),
        summary.slots,
        format_size(summary.bytes_written, DECIMAL),
        args.output.display().to_string().cyan()
    );
    Ok(())
}

/// Load, run, render and write. Returns `None` for a dry run.
pub fn run(args: &GenerateArgs, cancel: CancellationToken) -> Result<Option<GenerateSummary>> {
    let dashboard = config::load(&args.config)?;

    if args.verbose {
        eprintln!(
            "loaded config: {} ({} groups, {} theme)",
            args.config.display(),
            dashboard.groups.len(),
            dashboard.theme.as_str()
        );
    }

    if args.dry_run {
        write_plan(&mut io::stderr().lock(), &dashboard, args)?;
        return Ok(None);
    }

    let sink: Option<Arc<dyn EventSink>> = if args.verbose {
        Some(Arc::new(WriterSink::new(io::stderr())))
    } else {
        None
    };
    let runner = Runner::new(RunOptions {
        concurrency: args.concurrency,
        ordering: if args.generate_first {
            GenerateOrdering::BeforeSlots
        } else {
            GenerateOrdering::Concurrent
        },
        deadline: args.deadline,
        sink,
        http_client: None,
    });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("statusboard-worker")
        .build()
        .context("Failed to create tokio runtime")?;

    let base_dir = config_dir(&args.config);
    let (result, page) = runtime.block_on(async {
        let result = runner
            .run(&dashboard, cancel.clone())
            .await
            .context("running checks")?;
        let page = if args.json {
            serde_json::to_string_pretty(&result).context("encoding results")?
        } else {
            Renderer::new(base_dir)?
                .render(&result)
                .await
                .context("rendering")?
        };
        Ok::<(DashboardResult, String), anyhow::Error>((result, page))
    })?;

    fs::write(&args.output, &page)
        .with_context(|| format!("writing output {}", args.output.display()))?;

    Ok(Some(GenerateSummary {
        bytes_written: page.len(),
        slots: result.slots().count(),
        cancelled: cancel.is_cancelled(),
    }))
}

/// Directory relative asset paths are resolved against.
pub fn config_dir(config: &Path) -> PathBuf {
    match config.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Describe what a run would do without executing anything.
pub fn write_plan<W: Write>(out: &mut W, dashboard: &Dashboard, args: &GenerateArgs) -> io::Result<()> {
    writeln!(
        out,
        "Dashboard: {} (theme: {})",
        dashboard.title,
        dashboard.theme.as_str()
    )?;
    if let Some(refresh) = dashboard.refresh {
        writeln!(out, "Refresh: every {:?}", refresh)?;
    }
    writeln!(
        out,
        "Workers: {}{}",
        effective_concurrency(args.concurrency),
        if args.generate_first {
            " (generate before slots)"
        } else {
            ""
        }
    )?;
    writeln!(out)?;

    for group in &dashboard.groups {
        writeln!(out, "Group: {}", group.name)?;
        for tile in &group.tiles {
            writeln!(out, "  Tile: {}", tile.name)?;
            if let Some(icon) = &tile.icon {
                writeln!(out, "    Icon: {}", icon)?;
            }
            if let Some(link) = &tile.link {
                writeln!(out, "    Link: {}", link)?;
            }
            if let Some(banner) = &tile.banner {
                writeln!(out, "    Banner: {}", banner.src)?;
            }
            if let Some(generate) = &tile.generate {
                writeln!(
                    out,
                    "    Generate: {} (timeout: {:?})",
                    generate.command,
                    generate.effective_timeout()
                )?;
            }
            for slot in &tile.slots {
                writeln!(out, "    Slot: {}", slot.name)?;
                writeln!(
                    out,
                    "      Check: {} {} (timeout: {:?})",
                    slot.check.kind,
                    slot.check.target,
                    slot.check.effective_timeout()
                )?;
                writeln!(out, "      Rules: {}", slot.rules.len())?;
                if let Some(default) = &slot.default_status {
                    writeln!(out, "      Default: {} {}", default.id, default.label)?;
                }
            }
        }
        writeln!(out)?;
    }
    Ok(())
}
