//! canonical-pages - Canonical page numbering for PDF indexing
//!
//! CLI entry point

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use serde::Serialize;

use canonical_pages::{
    exit_codes,
    // CLI
    Cli, Commands, ComputeArgs, ConvertBboxArgs, OverlapArgs, SnapshotArgs,
    // Config
    EngineConfig,
    // Pipeline
    ApplicablePagesResolver, CancelToken, CanonicalPageComputer, CanonicalPageMap,
    CanonicalPageSegment, DerivationCache, ExtractionOutcome, JsonFileStore, KeyValueStore,
    MemoryStore, PageNumberExtractor, ProjectSnapshot, SegmentFormatter,
    // Geometry
    overlap_ratio, CoordinateTransformer, ExtractionBox, RenderBox, Rotation,
};

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match &cli.command {
        Commands::Compute(args) => run_compute(&cli, args),
        Commands::CacheKey(args) => run_cache_key(args),
        Commands::Pages(args) => run_pages(args),
        Commands::ConvertBbox(args) => run_convert_bbox(args),
        Commands::Overlap(args) => run_overlap(&cli, args),
    };

    std::process::exit(match result {
        Ok(()) => exit_codes::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            exit_code_for(&e)
        }
    });
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn exit_code_for(error: &anyhow::Error) -> i32 {
    for cause in error.chain() {
        if let Some(canonical_pages::SnapshotError::NotFound(_)) =
            cause.downcast_ref::<canonical_pages::SnapshotError>()
        {
            return exit_codes::INPUT_NOT_FOUND;
        }
        if cause.downcast_ref::<canonical_pages::CoordError>().is_some()
            || cause.downcast_ref::<canonical_pages::ConfigError>().is_some()
        {
            return exit_codes::INVALID_ARGS;
        }
    }
    exit_codes::GENERAL_ERROR
}

fn load_config(cli: &Cli) -> anyhow::Result<EngineConfig> {
    let config = match &cli.config {
        Some(path) => EngineConfig::load_from_path(path)?,
        None => EngineConfig::load()?,
    };
    Ok(config)
}

fn load_snapshot(path: &Path) -> anyhow::Result<ProjectSnapshot> {
    ProjectSnapshot::load(path)
        .with_context(|| format!("Failed to load snapshot {}", path.display()))
}

// ============ Compute Command ============

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ComputeReport<'a> {
    status: canonical_pages::MapStatus,
    statistics: canonical_pages::CanonicalPageStatistics,
    pages: &'a CanonicalPageMap,
    segments: &'a [CanonicalPageSegment],
    display: String,
}

fn run_compute(cli: &Cli, args: &ComputeArgs) -> anyhow::Result<()> {
    let config = load_config(cli)?.merge_with_cli(&args.overrides());
    let snapshot = load_snapshot(&args.input)?;

    let mut readings = snapshot.readings.clone();
    if let Some(source) = snapshot.text_source() {
        let store: Arc<dyn KeyValueStore> = match config.cache_dir() {
            Some(dir) => match JsonFileStore::new(&dir) {
                Ok(store) => Arc::new(store),
                Err(e) => {
                    tracing::warn!(dir = %dir.display(), error = %e, "Cache directory unavailable");
                    Arc::new(MemoryStore::new())
                }
            },
            None => Arc::new(MemoryStore::new()),
        };
        let cache = config.cache.enabled.then(|| DerivationCache::new(store));

        let extractor = PageNumberExtractor::new(config.extraction_options());
        let runtime = tokio::runtime::Runtime::new()?;
        let outcome = runtime.block_on(extractor.derive(
            &snapshot.project_id,
            &snapshot.regions,
            snapshot.document_page_count,
            &source,
            cache.as_ref(),
            &CancelToken::new(),
        ))?;

        match outcome {
            ExtractionOutcome::Completed(extracted) => readings.extend(extracted),
            ExtractionOutcome::Cancelled => bail!("Extraction was cancelled"),
        }
    }

    let map = CanonicalPageComputer::compute(
        snapshot.document_page_count,
        &snapshot.regions,
        &snapshot.rules,
        &readings,
    );
    let segments = SegmentFormatter::format(&map, &snapshot.rules, &snapshot.regions);
    let display = SegmentFormatter::display(&segments);

    if args.json {
        let report = ComputeReport {
            status: map.status(),
            statistics: map.statistics(),
            pages: &map,
            segments: &segments,
            display,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    // An empty map only needs attention when something should have labelled it
    let has_inputs = !snapshot.rules.is_empty() || !readings.is_empty();
    if map.is_unresolved() && (has_inputs || !map.conflicts.is_empty()) {
        println!("Resolve region conflicts before canonical pages can be displayed.");
    } else {
        println!("{}", display);
        for segment in &segments {
            let mut line = format!(
                "  pages {:<10} {:<12} {:?}",
                segment.document_page_range.to_string(),
                segment.canonical_page_range.to_string(),
                segment.source,
            );
            if let Some(label) = &segment.label {
                line.push_str(&format!(" \"{}\"", label));
            }
            if !segment.region_names.is_empty() {
                line.push_str(&format!(" [{}]", segment.region_names.join(", ")));
            }
            println!("{}", line);
        }
    }

    for conflict in &map.conflicts {
        println!(
            "Conflict on page {}: {}",
            conflict.document_page,
            conflict.values().join(" vs ")
        );
    }
    Ok(())
}

// ============ Snapshot Commands ============

fn run_cache_key(args: &SnapshotArgs) -> anyhow::Result<()> {
    let snapshot = load_snapshot(&args.input)?;
    println!(
        "{}",
        DerivationCache::compute_key(&snapshot.project_id, &snapshot.regions)
    );
    Ok(())
}

fn run_pages(args: &SnapshotArgs) -> anyhow::Result<()> {
    let snapshot = load_snapshot(&args.input)?;
    for region in &snapshot.regions {
        let pages = ApplicablePagesResolver::resolve(region, snapshot.document_page_count);
        println!(
            "{} ({}): {}",
            region.name,
            ApplicablePagesResolver::describe(region),
            format_pages(&pages)
        );
    }
    Ok(())
}

/// Compress a sorted page list into `1-3, 7, 9-10`
fn format_pages(pages: &[u32]) -> String {
    if pages.is_empty() {
        return "(none)".to_string();
    }

    let mut runs: Vec<String> = Vec::new();
    let mut start = pages[0];
    let mut prev = pages[0];
    for &page in &pages[1..] {
        if page == prev + 1 {
            prev = page;
            continue;
        }
        runs.push(format_run(start, prev));
        start = page;
        prev = page;
    }
    runs.push(format_run(start, prev));
    runs.join(", ")
}

fn format_run(start: u32, end: u32) -> String {
    if start == end {
        start.to_string()
    } else {
        format!("{}-{}", start, end)
    }
}

// ============ Geometry Commands ============

fn run_convert_bbox(args: &ConvertBboxArgs) -> anyhow::Result<()> {
    let &[a, b, c, d] = args.values.as_slice() else {
        bail!("Expected four box values");
    };
    let rotation = Rotation::from_degrees(args.rotation)?;
    let transformer = CoordinateTransformer::new(args.page_height, args.scale, rotation)?;

    if args.inverse {
        let bbox = transformer.to_extraction(&RenderBox::new(a, b, c, d).with_rotation(rotation));
        println!("{}", serde_json::to_string(&bbox)?);
    } else {
        let bbox = transformer.to_render(&ExtractionBox::new(a, b, c, d));
        println!("{}", serde_json::to_string(&bbox)?);
    }
    Ok(())
}

fn run_overlap(cli: &Cli, args: &OverlapArgs) -> anyhow::Result<()> {
    let threshold = match args.threshold {
        Some(threshold) => threshold,
        None => load_config(cli)?.overlap.threshold,
    };
    let (Some(a), Some(b)) = (to_box(&args.a), to_box(&args.b)) else {
        bail!("Expected four values per box");
    };

    let ratio = overlap_ratio(&a, &b);
    println!(
        "ratio {:.4} {} threshold {}",
        ratio,
        if ratio >= threshold { ">=" } else { "<" },
        threshold
    );
    Ok(())
}

fn to_box(values: &[f64]) -> Option<ExtractionBox> {
    match values {
        [x0, y0, x1, y1] => Some(ExtractionBox::new(*x0, *y0, *x1, *y1)),
        _ => None,
    }
}
