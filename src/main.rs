//! kcluster CLI entry point

use anyhow::{Context, Result};
use kcluster::cluster::{ClusteringOutcome, SequentialEngine};
use kcluster::config::cli::{Cli, ExecutionMode};
use kcluster::config::{toml::build_config, validator::validate_config, Config};
use kcluster::dataset::{read_dataset, write_dataset};
use kcluster::distributed::{
    find_available_ports, Coordinator, LocalWorkers, Runnable, TcpTransport, WorkerService,
};
use kcluster::observation::{DnaStrand, Observation, ObservationKind, Point};
use kcluster::output::{build_report, print_results, write_json_output, RunInfo};
use kcluster::util::RunContext;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Connection attempts against a freshly launched worker
const LAUNCH_CONNECT_ATTEMPTS: usize = 50;

fn main() -> Result<()> {
    // The run clock starts before anything else so reported time covers loading
    let ctx = RunContext::start();

    let cli = Cli::parse_args();
    cli.validate()?;
    init_logging(&cli);

    let config = build_config(&cli)?;
    validate_config(&config)
        .context("Configuration validation failed")?;

    if cli.dry_run {
        print_configuration(&cli, &config);
        println!();
        println!("Dry run mode - configuration validated successfully");
        return Ok(());
    }

    match config.clustering.kind {
        ObservationKind::Point => run_mode::<Point>(&cli, &config, ctx),
        ObservationKind::Dna => run_mode::<DnaStrand>(&cli, &config, ctx),
    }
}

/// Install the tracing subscriber
///
/// `--log-level` wins over RUST_LOG; the default shows warnings only so the
/// report stays readable.
fn init_logging(cli: &Cli) {
    let filter = match &cli.log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_mode<O: Observation>(cli: &Cli, config: &Config, ctx: RunContext) -> Result<()> {
    match cli.mode {
        ExecutionMode::Sequential => run_sequential::<O>(config, ctx),
        ExecutionMode::Parallel => run_parallel::<O>(cli, config, ctx),
        ExecutionMode::Worker => run_worker::<O>(config),
        ExecutionMode::Generate => run_generate::<O>(config),
    }
}

/// Run in sequential mode (single process)
fn run_sequential<O: Observation>(config: &Config, ctx: RunContext) -> Result<()> {
    let dataset = load_dataset::<O>(config)?;
    let observations = dataset.len();

    let outcome = SequentialEngine::new(config.clustering.settings())
        .run(&dataset, &ctx)?;

    report(config, &outcome, run_info(config, "sequential", observations, None, &ctx))
}

/// Run in parallel mode (coordinator plus workers)
fn run_parallel<O: Observation>(cli: &Cli, config: &Config, ctx: RunContext) -> Result<()> {
    let dataset = load_dataset::<O>(config)?;
    let observations = dataset.len();

    // Connect to the given workers, or launch our own on localhost.
    // Launched workers are reaped when `launched` drops, error paths included.
    let mut launched = LocalWorkers::new(cli.debug);
    let mut addresses = config.distributed.addresses();

    if addresses.is_empty() {
        let workers = config.distributed.local_workers();
        println!("Launching {} localhost workers...", workers);

        for port in find_available_ports(workers)? {
            launched.launch(port, O::KIND, cli.log_level.as_deref())?;
            addresses.push(format!("127.0.0.1:{}", port));
        }
    }

    let connect_attempts = if launched.is_empty() { 1 } else { LAUNCH_CONNECT_ATTEMPTS };
    let num_workers = addresses.len();

    let runtime = tokio::runtime::Runtime::new()
        .context("Failed to create tokio runtime")?;

    let result = runtime.block_on(async {
        println!("Connecting to {} workers...", num_workers);

        let mut links = Vec::with_capacity(num_workers);
        for (i, addr) in addresses.iter().enumerate() {
            let link = connect_worker::<O>(addr, connect_attempts).await
                .with_context(|| format!("Failed to connect to worker {} ({})", i, addr))?;
            links.push(link);
        }

        let coordinator = Coordinator::new(
            dataset,
            links,
            config.clustering.settings(),
            config.clustering.encoding(),
            ctx,
        ).context("Failed to create coordinator")?;

        coordinator.run().await
    });

    drop(runtime);
    launched.shutdown();

    let outcome = result?;
    report(config, &outcome, run_info(config, "parallel", observations, Some(num_workers), &ctx))
}

/// Run in worker mode
fn run_worker<O: Observation>(config: &Config) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new()
        .context("Failed to create tokio runtime")?;

    runtime.block_on(async {
        let distributed = &config.distributed;
        let service = WorkerService::new(distributed.listen_port, distributed.persistent);
        let summary = service.run::<O>().await?;

        println!(
            "Worker {} served {} rounds over {} observations",
            summary.worker_id, summary.rounds_served, summary.partition_len
        );
        Ok(())
    })
}

/// Run in generate mode
fn run_generate<O: Observation>(config: &Config) -> Result<()> {
    let path = config.input.path_for(O::KIND);
    let mut generator = config.generate.generator();

    let count = match O::KIND {
        ObservationKind::Dna => {
            let strands = generator.strands(&config.generate.strand_clusters())?;
            write_dataset(&path, &strands)?;
            strands.len()
        }
        ObservationKind::Point => {
            let points = generator.points(&config.generate.point_clusters())?;
            write_dataset(&path, &points)?;
            points.len()
        }
    };

    println!(
        "Wrote {} {} observations in {} clusters to {}",
        count,
        O::KIND,
        config.generate.clusters,
        path.display()
    );
    Ok(())
}

fn load_dataset<O: Observation>(config: &Config) -> Result<Vec<O>> {
    let path = config.input.path_for(O::KIND);
    let dataset = read_dataset::<O>(&path)?;

    println!("Loaded {} {} observations from {}", dataset.len(), O::KIND, path.display());
    println!();

    Ok(dataset)
}

fn run_info(
    config: &Config,
    mode: &str,
    observations: usize,
    workers: Option<usize>,
    ctx: &RunContext,
) -> RunInfo {
    RunInfo {
        mode: mode.to_string(),
        kind: config.clustering.kind,
        k: config.clustering.k,
        observations,
        workers,
        started_at: ctx.started_at(),
    }
}

/// Print the report and write the JSON file if requested
fn report<O: Observation>(
    config: &Config,
    outcome: &ClusteringOutcome<O>,
    info: RunInfo,
) -> Result<()> {
    print_results(outcome);

    if let Some(ref path) = config.output.json_output {
        write_json_output(path, &build_report(outcome, &info), true)?;
        println!();
        println!("JSON output written to: {}", path.display());
    }

    Ok(())
}

fn print_configuration(cli: &Cli, config: &Config) {
    let clustering = &config.clustering;

    println!("Configuration:");
    println!("  Mode: {:?}", cli.mode);
    println!("  Kind: {}", clustering.kind);
    println!("  Clusters (k): {}", clustering.k);
    println!("  Termination: {}", clustering.policy());
    println!("  Dataset: {}", config.input.path_for(clustering.kind).display());

    if let Some(seed) = clustering.seed {
        println!("  Seed: {}", seed);
    }

    if cli.mode == ExecutionMode::Parallel {
        println!("  Encoding: {:?}", clustering.encoding());
        let addresses = config.distributed.addresses();
        if addresses.is_empty() {
            println!("  Workers: {} (localhost)", config.distributed.local_workers());
        } else {
            println!("  Workers: {}", addresses.join(", "));
        }
    }

    if let Some(ref path) = config.output.json_output {
        println!("  JSON output: {}", path.display());
    }
}

/// Connect to a worker, retrying while a launched worker starts up
async fn connect_worker<O: Observation>(addr: &str, attempts: usize) -> Result<TcpTransport<O>> {
    let mut attempt = 1;
    loop {
        match TcpTransport::connect(addr).await {
            Ok(link) => return Ok(link),
            Err(e) if attempt >= attempts => return Err(e),
            Err(_) => {
                attempt += 1;
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        }
    }
}
