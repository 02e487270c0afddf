//! infmax CLI - seed selection for influence maximization
//!
//! Usage:
//!   infmax <EDGE_LIST> --budget 10                       # CELF under IC
//!   infmax <EDGE_LIST> -k 10 -a imm -a celf++ --model LT # compare two selectors
//!   infmax <EDGE_LIST> -k 5 -o json                      # JSON output

use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::Parser;
use infmax_cli::{load_config, load_edge_list, EdgeListOptions, DEFAULT_EDGE_PROBABILITY};
use infmax_core::{
    compare_algorithms, select_seeds, Algorithm, ComparisonReport, DiffusionModel,
    InfluenceGraph, SelectionConfig, SelectionResult,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "infmax")]
#[command(version)]
#[command(about = "Influence maximization seed selection")]
#[command(long_about = "Select k seed nodes that maximize expected spread under IC, LT or SI diffusion, \
using greedy, CELF, CELF++, RIS, IMM or IMRank")]
struct Cli {
    /// Edge list: one `src dst [prob]` per line
    #[arg(value_name = "EDGE_LIST")]
    edges: PathBuf,

    /// Number of seeds to select
    #[arg(short = 'k', long, value_name = "K")]
    budget: Option<usize>,

    /// Selector (repeat to compare several): greedy, celf, celf++, ris, imm, imrank
    #[arg(short, long = "algorithm", value_name = "ALGO")]
    algorithms: Vec<Algorithm>,

    /// Diffusion model: IC, LT or SI
    #[arg(short, long, value_name = "MODEL")]
    model: Option<DiffusionModel>,

    /// SI infection probability
    #[arg(long, value_name = "BETA")]
    beta: Option<f64>,

    /// Propagation rounds (IC/LT) or steps (SI)
    #[arg(long, value_name = "N")]
    horizon: Option<usize>,

    /// Monte Carlo trials per spread estimate during selection
    #[arg(short, long, value_name = "N")]
    trials: Option<usize>,

    /// Monte Carlo trials for the final evaluation
    #[arg(long, value_name = "N")]
    eval_trials: Option<usize>,

    /// RNG seed (random if omitted; the one used is printed)
    #[arg(short, long, value_name = "SEED")]
    seed: Option<u64>,

    /// Treat every edge as undirected
    #[arg(short, long)]
    undirected: bool,

    /// Probability for edges listed without one
    #[arg(long, default_value_t = DEFAULT_EDGE_PROBABILITY, value_name = "P")]
    default_prob: f64,

    /// RIS pool size
    #[arg(long, value_name = "M")]
    rr_sets: Option<usize>,

    /// IMM approximation slack
    #[arg(long, value_name = "EPS")]
    epsilon: Option<f64>,

    /// IMM cap on the number of RR sets
    #[arg(long, value_name = "N")]
    max_rr_sets: Option<usize>,

    /// IMRank cap on ranking passes
    #[arg(long, value_name = "N")]
    imrank_iterations: Option<usize>,

    /// Wall-clock limit per selection in seconds
    #[arg(long, value_name = "SECS")]
    deadline_secs: Option<f64>,

    /// JSON selection config; explicit flags override its fields
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output format: summary, json, or debug
    #[arg(short, long, default_value = "summary", value_name = "FORMAT")]
    output: String,

    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn selection_config(&self) -> Result<SelectionConfig, String> {
        let mut config = match &self.config {
            Some(path) => load_config(path).map_err(|e| e.to_string())?,
            None => SelectionConfig::default(),
        };
        if let Some(k) = self.budget {
            config.budget = k;
        }
        if let Some(model) = self.model {
            config.model = model;
        }
        if let Some(beta) = self.beta {
            config.model = config.model.with_beta(beta);
        }
        if let Some(h) = self.horizon {
            config.model = config.model.with_horizon(h);
        }
        if let Some(t) = self.trials {
            config.trials = t;
        }
        if let Some(t) = self.eval_trials {
            config.evaluation_trials = t;
        }
        if let Some(s) = self.seed {
            config.seed = Some(s);
        }
        if let Some(m) = self.rr_sets {
            config.rr_sets = m;
        }
        if let Some(eps) = self.epsilon {
            config.imm.epsilon = eps;
        }
        if self.max_rr_sets.is_some() {
            config.imm.max_rr_sets = self.max_rr_sets;
        }
        if let Some(iterations) = self.imrank_iterations {
            config.imrank.max_iterations = iterations;
        }
        if let Some(secs) = self.deadline_secs {
            let limit = Duration::try_from_secs_f64(secs)
                .map_err(|e| format!("invalid deadline {secs}: {e}"))?;
            config.deadline = Some(limit);
        }
        Ok(config)
    }
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "infmax=debug" } else { "infmax=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", message);
    process::exit(1);
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = cli.selection_config().unwrap_or_else(|e| fail(e));
    let options = EdgeListOptions {
        undirected: cli.undirected,
        default_prob: cli.default_prob,
    };
    let graph = load_edge_list(&cli.edges, &options).unwrap_or_else(|e| fail(e));
    debug!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "loaded edge list"
    );

    match cli.algorithms.as_slice() {
        [] | [_] => {
            let algorithm = cli.algorithms.first().copied().unwrap_or(Algorithm::Celf);
            let result = select_seeds(&graph, algorithm, &config).unwrap_or_else(|e| fail(e));
            match cli.output.as_str() {
                "json" => print_json(&result),
                "debug" => println!("{:#?}", result),
                _ => print_summary(&graph, &result),
            }
        }
        many => {
            let report = compare_algorithms(&graph, many, &config).unwrap_or_else(|e| fail(e));
            match cli.output.as_str() {
                "json" => print_json(&report),
                "debug" => println!("{:#?}", report),
                _ => print_report(&graph, &report),
            }
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => fail(format!("serializing to JSON: {}", e)),
    }
}

fn print_summary(graph: &InfluenceGraph, result: &SelectionResult) {
    println!(
        "✓ {} selected {} seeds under {} ({} nodes, {} edges)\n",
        result.algorithm,
        result.seeds.len(),
        result.model,
        graph.node_count(),
        graph.edge_count()
    );
    println!("Seeds (in selection order):");
    for (i, (seed, gain)) in result.seeds.iter().zip(&result.marginal_gains).enumerate() {
        println!("  {:>3}. node {:<8} gain {:.3}", i + 1, seed.0, gain);
    }
    println!(
        "\nSpread: {:.3} ± {:.3} over {} trials (selector estimate {:.3})",
        result.spread.mean, result.spread.stdev, result.spread.trials, result.estimated_spread
    );
    if result.oracle_evaluations > 0 {
        println!("Oracle evaluations: {}", result.oracle_evaluations);
    }
    if result.rr_sets_generated > 0 {
        println!("RR sets generated: {}", result.rr_sets_generated);
    }
    println!("Seed: {}", result.seed);
    println!("Elapsed: {:.3}s", result.elapsed.as_secs_f64());
}

fn print_report(graph: &InfluenceGraph, report: &ComparisonReport) {
    println!(
        "✓ Compared {} selectors ({} nodes, {} edges)\n",
        report.rows.len(),
        graph.node_count(),
        graph.edge_count()
    );
    print!("{}", report);
}
