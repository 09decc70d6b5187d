use clap::{Parser, Subcommand, ValueEnum};
use facloc_model::{
    CapacityPolicy, Engine, FacilityError, Instance, InstanceGenerator, InstanceInput, Planner, Solution,
    SolveStatus, SolverConfig, miles_to_km_rate,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "facloc")]
#[command(about = "Capacitated facility location solver", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Pretty,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve an instance file and print the open sites and flows
    Solve {
        /// JSON instance file
        file: PathBuf,
        /// Time limit in seconds (default: solve to proven optimality)
        #[arg(long)]
        time_limit: Option<f64>,
        /// Relative optimality gap (fraction)
        #[arg(long)]
        mip_gap: Option<f64>,
        /// Absolute optimality gap
        #[arg(long)]
        abs_gap: Option<f64>,
        /// Solver threads
        #[arg(long)]
        threads: Option<u32>,
        /// Solver engine
        #[arg(long, default_value = "highs")]
        engine: String,
        /// Reject instances whose total capacity is below total demand without solving
        #[arg(long)]
        fast_fail: bool,
        /// Output format
        #[arg(short, long, value_enum, default_value = "pretty")]
        format: Format,
        /// Show the engine's own log
        #[arg(long)]
        solver_log: bool,
    },
    /// Validate an instance file
    Check {
        /// JSON instance file
        file: PathBuf,
    },
    /// Generate a random instance
    Generate {
        #[arg(long, default_value_t = 50)]
        customers: usize,
        #[arg(long, default_value_t = 20)]
        demand_min: u64,
        #[arg(long, default_value_t = 80)]
        demand_max: u64,
        #[arg(long, default_value_t = 5)]
        sites: usize,
        #[arg(long, default_value_t = 1000)]
        capacity_min: u64,
        #[arg(long, default_value_t = 4000)]
        capacity_max: u64,
        #[arg(long, default_value_t = 4_000_000)]
        fixed_cost_min: u64,
        #[arg(long, default_value_t = 6_000_000)]
        fixed_cost_max: u64,
        /// Shipping cost per unit and mile
        #[arg(long, default_value_t = 0.1)]
        cost_per_unit_mile: f64,
        /// RNG seed (random when omitted)
        #[arg(long)]
        seed: Option<u64>,
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_input(file: &Path) -> InstanceInput {
    let source = match std::fs::read_to_string(file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading file: {}", e);
            std::process::exit(1);
        }
    };
    match serde_json::from_str(&source) {
        Ok(input) => input,
        Err(e) => {
            eprintln!("Parse error: {}", e);
            std::process::exit(1);
        }
    }
}

fn load_instance(file: &Path) -> Instance {
    match load_input(file).into_instance() {
        Ok(instance) => {
            debug!(
                file = %file.display(),
                sites = instance.sites().len(),
                customers = instance.customers().len(),
                "Loaded instance"
            );
            instance
        }
        Err(e) => {
            eprintln!("Invalid instance: {}", e);
            std::process::exit(1);
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Solve {
            file,
            time_limit,
            mip_gap,
            abs_gap,
            threads,
            engine,
            fast_fail,
            format,
            solver_log,
        } => {
            let instance = load_instance(&file);

            let engine: Engine = match engine.parse() {
                Ok(e) => e,
                Err(e) => {
                    eprintln!("{}", e);
                    std::process::exit(2);
                }
            };
            let mut config = SolverConfig::new()
                .with_engine(engine)
                .with_log_to_console(solver_log);
            config.time_limit = time_limit;
            config.mip_rel_gap = mip_gap;
            config.mip_abs_gap = abs_gap;
            config.threads = threads;

            let policy = if fast_fail {
                CapacityPolicy::FastFail
            } else {
                CapacityPolicy::DeferToSolver
            };
            let planner = Planner::new().with_config(config).with_capacity_policy(policy);

            let solution = match planner.solve(&instance) {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    let code = match e {
                        FacilityError::Consistency(_) => 3,
                        _ => 1,
                    };
                    std::process::exit(code);
                }
            };

            match format {
                Format::Json => match serde_json::to_string_pretty(&solution) {
                    Ok(json) => println!("{}", json),
                    Err(e) => {
                        eprintln!("Error writing solution: {}", e);
                        std::process::exit(1);
                    }
                },
                Format::Pretty => print_solution(&instance, &solution),
            }
        }
        Commands::Check { file } => {
            let instance = load_instance(&file);
            let capacity = instance.total_capacity();
            let demand = instance.total_demand();

            println!("✓ {} is valid", file.display());
            println!("  {} sites", instance.sites().len());
            println!("  {} customers", instance.customers().len());
            println!("  total capacity {:.2}", capacity);
            println!("  total demand   {:.2}", demand);
            if capacity < demand {
                println!("  ! capacity is short of demand by {:.2}", demand - capacity);
            }
        }
        Commands::Generate {
            customers,
            demand_min,
            demand_max,
            sites,
            capacity_min,
            capacity_max,
            fixed_cost_min,
            fixed_cost_max,
            cost_per_unit_mile,
            seed,
            output,
        } => {
            let generator = InstanceGenerator::new()
                .with_customers(customers, (demand_min, demand_max))
                .with_sites(sites, (capacity_min, capacity_max), (fixed_cost_min, fixed_cost_max))
                .with_cost_per_km(miles_to_km_rate(cost_per_unit_mile));
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_os_rng(),
            };

            let instance = match generator.generate(&mut rng) {
                Ok(i) => i,
                Err(e) => {
                    eprintln!("Cannot generate instance: {}", e);
                    std::process::exit(1);
                }
            };
            info!(
                sites = instance.sites().len(),
                customers = instance.customers().len(),
                seed = ?seed,
                "Generated instance"
            );
            let json = match serde_json::to_string_pretty(&InstanceInput::from(&instance)) {
                Ok(j) => j,
                Err(e) => {
                    eprintln!("Error writing instance: {}", e);
                    std::process::exit(1);
                }
            };
            match output {
                Some(path) => {
                    if let Err(e) = std::fs::write(&path, json) {
                        eprintln!("Error writing {}: {}", path.display(), e);
                        std::process::exit(1);
                    }
                }
                None => println!("{}", json),
            }
        }
    }
}

fn print_solution(instance: &Instance, solution: &Solution) {
    match solution.status {
        SolveStatus::Optimal | SolveStatus::TimeLimitReached if solution.has_assignment() => {
            if solution.status == SolveStatus::Optimal {
                println!("Status: OPTIMAL");
            } else {
                println!("Status: TIME LIMIT (best solution found)");
            }
            if let Some(costs) = solution.costs {
                println!("Total costs:          {:.0}", costs.total);
                println!("Total fixed costs:    {:.0}", costs.fixed);
                println!("Total variable costs: {:.0}", costs.variable);
            }
            if let Some(gap) = solution.mip_gap {
                println!("MIP gap:              {:.4}%", gap * 100.0);
            }
            println!("Solve time:           {:.2}s", solution.solve_seconds);
            println!();

            println!("Open sites ({} of {}):", solution.open_sites.len(), instance.sites().len());
            for usage in &solution.site_usage {
                println!(
                    "  {:20} {:10.2} / {:10.2} ({:5.1}%)",
                    usage.site,
                    usage.volume,
                    usage.capacity,
                    usage.utilization * 100.0
                );
            }
            println!();

            println!("Flows:");
            for flow in &solution.flows {
                println!(
                    "  {:12} -> {:12} {:10.2} @ {:.4}",
                    flow.site, flow.customer, flow.quantity, flow.unit_cost
                );
            }
        }
        SolveStatus::Infeasible => {
            println!("Status: INFEASIBLE");
            println!("No assignment satisfies every demand within the site capacities.");
            std::process::exit(1);
        }
        SolveStatus::Unbounded => {
            println!("Status: UNBOUNDED");
            println!("The problem has no finite optimal solution.");
            std::process::exit(1);
        }
        SolveStatus::TimeLimitReached => {
            println!("Status: TIME LIMIT");
            println!("No feasible solution was found within the time limit.");
            std::process::exit(1);
        }
        SolveStatus::Optimal | SolveStatus::Error => {
            println!("Status: ERROR");
            println!("Solver finished without a usable result.");
            std::process::exit(1);
        }
    }
}
