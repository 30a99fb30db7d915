use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use color_eyre::eyre::WrapErr;
use log::info;

use approx_sop::bdd::BddConfig;
use approx_sop::config::{Budget, Config, ErrorMode};
use approx_sop::decompose::H_FILE;
use approx_sop::oracle::{BddOracle, EspressoProcess, Oracle};
use approx_sop::pla::Pla;
use approx_sop::session::{run, Outcome};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum Report {
    /// Phase-by-phase log.
    Verbose,
    /// One CSV line with the gain figures.
    Test,
    /// One CSV line with the decomposition figures.
    Decomposition,
}

#[derive(Debug, Parser)]
#[command(author, version, about = "Error-bounded approximate minimization of PLA covers")]
struct Cli {
    /// Input cover in PLA format.
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Error budget summed over all outputs (minterms, or a percentage like `5%`).
    #[arg(short = 'g', long = "global", value_name = "ERR", conflicts_with = "per_output")]
    global: Option<Budget>,

    /// Error budget for each output (minterms, or a percentage like `5%`).
    #[arg(short = 'm', long = "per-output", value_name = "ERR")]
    per_output: Option<Budget>,

    /// Minimize the input exactly instead of heuristically.
    #[arg(long)]
    exact: bool,

    /// Skip the `g * h` decomposition that the verbose report runs by default.
    #[arg(long)]
    no_decompose: bool,

    /// Directory for the produced covers.
    #[arg(long, value_name = "DIR", default_value = "out")]
    out_dir: PathBuf,

    /// Use this `espresso` executable as the oracle instead of the built-in one.
    #[arg(long, value_name = "PATH")]
    espresso: Option<PathBuf>,

    /// Report format.
    #[arg(long, value_enum, default_value = "verbose")]
    report: Report,

    /// BDD size (in bits, so the actual size is `2^size` nodes).
    #[arg(long, value_name = "INT")]
    bdd_size: Option<usize>,

    /// More log output (repeatable).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn log_level(&self) -> simplelog::LevelFilter {
        use simplelog::LevelFilter;
        let levels = [LevelFilter::Warn, LevelFilter::Info, LevelFilter::Debug, LevelFilter::Trace];
        let base = if self.report == Report::Verbose { 1 } else { 0 };
        levels[(base + self.verbose as usize).min(levels.len() - 1)]
    }

    fn config(&self, num_inputs: usize) -> Config {
        let (mode, budget) = match (self.global, self.per_output) {
            (Some(budget), _) => (ErrorMode::Global, budget),
            (None, Some(budget)) => (ErrorMode::PerOutput, budget),
            (None, None) => (ErrorMode::default(), Budget::default()),
        };
        let decompose = match self.report {
            Report::Test => false,
            Report::Decomposition => true,
            Report::Verbose => !self.no_decompose,
        };
        let mut config = Config::default()
            .with_mode(mode)
            .with_budget(budget)
            .with_exact(self.exact)
            .with_decompose(decompose);
        if let Some(bits) = self.bdd_size {
            config = config.with_engine(BddConfig::for_inputs(num_inputs).with_storage_bits(bits));
        }
        config
    }

    fn name(&self) -> String {
        self.input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

fn write_outputs(outcome: &Outcome, dir: &Path) -> color_eyre::Result<()> {
    let files = [
        ("out.pla", &outcome.approximate_with_redundancy),
        ("out_minimized.pla", &outcome.approximate),
        ("out_espresso.pla", &outcome.reminimized_pla),
        ("best.pla", outcome.chosen_pla()),
    ];
    for (name, pla) in files {
        let path = dir.join(name);
        pla.write(&path)
            .wrap_err_with(|| format!("cannot write {}", path.display()))?;
    }
    if let Some(decomposition) = &outcome.decomposition {
        let path = dir.join(H_FILE);
        decomposition
            .h
            .write(&path)
            .wrap_err_with(|| format!("cannot write {}", path.display()))?;
    }
    Ok(())
}

fn execute<O: Oracle>(args: &Cli, input: &Pla, oracle: &O) -> color_eyre::Result<()> {
    let config = args.config(input.num_inputs);
    let artifacts = args.out_dir.join("decomposition");
    let outcome = run(input, oracle, &config, Some(&artifacts))?;
    write_outputs(&outcome, &args.out_dir)?;

    match args.report {
        Report::Verbose => {
            let same = oracle.verify(&outcome.approximate, &outcome.minimized)?;
            info!("Heuristic cover equals the minimized input: {}", same);
            let same = oracle.verify(&outcome.approximate, &outcome.approximate_with_redundancy)?;
            info!("Redundancy removal preserved the function: {}", same);
            info!("Chosen: {:?} ({})", outcome.choice, outcome.chosen());
            if let Some(combined) = &outcome.decomposed {
                info!(
                    "OLD SOP LENGTH - AND: {}, OR: {}, TOT: {}",
                    outcome.original.and_literals,
                    outcome.original.or_ports,
                    outcome.original.total()
                );
                info!(
                    "NEW SOP LENGTH - AND: {}, OR: {}, TOT: {}",
                    combined.and_literals,
                    combined.or_ports,
                    combined.total()
                );
            }
        }
        Report::Test => {
            let cpu = outcome.elapsed.as_secs_f64().max(0.01);
            println!(
                "{} ({}/{}); {}; {}; {}; {}; {}; {}; {:.2}",
                args.name(),
                outcome.num_inputs,
                outcome.num_outputs,
                outcome.ct,
                outcome.ratio * 100.0,
                outcome.original.and_literals,
                outcome.original.or_ports,
                outcome.chosen().and_literals,
                outcome.chosen().or_ports,
                cpu
            );
        }
        Report::Decomposition => {
            let combined = outcome.decomposed.unwrap_or_default();
            println!(
                "{} ({}/{}); {}; {};",
                args.name(),
                outcome.num_inputs,
                outcome.num_outputs,
                outcome.original.and_literals,
                combined.and_literals
            );
        }
    }
    Ok(())
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Cli::parse();

    simplelog::TermLogger::init(
        args.log_level(),
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let input = Pla::read(&args.input).wrap_err_with(|| format!("cannot read {}", args.input.display()))?;
    fs::create_dir_all(&args.out_dir).wrap_err_with(|| format!("cannot create {}", args.out_dir.display()))?;

    match &args.espresso {
        Some(program) => execute(&args, &input, &EspressoProcess::new(program)),
        None => match args.config(input.num_inputs).engine {
            Some(engine) => execute(&args, &input, &BddOracle::with_config(engine)),
            None => execute(&args, &input, &BddOracle::new()),
        },
    }
}
