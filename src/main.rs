use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::Path;
use thurstone::{
    cli::{Cli, Command, EffectArgs, KindSelection, OutputFormat},
    config::AnalysisConfig,
    csv_output::CsvResultsOutput,
    discrimination::{DiscriminationTest, TestConfig, TestKind},
    json_output::JsonOutput,
    method::DiscriminationMethod,
    mplusn::MonteCarloConfig,
    power::{PowerQuery, SampleSize},
    protocol::Protocol,
    table,
};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

fn build_method(spec: &str, monte_carlo: &MonteCarloConfig) -> Result<DiscriminationMethod> {
    DiscriminationMethod::from_spec(spec, monte_carlo)
        .with_context(|| format!("Cannot set up protocol '{spec}'"))
}

/// Protocols tabulated when `table` gets no `--protocol`
fn default_table_protocols() -> Vec<Protocol> {
    vec![
        Protocol::TwoAfc,
        Protocol::ThreeAfc,
        Protocol::FourAfc,
        Protocol::Triangle,
        Protocol::DuoTrio,
        Protocol::DualPair,
        Protocol::SpecifiedTetrad,
        Protocol::UnspecifiedTetrad,
    ]
}

fn power_query(
    method: &DiscriminationMethod,
    effect: EffectArgs,
    kind: TestKind,
    alpha: f64,
    pd0: f64,
) -> Result<PowerQuery> {
    let query = match (effect.pc, effect.d_prime) {
        (Some(pc), None) => PowerQuery::new(method.guessing(), pc, kind),
        (None, Some(d)) => PowerQuery::from_d_prime(method, d, kind)?,
        _ => bail!("Specify exactly one of --pc or --d-prime"),
    };
    Ok(query.with_alpha(alpha).with_pd0(pd0))
}

fn cmd_test(
    spec: &str,
    correct: u64,
    trials: u64,
    config: TestConfig,
    kinds: KindSelection,
    format: OutputFormat,
    monte_carlo: &MonteCarloConfig,
) -> Result<()> {
    config.validate().context("Invalid test settings")?;
    let method = build_method(spec, monte_carlo)?;
    let test = DiscriminationTest::new(&method);

    let mut results = Vec::new();
    for &kind in kinds.kinds() {
        results.push(
            test.run(kind, correct, trials, &config)
                .with_context(|| format!("{kind} test on {correct} of {trials} failed"))?,
        );
    }

    match format {
        OutputFormat::Text => {
            let reports: Vec<String> = results.iter().map(|r| r.to_report_string()).collect();
            print!("{}", reports.join("\n"));
        }
        OutputFormat::Json => {
            let mut output = JsonOutput::new();
            for r in results {
                output.add_result(None, r);
            }
            println!("{}", output.to_json()?);
        }
        OutputFormat::Csv => {
            let mut output = CsvResultsOutput::new();
            for r in results {
                output.add_result("", r);
            }
            print!("{}", output.to_csv());
        }
    }
    Ok(())
}

fn cmd_table(specs: &[String], max: f64, step: f64, monte_carlo: &MonteCarloConfig) -> Result<()> {
    let methods = if specs.is_empty() {
        default_table_protocols()
            .into_iter()
            .map(|p| DiscriminationMethod::new(p).map_err(anyhow::Error::from))
            .collect::<Result<Vec<_>>>()?
    } else {
        specs
            .iter()
            .map(|spec| build_method(spec, monte_carlo))
            .collect::<Result<Vec<_>>>()?
    };

    print!("{}", table::pc_table(&methods, max, step)?.to_csv());
    Ok(())
}

fn cmd_dprime_table(spec: &str, monte_carlo: &MonteCarloConfig) -> Result<()> {
    let method = build_method(spec, monte_carlo)?;
    print!("{}", table::dprime_table(&method)?.to_csv());
    Ok(())
}

fn cmd_power(query: PowerQuery, trials: u64, format: OutputFormat) -> Result<()> {
    let point = query.power_at(trials)?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&point)?),
        OutputFormat::Csv => {
            println!("trials,critical_value,power");
            println!(
                "{},{},{:.6}",
                point.trials,
                point.critical_value.map(|c| c.to_string()).unwrap_or_default(),
                point.power
            );
        }
        OutputFormat::Text => {
            println!("Trials: {}", point.trials);
            println!("pc0: {:.4}, pc: {:.4}", query.pc0(), query.pc);
            match point.critical_value {
                Some(c) => println!("Critical value: {c}"),
                None => println!("Critical value: none (too few trials to reject)"),
            }
            println!("Power: {:.4}", point.power);
        }
    }
    Ok(())
}

fn cmd_sample_size(query: PowerQuery, target: f64, format: OutputFormat) -> Result<()> {
    let size = query.min_sample_size(target)?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&size)?),
        OutputFormat::Csv => {
            println!("target_power,trials");
            println!("{target},{size}");
        }
        OutputFormat::Text => match size {
            SampleSize::Found(point) => {
                println!("Minimum sample size: {}", point.trials);
                println!("Power: {:.4}", point.power);
            }
            SampleSize::ExceedsCap { cap } => {
                println!("Minimum sample size: no finite answer within cap (>{cap})");
            }
        },
    }
    Ok(())
}

fn cmd_batch(path: &Path, format: OutputFormat, cli: &Cli) -> Result<()> {
    let mut config = AnalysisConfig::from_file(path)?;
    config.monte_carlo = cli.monte_carlo(config.monte_carlo);
    config
        .monte_carlo
        .validate()
        .context("Invalid Monte Carlo overrides")?;

    let outcomes = config.run_panels();
    let failed = outcomes.iter().filter(|o| o.result.is_err()).count();

    match format {
        OutputFormat::Text => {
            for outcome in &outcomes {
                println!("=== {} ===", outcome.name);
                match &outcome.result {
                    Ok(results) => println!("{}", results.to_report_string()),
                    Err(e) => println!("⚠️  FAILED: {e}\n"),
                }
            }
        }
        OutputFormat::Json => {
            let mut output = JsonOutput::new();
            for outcome in outcomes {
                match outcome.result {
                    Ok(results) => output.add_result(Some(outcome.name), results),
                    Err(e) => output.add_error(outcome.name, e),
                }
            }
            println!("{}", output.to_json()?);
        }
        OutputFormat::Csv => {
            let mut output = CsvResultsOutput::new();
            for outcome in outcomes {
                match outcome.result {
                    Ok(results) => output.add_result(outcome.name, results),
                    Err(e) => eprintln!("{}: {e}", outcome.name),
                }
            }
            print!("{}", output.to_csv());
        }
    }

    if failed > 0 {
        bail!("{failed} of {} panels failed", config.panel.len());
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing if --debug flag is set
    init_tracing(cli.debug);

    let monte_carlo = cli.monte_carlo(MonteCarloConfig::default());

    match &cli.command {
        Command::Test {
            protocol,
            correct,
            trials,
            pd0,
            conf_level,
            kind,
            format,
        } => cmd_test(
            protocol,
            *correct,
            *trials,
            TestConfig {
                pd0: *pd0,
                conf_level: *conf_level,
            },
            *kind,
            *format,
            &monte_carlo,
        ),
        Command::Table {
            protocols,
            max,
            step,
        } => cmd_table(protocols, *max, *step, &monte_carlo),
        Command::DprimeTable { protocol } => cmd_dprime_table(protocol, &monte_carlo),
        Command::Power {
            protocol,
            effect,
            trials,
            alpha,
            pd0,
            kind,
            format,
        } => {
            let method = build_method(protocol, &monte_carlo)?;
            let query = power_query(&method, *effect, *kind, *alpha, *pd0)?;
            cmd_power(query, *trials, *format)
        }
        Command::SampleSize {
            protocol,
            effect,
            power,
            alpha,
            pd0,
            kind,
            format,
        } => {
            let method = build_method(protocol, &monte_carlo)?;
            let query = power_query(&method, *effect, *kind, *alpha, *pd0)?;
            cmd_sample_size(query, *power, *format)
        }
        Command::Batch { config, format } => cmd_batch(config, *format, &cli),
    }
}
