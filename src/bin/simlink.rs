use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use colored::*;
use simlink::client::{Client, DEFAULT_HOST, DEFAULT_PORT};
use simlink::has::phase::{self, PhaseBiases};
use simlink::schema::FieldSchema;
use simlink::store::ParameterStore;
use std::time::Duration;
use tracing::Level;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let default_port = DEFAULT_PORT.to_string();
    let matches = App::new("simlink")
        .version("0.1.0")
        .author("Space Systems Engineering Team")
        .about("🛰️  GNSS simulator link and HAS phase-bias decoder")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("host")
                .short("H")
                .long("host")
                .value_name("HOST")
                .help("Simulator host address")
                .takes_value(true)
                .default_value(DEFAULT_HOST)
                .global(true),
        )
        .arg(
            Arg::with_name("port")
                .short("p")
                .long("port")
                .value_name("PORT")
                .help("Simulator port")
                .takes_value(true)
                .default_value(&default_port)
                .global(true),
        )
        .arg(
            Arg::with_name("format")
                .short("f")
                .long("format")
                .value_name("FORMAT")
                .help("Output format")
                .takes_value(true)
                .possible_values(&["json", "table", "compact"])
                .default_value("table")
                .global(true),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .help("Enable debug traces")
                .global(true),
        )
        .subcommand(
            SubCommand::with_name("decode")
                .about("🧩 Decode a HAS phase-bias block from a JSON parameter store")
                .arg(
                    Arg::with_name("store")
                        .help("Path to a JSON parameter store")
                        .required(true),
                ),
        )
        .subcommand(
            SubCommand::with_name("schema")
                .about("📐 List the phase-bias fields for the given system layout")
                .arg(
                    Arg::with_name("systems")
                        .long("systems")
                        .value_name("N")
                        .help("Number of systems")
                        .takes_value(true)
                        .required(true)
                        .validator(|v| match v.parse::<u8>() {
                            Ok(_) => Ok(()),
                            Err(_) => Err("System count must be between 0 and 255".into()),
                        }),
                )
                .arg(
                    Arg::with_name("sats")
                        .long("sats")
                        .value_name("COUNTS")
                        .help("Comma separated satellite count per system")
                        .takes_value(true)
                        .required(true),
                )
                .arg(
                    Arg::with_name("sigs")
                        .long("sigs")
                        .value_name("COUNTS")
                        .help("Comma separated signal count per system")
                        .takes_value(true)
                        .required(true),
                ),
        )
        .subcommand(
            SubCommand::with_name("ping")
                .about("🏓 Connect to the simulator and read one message tag")
                .arg(
                    Arg::with_name("timeout-ms")
                        .long("timeout-ms")
                        .value_name("MS")
                        .help("Read timeout in milliseconds (blocks forever if omitted)")
                        .takes_value(true)
                        .validator(|v| match v.parse::<u64>() {
                            Ok(ms) if ms > 0 => Ok(()),
                            _ => Err("Timeout must be a positive number of milliseconds".into()),
                        }),
                ),
        )
        .get_matches();

    let verbose = matches.is_present("verbose");
    tracing_subscriber::fmt()
        .with_max_level(if verbose { Level::DEBUG } else { Level::WARN })
        .init();

    let format = matches.value_of("format").unwrap_or("table");

    match matches.subcommand() {
        ("decode", Some(sub_matches)) => handle_decode(sub_matches, format),
        ("schema", Some(sub_matches)) => handle_schema(sub_matches, format),
        ("ping", Some(sub_matches)) => {
            let host = sub_matches.value_of("host").unwrap_or(DEFAULT_HOST);
            let port = parse_port(sub_matches.value_of("port"))?;
            handle_ping(sub_matches, host, port, format)
        }
        _ => Ok(()),
    }
}

fn handle_decode(matches: &ArgMatches<'_>, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let path = matches.value_of("store").ok_or("store path required")?;
    let contents = std::fs::read_to_string(path)?;
    let store: ParameterStore = serde_json::from_str(&contents)?;

    let biases = match phase::decode(&store) {
        Ok(biases) => biases,
        Err(e) => {
            eprintln!("{} Failed to decode {}: {}", "❌".red(), path.bright_white(), e.to_string().bright_red());
            return Err(e.into());
        }
    };

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&biases)?),
        "compact" => print_biases_compact(&biases),
        _ => print_biases_table(&biases),
    }

    Ok(())
}

fn handle_schema(matches: &ArgMatches<'_>, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let n_sys: u8 = matches.value_of("systems").ok_or("system count required")?.parse()?;
    let sat_counts = parse_counts(matches.value_of("sats").ok_or("satellite counts required")?)?;
    let sig_counts = parse_counts(matches.value_of("sigs").ok_or("signal counts required")?)?;

    let schema = phase::declare_schema(n_sys, &sat_counts, &sig_counts)?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(schema.fields())?),
        "compact" => {
            for key in schema.keys() {
                println!("{}", key);
            }
        }
        _ => print_schema_table(&schema),
    }

    Ok(())
}

fn handle_ping(matches: &ArgMatches<'_>, host: &str, port: u16, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let mut client = Client::new();
    if let Err(e) = client.connect(host, port) {
        eprintln!("{} Failed to connect to simulator at {}:{}", "❌".red(), host.bright_white(), port);
        eprintln!("{} {}", "🔌".yellow(), e.to_string().bright_red());
        return Err(e.into());
    }

    if let Some(ms) = matches.value_of("timeout-ms") {
        client.set_timeout(Some(Duration::from_millis(ms.parse()?)))?;
    }

    let tag = client.read_message_tag()?;
    match format {
        "json" => println!("{}", serde_json::json!({ "address": client.address().map(|a| a.to_string()), "tag": tag.0 })),
        "compact" => println!("{}", tag.0),
        _ => println!(
            "{} Connected to {} - first message tag {}",
            "✅".green(),
            client.address().map(|a| a.to_string()).unwrap_or_default().bright_white(),
            tag.0.to_string().bright_cyan()
        ),
    }

    Ok(())
}

fn parse_port(value: Option<&str>) -> Result<u16, std::num::ParseIntError> {
    value.map(str::parse::<u16>).transpose().map(|port| port.unwrap_or(DEFAULT_PORT))
}

fn parse_counts(list: &str) -> Result<Vec<u8>, std::num::ParseIntError> {
    list.split(',').map(|count| count.trim().parse::<u8>()).collect()
}

fn print_biases_table(biases: &PhaseBiases) {
    println!("\n{}", "📡 HAS Phase Biases".bright_blue().bold());
    println!("{}", "═══════════════════".bright_blue());
    println!("Validity interval index: {}", biases.validity_interval_index.to_string().bright_cyan());

    for system in &biases.systems {
        println!("\n{} {}", "🛰️ ".bright_white(), system.gnss.name().bright_white().bold());
        println!("{}", "│ Sat │ Signal            │ Bias (m) │ Disc │".bright_white());
        for sat in &system.satellites {
            for sig in &sat.signals {
                println!(
                    "│ {:>3} │ {:<17} │ {:>8.2} │ {:>4} │",
                    sat.sat, sig.signal, sig.phase_bias, sig.discontinuity_indicator
                );
            }
        }
    }
}

fn print_biases_compact(biases: &PhaseBiases) {
    for system in &biases.systems {
        for sat in &system.satellites {
            for sig in &sat.signals {
                println!(
                    "{} {:02} {} {:.2} {}",
                    system.gnss, sat.sat, sig.signal, sig.phase_bias, sig.discontinuity_indicator
                );
            }
        }
    }
}

fn print_schema_table(schema: &FieldSchema) {
    println!("\n{}", "📐 Phase-bias field schema".bright_blue().bold());
    println!("{}", "══════════════════════════".bright_blue());
    for spec in schema.fields() {
        let sign = if spec.signed { "signed" } else { "unsigned" };
        println!(
            "{:<32} {:>2} bits {:<8} x{} {}",
            spec.key.to_string().bright_white(),
            spec.width,
            sign,
            spec.scale,
            spec.unit.symbol()
        );
    }
    println!("Total: {} fields, {} bits", schema.len().to_string().bright_cyan(), schema.bit_len());
}
