use clap::Parser;
use log::{debug, error, info};
use smartmeter_p1::{line_source::SourceError, output, Config, LineSource, OutputMode, P1Manager};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "read_p1", about = "Read telegrams from the P1 port of a smart meter")]
struct Args {
    /// Location of the configuration file [default: smartmeter.yaml]
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// How many telegrams should be read, 0 is unlimited
    #[arg(short, long, default_value_t = 1)]
    telegrams: u32,

    /// Show more verbose logging (debug)
    #[arg(short, long)]
    verbose: bool,

    /// Output mode, overrides the config file
    #[arg(short, long, value_parser = parse_output_mode)]
    output: Option<OutputMode>,

    /// Serial preset for a known meter (iskra_mt382, dsmr4)
    #[arg(short, long)]
    meter: Option<String>,

    /// Replay lines from a file instead of the serial port, "-" reads stdin
    #[arg(short, long)]
    input: Option<PathBuf>,
}

fn parse_output_mode(s: &str) -> Result<OutputMode, String> {
    match s {
        "json" => Ok(OutputMode::Json),
        "log" => Ok(OutputMode::Log),
        _ => Err(format!("unknown output mode '{}', use json or log", s)),
    }
}

async fn open_source(args: &Args, config: &Config) -> Result<LineSource, SourceError> {
    match &args.input {
        Some(path) if path.as_os_str() == "-" => Ok(LineSource::stdin()),
        Some(path) => LineSource::open_file(path).await,
        #[cfg(feature = "serial")]
        None => LineSource::open_serial(&config.p1),
        #[cfg(not(feature = "serial"))]
        None => {
            let _ = config;
            Err(SourceError::Io(std::io::Error::new(
                std::io::ErrorKind::Unsupported,
                "built without serial support, use --input",
            )))
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize logging
    let mut default_filter = std::env::var("P1_LOG_LEVEL").unwrap_or("info".to_string());
    if args.verbose {
        default_filter = "debug".to_string();
    }
    env_logger::init_from_env(env_logger::Env::new().default_filter_or(default_filter));

    let mut config = match Config::resolve(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };
    if let Some(meter) = &args.meter {
        if let Err(e) = config.apply_template(meter) {
            error!("{}", e);
            std::process::exit(1);
        }
    }
    let mode = args.output.unwrap_or(config.output.mode);
    debug!("Config: {:?}", config);

    let source = match open_source(&args, &config).await {
        Ok(source) => source,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    let (tx, mut rx) = tokio::sync::mpsc::channel(10);
    let mut manager = P1Manager::new(tx);
    let limit = args.telegrams;
    let reader = tokio::spawn(async move { manager.start_thread(source, limit).await });

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut telegram_list = Vec::new();
    loop {
        tokio::select! {
            completed = rx.recv() => match completed {
                Some(completed) => {
                    output::emit(&completed, mode);
                    telegram_list.push(completed.raw_lines);
                }
                None => break,
            },
            _ = &mut ctrl_c => {
                error!("Interrupted by keyboard");
                reader.abort();
                break;
            }
        }
    }

    debug!("Telegram list:\n{:?}", telegram_list);

    match reader.await {
        Ok(Ok(count)) => info!("Read {} telegrams, closing connection", count),
        Ok(Err(e)) => {
            error!("{}", e);
            std::process::exit(1);
        }
        Err(e) if e.is_cancelled() => info!("Closing connection"),
        Err(e) => {
            error!("Reader task failed: {}", e);
            std::process::exit(1);
        }
    }
}
