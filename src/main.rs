mod aggregate;
mod cli;
mod crawler;
mod error;
mod fmt;
mod importer;
mod models;
mod normalize;
mod orders;
mod pipeline;
mod reports;
mod settings;
mod store;

use clap::Parser;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging();

    let command = cli.command.unwrap_or(Commands::Update {
        data_dir: None,
        price_policy: None,
    });

    let result = match command {
        Commands::Init {
            data_dir,
            price_policy,
        } => cli::init::run(data_dir, price_policy),
        Commands::Update {
            data_dir,
            price_policy,
        } => cli::update::run(data_dir, price_policy),
        Commands::Concat { data_dir } => cli::concat::run(data_dir),
        Commands::Report { data_dir } => cli::report::run(data_dir),
        Commands::Crawl {
            data_dir,
            combined,
            output,
            limit,
            sleep,
            download_images,
            image_dir,
            html_output,
        } => cli::crawl::run(cli::crawl::CrawlArgs {
            data_dir,
            combined,
            output,
            limit,
            sleep,
            download_images,
            image_dir,
            html_output,
        }),
        Commands::Status { data_dir } => cli::status::run(data_dir),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
