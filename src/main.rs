use clap::{ArgAction, Parser, Subcommand};
use f2b_config::Config;
use f2b_fonts::{encode_many_to_data_src_async, encode_many_to_data_url_async};
use f2b_inject::{Injection, inject_base64_async};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "font2base64", version)]
#[command(about = "Inline local font files into stylesheets as base64 data URIs")]
struct Args {
    /// Configuration file (TOML, YAML or JSON), layered over the user config
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Match url() paths by resolved full path instead of file name
    #[arg(long, global = true)]
    fullpath: bool,

    /// Font extensions to scan for, e.g. --font-type .woff2 (repeatable)
    #[arg(long = "font-type", value_name = "EXT", global = true)]
    font_types: Vec<String>,

    /// Stylesheet extensions to scan for, e.g. --css-type .css (repeatable)
    #[arg(long = "css-type", value_name = "EXT", global = true)]
    css_types: Vec<String>,

    /// More logging (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the CSS data source of each font file, one per line
    Encode {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Print bare data URLs instead of `url(...) format(...)` sources
        #[arg(long)]
        url: bool,
    },
    /// Rewrite @font-face src entries of stylesheets to embed fonts
    Inject {
        /// Font file or directory
        fonts: PathBuf,

        /// Stylesheet files or directories
        #[arg(required = true)]
        stylesheets: Vec<PathBuf>,

        /// Print rewritten stylesheets instead of saving them
        #[arg(long)]
        dry_run: bool,
    },
}

impl Args {
    /// Layered configuration with command-line overrides applied on top.
    fn config(&self) -> f2b_config::error::Result<Config> {
        self.apply(Config::load(self.config.as_deref())?)
    }

    fn apply(&self, mut config: Config) -> f2b_config::error::Result<Config> {
        if self.fullpath {
            config.fullpath_match = true;
        }
        if !self.font_types.is_empty() {
            config.font_types = self.font_types.clone();
        }
        if !self.css_types.is_empty() {
            config.css_types = self.css_types.clone();
        }
        config.validate()?;
        Ok(config)
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::builder().with_default_directive(level.into()).from_env_lossy())
        .init();
}

async fn encode(files: &[PathBuf], url: bool) -> bool {
    let mut success = true;
    if url {
        for (file, result) in files.iter().zip(encode_many_to_data_url_async(files).await) {
            match result {
                Ok(data_url) => println!("{data_url}"),
                Err(err) => {
                    tracing::error!(path = %file.display(), error = ?err, "Cannot encode font");
                    success = false;
                },
            }
        }
    } else {
        for (file, result) in files.iter().zip(encode_many_to_data_src_async(files).await) {
            match result {
                Ok(Some(data_src)) => println!("{data_src}"),
                Ok(None) => {
                    tracing::error!(path = %file.display(), "Unknown font type");
                    success = false;
                },
                Err(err) => {
                    tracing::error!(path = %file.display(), error = ?err, "Cannot encode font");
                    success = false;
                },
            }
        }
    }
    success
}

async fn inject(fonts: &Path, stylesheets: &[PathBuf], dry_run: bool, config: Config) -> bool {
    let resave = config.resave && !dry_run;
    let options = config.into_options().with_resave(resave);
    let injection = inject_base64_async([fonts], stylesheets, &options).await;
    if let Injection::Results(results) = &injection {
        for result in results.iter().flatten().filter(|result| result.modified) {
            let path = result.filepath.as_deref().unwrap_or(Path::new("-"));
            println!("/* {} */\n{}", path.display(), result.content);
        }
    }
    let failed = injection.failures().len();
    if failed > 0 {
        tracing::error!(failed, "Some stylesheets could not be processed");
    }
    failed == 0
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);
    tracing::debug!(?args, "Starting font2base64");

    let success = match &args.command {
        Command::Encode { files, url } => encode(files, *url).await,
        Command::Inject { fonts, stylesheets, dry_run } => match args.config() {
            Ok(config) => inject(fonts, stylesheets, *dry_run, config).await,
            Err(err) => {
                tracing::error!(error = ?err, "Invalid configuration");
                false
            },
        },
    };
    match success {
        true => ExitCode::SUCCESS,
        false => ExitCode::FAILURE,
    }
}
