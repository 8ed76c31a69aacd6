//! Command-line front end for the cache browser console.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use cache_browser_api::{CacheApi, CacheApiClient, DynCacheApi};
use cache_browser_core::config::env_vars;
use cache_browser_core::event::FileSelected;
use cache_browser_core::preferences::WidthPreference;
use cache_browser_core::{ConsoleConfig, EventBus, FileKind, FileTreeModel};
use cache_browser_ui::components::top_nav::sort_namespaces;
use cache_browser_ui::{default_modules, Console, LoadOutcome};
use clap::{Parser, Subcommand};

/// Browse a cache service from the terminal.
#[derive(Parser, Debug)]
#[command(name = "cache-browser")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Console configuration file (TOML).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Cache service URL, overriding the configuration.
    #[arg(long, global = true)]
    base_url: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List namespaces, `default` first.
    Namespaces,
    /// Print the storage tree of a namespace.
    Tree {
        namespace: String,
        /// Only paths containing this text.
        #[arg(short, long)]
        filter: Option<String>,
    },
    /// Load one storage file through the content viewer.
    Show { namespace: String, path: String },
    /// List the cache ids of a namespace.
    Files { namespace: String },
    /// List the content hashes of a namespace.
    Hashes { namespace: String },
    /// Print the keyboard shortcuts of the running console.
    Shortcuts,
    /// Print the component registry and extension modules.
    Components,
    /// Show or set the remembered sidebar width.
    Width {
        #[arg(long, allow_negative_numbers = true)]
        set: Option<i64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging();

    let mut config = ConsoleConfig::load(args.config.as_deref()).context("loading configuration")?;
    if let Some(url) = args.base_url {
        config.base_url = url;
        config.validate()?;
    }

    match args.command {
        Command::Width { set } => width(&config, set),
        Command::Namespaces => namespaces(&client(&config, None)?).await,
        Command::Tree { namespace, filter } => {
            tree(&client(&config, None)?, &namespace, filter.as_deref()).await
        }
        Command::Files { namespace } => {
            let ids = client(&config, None)?.file_ids(&namespace).await?.strings();
            print_list(&ids);
            Ok(())
        }
        Command::Hashes { namespace } => {
            let hashes = client(&config, None)?.file_hashes(&namespace).await?.strings();
            print_list(&hashes);
            Ok(())
        }
        Command::Show { namespace, path } => show(config, &namespace, &path).await,
        Command::Shortcuts => shortcuts(config).await,
        Command::Components => components(config).await,
    }
}

fn init_logging() {
    let json_logging = std::env::var(env_vars::LOG_JSON)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(false);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("cache_browser=info,warn"));

    // Logs go to stderr so command output stays pipeable.
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .compact()
            .with_writer(std::io::stderr)
            .init();
    }
}

fn client(config: &ConsoleConfig, bus: Option<EventBus>) -> Result<CacheApiClient> {
    CacheApiClient::from_config(config, bus).context("creating cache API client")
}

/// Boot the full console with every shipped module.
async fn console(config: ConsoleConfig) -> Result<Console> {
    let bus = EventBus::with_name("cache-browser");
    let api: DynCacheApi = Arc::new(client(&config, Some(bus.clone()))?);
    let console = Console::on_bus(bus, config, api)
        .boot(default_modules())
        .await
        .context("starting console")?;
    Ok(console)
}

fn print_list(items: &[String]) {
    for item in items {
        println!("{item}");
    }
    eprintln!("{} item(s)", items.len());
}

async fn namespaces(api: &CacheApiClient) -> Result<()> {
    let namespaces = sort_namespaces(api.namespaces().await?.strings());
    print_list(&namespaces);
    Ok(())
}

async fn tree(api: &CacheApiClient, namespace: &str, filter: Option<&str>) -> Result<()> {
    let files = api.all_files(namespace).await?.strings_or_field("files");
    let mut model = FileTreeModel::from_paths(files);
    if let Some(text) = filter {
        model.set_filter(text);
    }
    model.expand_all();

    for row in model.visible_rows() {
        let indent = "  ".repeat(row.depth);
        if row.is_folder() {
            println!("{indent}{}/", row.name);
        } else {
            println!("{indent}{} [{}]", row.name, row.kind.as_str());
        }
    }
    let stats = model.stats();
    eprintln!("{} file(s): {} refs, {} data", stats.total, stats.refs, stats.data);
    Ok(())
}

async fn show(config: ConsoleConfig, namespace: &str, path: &str) -> Result<()> {
    let console = console(config).await?;
    let kind = FileKind::from_name(path);
    let request = FileSelected::new(path, kind.as_str(), Some(namespace.to_string()));

    let outcome = console.content_viewer().load_file(request).await;
    console.settle().await;
    match outcome {
        LoadOutcome::Loaded { content_type, size, .. } => {
            println!("{}", console.content_viewer().formatted_text());
            eprintln!("{content_type}, {size} bytes");
            if console.html_panel().has_content() {
                eprintln!("HTML detected ({})", console.html_panel().source_type());
            }
            eprintln!("Open: {}", console.api().file_content_link(path));
        }
        LoadOutcome::Failed { message } => bail!("failed to load {path}: {message}"),
        LoadOutcome::Skipped => bail!("{path} is a folder"),
        LoadOutcome::Superseded => bail!("load of {path} was superseded"),
    }
    console.teardown();
    Ok(())
}

async fn shortcuts(config: ConsoleConfig) -> Result<()> {
    let console = console(config).await?;
    for group in console.shortcuts().help_groups() {
        println!("{}", group.label);
        for entry in group.entries {
            println!("  {:<14} {}", entry.keys, entry.label);
        }
    }
    console.teardown();
    Ok(())
}

async fn components(config: ConsoleConfig) -> Result<()> {
    let console = console(config).await?;
    println!("version {}", console.version());

    let registry = console.registry();
    for (version, names) in registry.group_by_version() {
        println!("{version}");
        for name in names {
            println!("  {name}");
        }
    }

    println!("modules");
    for (module, outcome) in console.attach_report().outcomes {
        println!("  {module:<26} {outcome}");
    }
    console.teardown();
    Ok(())
}

fn width(config: &ConsoleConfig, set: Option<i64>) -> Result<()> {
    let preference = WidthPreference::at(config.preferences_path());
    match set {
        Some(width) => {
            let saved = preference.save(width)?;
            println!("{saved}");
        }
        None => match preference.load() {
            Some(width) => println!("{width}"),
            None => bail!("no saved width in {}", preference.path().display()),
        },
    }
    Ok(())
}
