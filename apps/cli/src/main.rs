use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use env_logger::Env;
use log::debug;
use uxprinter_printing::{
    ComponentSnapshot, DirectorySurfaceHost, PrintError, PrintManager, PrintOutcome,
    RendererId, RendererOverrides, StyleSheets, TimeoutFallback, TypeTagChain,
};
use uxprinter_settings::PrinterSettingsStore;

#[derive(Parser)]
#[command(
    name = "uxprinter-cli",
    about = "Render and print component snapshots as standalone documents",
    author,
    version
)]
struct Cli {
    /// 輸出除錯記錄。 / Emit debug logging on stderr.
    #[arg(long, short, global = true)]
    verbose: bool,

    /// 列印設定檔路徑。 / Printer settings file applied beneath command-line flags.
    #[arg(long, global = true, value_name = "PATH")]
    settings: Option<PathBuf>,

    /// 額外註冊渲染器（可重複）。 / Register a renderer for a type tag (repeatable).
    #[arg(
        long = "register",
        global = true,
        value_name = "TAG=ID",
        value_parser = parse_registration
    )]
    registrations: Vec<(String, String)>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 產生可列印文件。 / Generate the printable document for a snapshot.
    Render(RenderArgs),
    /// 執行完整列印流程並寫入資料夾。 / Run the full print lifecycle into a directory.
    Print(PrintArgs),
    /// 顯示型別標籤對應的渲染器。 / Show which renderer a type-tag chain resolves to.
    Resolve(ResolveArgs),
    /// 列出已註冊的渲染器。 / List renderer registrations.
    Renderers,
    /// 更新列印設定檔。 / Store printer defaults in the `--settings` file.
    Settings(SettingsArgs),
}

#[derive(Args)]
struct RenderArgs {
    /// 元件快照（JSON）。 / Component snapshot (JSON).
    #[arg(value_name = "SNAPSHOT")]
    snapshot: PathBuf,

    /// 輸出檔案；預設為標準輸出。 / Output file; defaults to stdout.
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,

    #[command(flatten)]
    overrides: OverrideArgs,
}

#[derive(Args)]
struct PrintArgs {
    /// 元件快照（JSON）。 / Component snapshot (JSON).
    #[arg(value_name = "SNAPSHOT")]
    snapshot: PathBuf,

    /// 列印文件輸出資料夾。 / Directory receiving one `<surface>.html` per print.
    #[arg(long, value_name = "DIR")]
    out_dir: PathBuf,

    #[command(flatten)]
    overrides: OverrideArgs,
}

#[derive(Args)]
struct ResolveArgs {
    /// 以 '/' 分隔的型別標籤。 / Slash-delimited type tags, most general first.
    #[arg(value_name = "XTYPES")]
    xtypes: String,
}

#[derive(Args)]
struct SettingsArgs {
    #[command(flatten)]
    overrides: OverrideArgs,

    /// 樣式檢查間隔（毫秒）。 / Delay between stylesheet readiness checks.
    #[arg(long, value_name = "MS")]
    poll_interval_ms: Option<u64>,

    /// 樣式檢查次數上限。 / Readiness checks before giving up.
    #[arg(long, value_name = "COUNT")]
    max_poll_attempts: Option<u32>,

    /// 逾時處理方式。 / What to do when stylesheets never finish applying.
    #[arg(long, value_enum, value_name = "MODE")]
    on_timeout: Option<TimeoutArg>,
}

#[derive(Clone, Copy, ValueEnum)]
enum TimeoutArg {
    Abort,
    PrintAnyway,
}

impl From<TimeoutArg> for TimeoutFallback {
    fn from(value: TimeoutArg) -> Self {
        match value {
            TimeoutArg::Abort => TimeoutFallback::Abort,
            TimeoutArg::PrintAnyway => TimeoutFallback::PrintAnyway,
        }
    }
}

impl SettingsArgs {
    fn to_overrides(&self) -> RendererOverrides {
        RendererOverrides {
            poll_interval_ms: self.poll_interval_ms,
            max_poll_attempts: self.max_poll_attempts,
            on_timeout: self.on_timeout.map(TimeoutFallback::from),
            ..self.overrides.to_overrides()
        }
    }
}

#[derive(Args, Default)]
struct OverrideArgs {
    /// 列印後保留輸出目標。 / Keep the surface open after printing.
    #[arg(long)]
    no_auto_close: bool,

    /// 文件 body 的 CSS 類別。 / CSS class applied to the document body.
    #[arg(long, value_name = "CLASS")]
    base_cls: Option<String>,

    /// 額外樣式表（可重複）。 / Additional stylesheet href (repeatable).
    #[arg(long = "style-sheet", value_name = "HREF")]
    style_sheets: Vec<String>,

    /// 文件類型宣告。 / Doctype declaration emitted first.
    #[arg(long, value_name = "DOCTYPE")]
    doc_type: Option<String>,
}

impl OverrideArgs {
    fn to_overrides(&self) -> RendererOverrides {
        RendererOverrides {
            auto_close: self.no_auto_close.then_some(false),
            base_cls: self.base_cls.clone(),
            style_sheets: (!self.style_sheets.is_empty())
                .then(|| StyleSheets::Many(self.style_sheets.clone())),
            doc_type: self.doc_type.clone(),
            ..RendererOverrides::default()
        }
    }
}

fn parse_registration(value: &str) -> Result<(String, String), String> {
    let (tag, id) = value
        .split_once('=')
        .ok_or_else(|| format!("expected TAG=ID, got '{value}'"))?;
    let (tag, id) = (tag.trim(), id.trim());
    if tag.is_empty() || id.is_empty() {
        return Err(format!("expected TAG=ID, got '{value}'"));
    }
    Ok((tag.to_string(), id.to_string()))
}

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    let manager = PrintManager::new();
    for (tag, id) in &cli.registrations {
        manager.register_renderer(tag.clone(), RendererId::from(id.clone()));
    }
    let stored = load_stored_overrides(cli.settings.as_deref())?;

    match cli.command {
        Commands::Render(args) => {
            let overrides = args.overrides.to_overrides().or(stored);
            handle_render(&manager, &args.snapshot, args.output.as_deref(), &overrides)
        }
        Commands::Print(args) => {
            let overrides = args.overrides.to_overrides().or(stored);
            handle_print(&manager, &args.snapshot, &args.out_dir, &overrides)
        }
        Commands::Resolve(args) => handle_resolve(&manager, &args.xtypes),
        Commands::Renderers => {
            handle_renderers(&manager);
            Ok(())
        }
        Commands::Settings(args) => {
            let path = cli
                .settings
                .as_deref()
                .ok_or_else(|| anyhow!("the settings command needs --settings PATH"))?;
            handle_settings(path, &args.to_overrides())
        }
    }
}

fn load_stored_overrides(path: Option<&Path>) -> Result<RendererOverrides> {
    let Some(path) = path else {
        return Ok(RendererOverrides::default());
    };
    let store = PrinterSettingsStore::load(path)?;
    debug!("printer settings loaded from {}", store.path().display());
    Ok(store.settings().to_overrides())
}

fn handle_settings(path: &Path, overrides: &RendererOverrides) -> Result<()> {
    let mut store = PrinterSettingsStore::load(path)?;
    if store.update(overrides)? {
        println!("Updated {}", store.path().display());
    } else {
        println!("{} is already up to date", store.path().display());
    }
    let rendered = serde_json::to_string_pretty(store.settings())
        .context("cannot display printer settings")?;
    println!("{rendered}");
    Ok(())
}

fn load_snapshot(path: &Path) -> Result<ComponentSnapshot> {
    ComponentSnapshot::from_path(path)
        .with_context(|| format!("cannot load snapshot {}", path.display()))
}

fn handle_render(
    manager: &PrintManager,
    snapshot: &Path,
    output: Option<&Path>,
    overrides: &RendererOverrides,
) -> Result<()> {
    let component = load_snapshot(snapshot)?;
    let document = manager
        .render(&component, overrides)
        .map_err(|err| match err {
            PrintError::NoRenderer(tags) => {
                anyhow!("'{}' cannot be printed: no renderer for '{tags}'", component.id)
            }
            other => anyhow!(other),
        })?;

    match output {
        Some(path) => {
            fs::write(path, &document)
                .with_context(|| format!("cannot write {}", path.display()))?;
            println!("Rendered '{}' to {}", component.id, path.display());
        }
        None => println!("{document}"),
    }
    Ok(())
}

fn handle_print(
    manager: &PrintManager,
    snapshot: &Path,
    out_dir: &Path,
    overrides: &RendererOverrides,
) -> Result<()> {
    let component = load_snapshot(snapshot)?;
    let host = DirectorySurfaceHost::new(out_dir);
    let outcome = manager.print(&component, overrides, &host);
    match &outcome {
        PrintOutcome::Printed {
            surface, forced, ..
        } => {
            println!(
                "Printed '{}' to {}{}",
                component.id,
                host.path_for(surface).display(),
                if *forced { " (styles not confirmed)" } else { "" }
            );
            Ok(())
        }
        other => bail!("'{}' was not printed: {}", component.id, describe(other)),
    }
}

fn describe(outcome: &PrintOutcome) -> String {
    match outcome {
        PrintOutcome::Printed { surface, .. } => format!("printed to surface '{surface}'"),
        PrintOutcome::NoRenderer => "no renderer registered for its type tags".to_string(),
        PrintOutcome::MissingFactory(id) => format!("renderer '{id}' is not available"),
        PrintOutcome::RenderFailed(reason) => format!("rendering failed: {reason}"),
        PrintOutcome::SurfaceUnavailable { surface } => {
            format!("surface '{surface}' could not be opened")
        }
        PrintOutcome::SurfaceLost { surface } => {
            format!("surface '{surface}' was lost before printing")
        }
        PrintOutcome::TimedOut { surface } => {
            format!("stylesheets for '{surface}' never finished applying")
        }
    }
}

fn handle_resolve(manager: &PrintManager, xtypes: &str) -> Result<()> {
    let chain = TypeTagChain::parse(xtypes).ok_or_else(|| anyhow!("no type tags given"))?;
    let registry = manager.registry();
    let (tag, renderer) = registry
        .resolve(&chain)
        .ok_or_else(|| anyhow!("no renderer registered for '{chain}'"))?;
    println!("{tag} -> {renderer}");
    Ok(())
}

fn handle_renderers(manager: &PrintManager) {
    let registry = manager.registry();
    println!("Registered renderers:");
    for (tag, renderer) in registry.entries() {
        println!("  - {tag} -> {renderer}");
    }
}
