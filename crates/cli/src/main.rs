use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, bail};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use owo_colors::OwoColorize;
use ranobe_core::{
    Collector, HttpRequestor, MarkdownConfig, Settings, SiteFormat, Title, TitleParser, TracingReporter, adapter_for,
    content_to_json, content_to_markdown, convert_chapter, fetch_file, fetch_stdin, title_from_json, title_to_json,
};
use tracing_subscriber::EnvFilter;

mod echo;

use echo::{
    format_size, print_banner, print_error, print_info, print_step, print_success, print_timing, print_title_summary,
    print_warning,
};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Scrape web novel titles into structured JSON documents
#[derive(Parser, Debug)]
#[command(name = "ranobe")]
#[command(author = "Ranobe Contributors")]
#[command(version)]
#[command(about = "Scrape web novel titles into structured JSON documents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Settings file (default: <config dir>/ranobe/settings.json)
    #[arg(long, global = true, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Page format of the site (legacy, modern)
    #[arg(long, global = true, value_name = "FORMAT")]
    format: Option<SiteFormat>,

    /// Site host name, e.g. ranobelib.me
    #[arg(long, global = true, value_name = "HOST")]
    site: Option<String>,

    /// Seconds to wait between requests
    #[arg(long, global = true, value_name = "SECS")]
    delay: Option<f64>,

    /// Drop the age rating tag from tag lists once it is read into the age limit
    #[arg(long, global = true)]
    pretty: bool,

    /// Write JSON on a single line instead of indenting it
    #[arg(long, global = true)]
    compact: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse titles with their chapters into JSON documents
    Parse {
        /// Title slugs, e.g. 7045--solo-leveling
        #[arg(value_name = "SLUG")]
        slugs: Vec<String>,

        /// File with one slug per line
        #[arg(short, long, value_name = "FILE")]
        collection: Option<PathBuf>,

        /// Parse again every title saved as JSON in the output directory
        #[arg(long, requires = "output")]
        local: bool,

        /// Skip slugs listed before this one
        #[arg(long, value_name = "SLUG")]
        from: Option<String>,

        /// Only enumerate chapters, leave their content empty
        #[arg(long)]
        no_amend: bool,

        /// Directory to write <slug>.json files into (default: stdout)
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,
    },

    /// Collect title slugs from the catalog
    Collect {
        /// Raw catalog query filters, e.g. "types[]=10&status[]=1"
        #[arg(long, value_name = "QUERY")]
        filters: Option<String>,

        /// Maximum number of catalog pages
        #[arg(long, value_name = "NUM")]
        pages: Option<u32>,

        /// Output file (default: stdout)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// List titles updated recently, optionally parsing them
    Update {
        /// Look-back window in hours
        #[arg(long, default_value = "24", value_name = "HOURS")]
        hours: u32,

        /// Parse every updated title instead of listing slugs
        #[arg(long)]
        amend: bool,

        /// Output file for slugs, or directory for parsed titles (default: stdout)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },

    /// Convert one chapter of a saved title again and update the file
    Repair {
        /// Title JSON written by `parse`
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// ID of the chapter to convert
        #[arg(long, value_name = "ID")]
        chapter: u64,
    },

    /// Convert a saved chapter fragment to content elements
    Convert {
        /// Local HTML file, or "-" for stdin
        #[arg(value_name = "INPUT")]
        input: String,

        /// Render Markdown instead of JSON
        #[arg(long)]
        markdown: bool,

        /// Output file (default: stdout)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Generate a shell completion script
    Completions {
        #[arg(value_name = "SHELL")]
        shell: Shell,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "ranobe_core=debug,ranobe=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).with_target(false).init();
}

/// Discovered settings with command-line overrides applied.
fn load_settings(cli: &Cli) -> anyhow::Result<Settings> {
    let mut settings = Settings::discover(cli.settings.as_deref()).context("Failed to load settings")?;

    if let Some(format) = cli.format {
        settings.format = format;
    }
    if let Some(site) = &cli.site {
        settings.site = site.clone();
    }
    if let Some(delay) = cli.delay {
        settings.delay = delay;
    }
    if cli.pretty {
        settings.pretty = true;
    }

    settings.validate().context("Invalid settings")?;
    Ok(settings)
}

fn write_output(path: Option<&Path>, output: &str) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            fs::write(path, output).with_context(|| format!("Failed to write to file: {}", path.display()))?;
            print_success(&format!("Output written to {}", path.display().bright_white()));
        }
        None => print!("{}", output),
    }
    Ok(())
}

fn read_title(path: &Path) -> anyhow::Result<Title> {
    let json = fs::read_to_string(path).with_context(|| format!("Failed to read title: {}", path.display()))?;
    title_from_json(&json).with_context(|| format!("Failed to load title: {}", path.display()))
}

/// Slugs of the titles saved in `dir`, in file name order.
fn local_slugs(dir: &Path) -> anyhow::Result<Vec<String>> {
    let entries = fs::read_dir(dir).with_context(|| format!("Failed to read directory: {}", dir.display()))?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            paths.push(path);
        }
    }
    paths.sort();

    let slugs = paths
        .iter()
        .map(|path| read_title(path).map(|title| title.slug))
        .collect::<anyhow::Result<Vec<_>>>()?;
    print_info(&format!("Found {} saved titles in {}", slugs.len(), dir.display()));
    Ok(slugs)
}

/// Slugs from arguments, the collection file and saved titles, starting at `from`.
fn gather_slugs(
    slugs: &[String], collection: Option<&Path>, local: Option<&Path>, from: Option<&str>,
) -> anyhow::Result<Vec<String>> {
    let mut all = slugs.to_vec();

    if let Some(path) = collection {
        let content =
            fs::read_to_string(path).with_context(|| format!("Failed to read collection: {}", path.display()))?;
        all.extend(
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .map(String::from),
        );
    }

    if let Some(dir) = local {
        all.extend(local_slugs(dir)?);
    }

    if let Some(from) = from {
        let Some(start) = all.iter().position(|slug| slug == from) else {
            bail!("Unable to find start slug {} in the list, all titles skipped", from);
        };
        if start > 0 {
            print_warning(&format!("Skipping {} titles before {}", start, from));
        }
        all.drain(..start);
    }

    Ok(all)
}

/// Parses each slug in turn; failures are reported and counted.
async fn parse_titles(
    parser: &TitleParser<HttpRequestor>, slugs: &[String], amend: bool, output: Option<&Path>, indent: bool,
    verbose: bool,
) -> anyhow::Result<()> {
    if let Some(dir) = output {
        fs::create_dir_all(dir).with_context(|| format!("Failed to create directory: {}", dir.display()))?;
    }

    let mut failed = 0;

    for (index, slug) in slugs.iter().enumerate() {
        if index > 0 {
            tokio::time::sleep(parser.settings().delay()).await;
        }
        print_step(index + 1, slugs.len(), &format!("Parsing {}", slug.bright_white()));

        let started = Instant::now();
        let title = match parser.parse_full(slug, amend).await {
            Ok(title) => title,
            Err(e) => {
                print_error(&format!("{}: {}", slug, e));
                failed += 1;
                continue;
            }
        };

        if verbose {
            print_title_summary(&title);
            print_timing("Elapsed", started.elapsed());
        }

        write_title(&title, indent, output)?;
    }

    if failed > 0 {
        bail!("{} of {} titles failed", failed, slugs.len());
    }
    Ok(())
}

fn write_title(title: &Title, indent: bool, dir: Option<&Path>) -> anyhow::Result<()> {
    let json = title_to_json(title, indent).context("Failed to serialize title")?;

    match dir {
        Some(dir) => {
            let path = dir.join(format!("{}.json", title.slug));
            fs::write(&path, &json).with_context(|| format!("Failed to write to file: {}", path.display()))?;
            print_success(&format!(
                "{} ({}) written to {}",
                title.slug,
                format_size(json.len()),
                path.display().bright_white()
            ));
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn requestor(settings: &Settings) -> anyhow::Result<HttpRequestor> {
    HttpRequestor::new(&settings.fetch_config()).context("Failed to build HTTP client")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Command::Completions { shell } = &cli.command {
        clap_complete::generate(*shell, &mut Cli::command(), "ranobe", &mut io::stdout());
        return Ok(());
    }

    let settings = load_settings(&cli)?;
    let indent = !cli.compact;

    if cli.verbose {
        print_banner();
        print_info(&format!("Site {} ({} format)", settings.site, settings.format));
        eprintln!();
    }

    match cli.command {
        Command::Parse { slugs, collection, local, from, no_amend, output } => {
            let local_dir = if local { output.as_deref() } else { None };
            let slugs = gather_slugs(&slugs, collection.as_deref(), local_dir, from.as_deref())?;
            if slugs.is_empty() {
                bail!("No titles to parse: pass slugs, --collection or --local");
            }

            let parser = TitleParser::new(requestor(&settings)?, settings, Arc::new(TracingReporter))
                .context("Failed to set up parser")?;
            parse_titles(&parser, &slugs, !no_amend, output.as_deref(), indent, cli.verbose).await?;
        }
        Command::Collect { filters, pages, output } => {
            let http = requestor(&settings)?;
            let adapter = adapter_for(settings.format, &settings.site)?;
            let collector = Collector::new(&http, adapter.as_ref(), &TracingReporter)
                .with_delay(settings.delay())
                .with_page_limit(pages.or(settings.page_limit));

            let slugs = collector.collect(filters.as_deref()).await.context("Failed to collect titles")?;
            print_info(&format!("Collected {} titles", slugs.len()));

            let mut text = slugs.join("\n");
            text.push('\n');
            write_output(output.as_deref(), &text)?;
        }
        Command::Update { hours, amend, output } => {
            let http = requestor(&settings)?;
            let adapter = adapter_for(settings.format, &settings.site)?;
            let collector = Collector::new(&http, adapter.as_ref(), &TracingReporter)
                .with_delay(settings.delay())
                .with_page_limit(settings.page_limit);

            let slugs = collector.updates(hours).await.context("Failed to collect updates")?;
            print_info(&format!("{} titles updated in the last {} hours", slugs.len(), hours));

            if amend {
                let parser = TitleParser::new(http, settings, Arc::new(TracingReporter))
                    .context("Failed to set up parser")?;
                parse_titles(&parser, &slugs, true, output.as_deref(), indent, cli.verbose).await?;
            } else {
                let mut text = slugs.join("\n");
                text.push('\n');
                write_output(output.as_deref(), &text)?;
            }
        }
        Command::Repair { file, chapter } => {
            let mut title = read_title(&file)?;

            let parser = TitleParser::new(requestor(&settings)?, settings, Arc::new(TracingReporter))
                .context("Failed to set up parser")?;
            parser
                .repair(&mut title, chapter)
                .await
                .with_context(|| format!("Failed to repair chapter {} of {}", chapter, title.slug))?;

            let json = title_to_json(&title, indent).context("Failed to serialize title")?;
            fs::write(&file, &json).with_context(|| format!("Failed to write to file: {}", file.display()))?;
            print_success(&format!(
                "Chapter {} of {} repaired in {}",
                chapter,
                title.slug,
                file.display().bright_white()
            ));
        }
        Command::Convert { input, markdown, output } => {
            let html = if input == "-" {
                fetch_stdin().context("Failed to read from stdin")?
            } else {
                fetch_file(&input).with_context(|| format!("Failed to read file: {}", input))?
            };

            if cli.verbose {
                eprintln!("  {} {}", "Size:".dimmed(), format_size(html.len()).bright_white());
            }

            let adapter = adapter_for(settings.format, &settings.site)?;
            let elements =
                convert_chapter(&html, adapter.as_ref(), None, &TracingReporter).context("Failed to convert chapter")?;

            let rendered = if markdown {
                let config = MarkdownConfig { include_title_heading: false, ..Default::default() };
                content_to_markdown(&elements, &config)
            } else {
                let mut json = content_to_json(&elements, indent).context("Failed to serialize content")?;
                json.push('\n');
                json
            };
            write_output(output.as_deref(), &rendered)?;
        }
        Command::Completions { .. } => {}
    }

    Ok(())
}
