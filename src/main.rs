//! eds-json - Convert block-authored HTML pages to JSON

use std::io::Read;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use eds_json::{
    Context, DirectorySource, Document, Error, MemorySource, ResolverConfig, Result,
    SchemaResolver, SchemaSource, render,
};

#[derive(Parser)]
#[command(name = "eds-json")]
#[command(version, about = "Convert block-authored HTML pages to JSON", long_about = None)]
#[command(after_help = "EXAMPLES:
    eds-json page.html                          Generic content JSON
    eds-json --schema page.html                 Schema-driven JSON
    eds-json --html page.html                   Role-annotated HTML
    eds-json --page /org/site/products?schema=true
                                                Fetch and convert a live page")]
struct Cli {
    /// Input HTML file, or `-` for stdin
    #[arg(value_name = "INPUT", required_unless_present = "page")]
    input: Option<String>,

    /// Fetch a page by request path: /org/site/path?preview=true&schema=true...
    #[arg(long, value_name = "REQUEST", conflicts_with = "input")]
    page: Option<String>,

    /// Extract with block schemas
    #[arg(long)]
    schema: bool,

    /// Output role-annotated HTML instead of JSON
    #[arg(long)]
    html: bool,

    /// Schema root: a directory or an http(s) base URL (default: the page's
    /// site with --page, bundled schemas otherwise)
    #[arg(long, value_name = "DIR|URL")]
    schemas: Option<String>,

    /// Additional supported block name
    #[arg(long = "block", value_name = "NAME")]
    blocks: Vec<String>,

    /// Additional supported base element tag
    #[arg(long = "base-element", value_name = "TAG")]
    base_elements: Vec<String>,

    /// Transformer applied to generic output (flatten, strip-metadata, compact)
    #[arg(long = "transform", value_name = "NAME")]
    transformers: Vec<String>,

    /// Log debug output to stderr
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    match run(cli).await {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(cli: &Cli) {
    let default = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<String> {
    let mut ctx = match (&cli.input, &cli.page) {
        (_, Some(request)) => Context::from_request_url(request)?,
        (Some(_), None) => Context::new("", ""),
        (None, None) => {
            return Err(Error::InvalidRequest(
                "either INPUT or --page is required".to_string(),
            ));
        }
    };
    ctx.use_schema |= cli.schema;
    ctx.html |= cli.html;
    ctx.transformers.extend(cli.transformers.iter().cloned());

    let mut config = ResolverConfig::default();
    for name in &cli.blocks {
        config = config.with_block(name.as_str());
    }
    for tag in &cli.base_elements {
        config = config.with_base_element(tag.as_str());
    }
    let resolver = SchemaResolver::with_source(schema_source(&cli, &ctx)?).with_config(config);

    let doc = match &cli.input {
        Some(input) => read_input(input).await?,
        None => fetch(&ctx).await?,
    };

    render(&doc, &ctx, &resolver).await?.to_text()
}

/// Schemas come from `--schemas` when given. Fetched pages default to the
/// schemas published on their own site; local input uses the bundled set.
fn schema_source(cli: &Cli, ctx: &Context) -> Result<Arc<dyn SchemaSource>> {
    match (cli.schemas.as_deref(), &cli.page) {
        (Some(root), _) if root.starts_with("http://") || root.starts_with("https://") => {
            http_source(root)
        }
        (Some(root), _) => Ok(Arc::new(DirectorySource::new(root))),
        (None, Some(_)) => http_source(&ctx.eds_domain_url()),
        (None, None) => Ok(Arc::new(MemorySource::builtin())),
    }
}

#[cfg(feature = "http")]
fn http_source(base: &str) -> Result<Arc<dyn SchemaSource>> {
    let timeout = std::time::Duration::from_secs(30);
    Ok(Arc::new(eds_json::HttpSource::with_timeout(base, timeout)?))
}

#[cfg(not(feature = "http"))]
fn http_source(_base: &str) -> Result<Arc<dyn SchemaSource>> {
    Err(Error::InvalidRequest(
        "schema URLs need the `http` feature".to_string(),
    ))
}

async fn read_input(input: &str) -> Result<Document> {
    let bytes = if input == "-" {
        let mut bytes = Vec::new();
        std::io::stdin().read_to_end(&mut bytes)?;
        bytes
    } else {
        tokio::fs::read(input).await?
    };
    Ok(Document::parse_bytes(&bytes))
}

#[cfg(feature = "http")]
async fn fetch(ctx: &Context) -> Result<Document> {
    let client = reqwest::Client::new();
    eds_json::fetch_page(&client, ctx).await
}

#[cfg(not(feature = "http"))]
async fn fetch(_ctx: &Context) -> Result<Document> {
    Err(Error::InvalidRequest(
        "--page needs the `http` feature".to_string(),
    ))
}
