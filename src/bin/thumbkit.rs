use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand, ValueEnum};

use thumbkit::{
    AssetCategory, BatchRequest, ImageRef, ResourceCache, ResourceCacheOpts, StyleConfiguration,
    ThumbnailGenerator,
};

#[derive(Parser, Debug)]
#[command(name = "thumbkit", version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a single thumbnail as a PNG.
    Render(RenderArgs),
    /// Render a numbered batch of PNGs into a directory.
    Batch(BatchArgs),
    /// List asset names in the resource directory.
    List(ListArgs),
    /// Print the default style as JSON.
    StyleTemplate,
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Resource directory holding backgrounds/, patterns/ and fonts/.
    #[arg(long, default_value = "resources")]
    resources: PathBuf,

    /// Style JSON file; defaults apply when omitted.
    #[arg(long)]
    style: Option<PathBuf>,

    /// Image file used as the background instead of a catalog image.
    #[arg(long)]
    background: Option<PathBuf>,

    /// Text template; `^` is replaced by the sequence number.
    #[arg(long, default_value = "Week ^ Overview")]
    text: String,

    /// Canvas width.
    #[arg(long, default_value_t = 1280)]
    width: u32,

    /// Canvas height.
    #[arg(long, default_value_t = 720)]
    height: u32,
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Sequence number.
    #[arg(long, default_value_t = 1)]
    number: i64,

    /// Output PNG path; defaults to `<filename>.png` in the current directory.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct BatchArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// First sequence number.
    #[arg(long, default_value_t = 1)]
    start: i64,

    /// Number of thumbnails.
    #[arg(long, default_value_t = 1)]
    count: u32,

    /// Filename template overriding the style's.
    #[arg(long)]
    filename: Option<String>,

    /// Override rayon worker threads.
    #[arg(long)]
    threads: Option<usize>,

    /// Output directory.
    #[arg(long)]
    out_dir: PathBuf,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Category {
    Backgrounds,
    Patterns,
    Fonts,
}

impl From<Category> for AssetCategory {
    fn from(c: Category) -> Self {
        match c {
            Category::Backgrounds => AssetCategory::Backgrounds,
            Category::Patterns => AssetCategory::Patterns,
            Category::Fonts => AssetCategory::Fonts,
        }
    }
}

#[derive(Args, Debug)]
struct ListArgs {
    /// Resource directory.
    #[arg(long, default_value = "resources")]
    resources: PathBuf,

    /// Only this category; all when omitted.
    #[arg(long, value_enum)]
    category: Option<Category>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Batch(args) => cmd_batch(args),
        Command::List(args) => cmd_list(args),
        Command::StyleTemplate => cmd_style_template(),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_style(common: &CommonArgs, resources: &ResourceCache) -> anyhow::Result<StyleConfiguration> {
    let mut style = match &common.style {
        Some(path) => {
            let s = std::fs::read_to_string(path)
                .with_context(|| format!("read style '{}'", path.display()))?;
            StyleConfiguration::from_json(&s)?
        }
        None => StyleConfiguration::default(),
    };
    if let Some(path) = &common.background {
        let bytes = std::fs::read(path)
            .with_context(|| format!("read background '{}'", path.display()))?;
        style.background_image = Some(ImageRef::Uploaded(resources.decode_upload(&bytes)?));
    }
    Ok(style)
}

fn generator(root: &Path) -> ThumbnailGenerator {
    ThumbnailGenerator::new(Arc::new(ResourceCache::new(ResourceCacheOpts::new(root))))
}

fn write_file(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(path, bytes).with_context(|| format!("write png '{}'", path.display()))
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let thumbs = generator(&args.common.resources);
    let style = load_style(&args.common, thumbs.resources())?;
    let (png, name) = thumbs.render_png(
        &style,
        &args.common.text,
        args.number,
        args.common.width,
        args.common.height,
    )?;

    let out = match args.out {
        Some(out) => out,
        None => {
            anyhow::ensure!(
                !name.contains(['/', '\\']),
                "output filename '{name}' must not contain path separators; pass --out instead"
            );
            PathBuf::from(format!("{name}.png"))
        }
    };
    write_file(&out, &png)?;
    eprintln!("wrote {}", out.display());
    Ok(())
}

fn cmd_batch(args: BatchArgs) -> anyhow::Result<()> {
    let thumbs = generator(&args.common.resources);
    let style = load_style(&args.common, thumbs.resources())?;
    let req = BatchRequest {
        text_template: args.common.text.clone(),
        filename_template: args.filename.clone(),
        start: args.start,
        count: args.count,
        width: args.common.width,
        height: args.common.height,
        threads: args.threads,
    };

    let entries = thumbs.generate_batch(&style, &req)?;
    for entry in &entries {
        write_file(&args.out_dir.join(&entry.filename), &entry.png)?;
    }
    eprintln!(
        "wrote {} thumbnails to {}",
        entries.len(),
        args.out_dir.display()
    );
    Ok(())
}

fn cmd_list(args: ListArgs) -> anyhow::Result<()> {
    let cache = ResourceCache::new(ResourceCacheOpts::new(&args.resources));
    let categories: Vec<AssetCategory> = match args.category {
        Some(c) => vec![c.into()],
        None => AssetCategory::ALL.to_vec(),
    };
    for category in categories {
        println!("{}:", category.dir_name());
        for name in cache.list_names(category) {
            println!("  {name}");
        }
    }
    Ok(())
}

fn cmd_style_template() -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(&StyleConfiguration::default())
        .context("serialize default style")?;
    println!("{json}");
    Ok(())
}
