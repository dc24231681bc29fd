use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use log::{error, info, warn};
use simplelog::{Config, LevelFilter, WriteLogger};

use pdftool::panic_handler;
use pdftool::pdf::{DrawOutcome, MupdfDocument, Point, Size, Viewer, writer};
use pdftool::settings;

/// Viewport used for driving the viewer without a window
const VIEWPORT: Size = Size::new(1200.0, 900.0);

/// A rectangle drawn on a page: `PAGE:X,Y,W,H` in on-screen pixels
/// relative to the page's top-left corner, page numbers 1-based
#[derive(Clone, Debug, PartialEq)]
struct RedactArg {
    page: usize,
    x: f32,
    y: f32,
    width: f32,
    height: f32,
}

impl FromStr for RedactArg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (page, rect) = s
            .split_once(':')
            .ok_or_else(|| format!("expected PAGE:X,Y,W,H, got {s:?}"))?;
        let page: usize = page
            .trim()
            .parse()
            .map_err(|e| format!("bad page {page:?}: {e}"))?;
        if page == 0 {
            return Err("pages are numbered from 1".to_string());
        }
        let values = rect
            .split(',')
            .map(|v| v.trim().parse::<f32>().map_err(|e| format!("bad number {v:?}: {e}")))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let [x, y, width, height] = values[..] else {
            return Err(format!("expected four numbers, got {}", values.len()));
        };
        Ok(Self {
            page: page - 1,
            x,
            y,
            width,
            height,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "pdftool")]
#[command(about = "Inspect, search and redact PDF documents")]
struct Cli {
    /// PDF file to open
    file: PathBuf,

    /// Page to show first (1-based)
    #[arg(long)]
    page: Option<usize>,

    /// Zoom factor
    #[arg(long)]
    scale: Option<f32>,

    /// Search the document for this text
    #[arg(long)]
    search: Option<String>,

    /// Step through this many search results
    #[arg(long, default_value_t = 1)]
    next: usize,

    /// Redact PAGE:X,Y,W,H (pixels on the displayed page); repeatable
    #[arg(long = "redact")]
    redact: Vec<RedactArg>,

    /// Write the redacted PDF here
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Read redactions from this JSON file if it exists, then write all
    /// redactions back to it
    #[arg(long)]
    redactions_json: Option<PathBuf>,

    /// Render this page (1-based) to the file given by --png
    #[arg(long, requires = "png")]
    dump_page: Option<usize>,

    /// Destination of --dump-page
    #[arg(long, requires = "dump_page")]
    png: Option<PathBuf>,

    /// Settings file to use instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log verbosity written to pdftool.log
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    WriteLogger::init(cli.log_level.into(), Config::default(), File::create("pdftool.log")?)?;
    panic_handler::initialize_panic_handler();

    info!("Starting pdftool");

    match &cli.config {
        Some(path) => settings::load_settings_from_path(path),
        None => settings::load_settings(),
    }

    let result = run(&cli);
    if let Err(e) = &result {
        error!("Application error: {e:?}");
    }
    info!("Shutting down pdftool");
    result
}

fn run(cli: &Cli) -> Result<()> {
    let mut config = settings::viewer_config();
    if let Some(scale) = cli.scale {
        config.default_scale = config.zoom.clamp_factor(scale);
    }

    let bytes = fs::read(&cli.file).with_context(|| format!("reading {}", cli.file.display()))?;
    let document = MupdfDocument::from_bytes(&bytes)?;

    let mut viewer = Viewer::new(config, VIEWPORT);
    let update = viewer.load(Box::new(document))?;
    report_failures(&update.failed);

    if let Some(page) = cli.page {
        let update = viewer.go_to_page(page.saturating_sub(1))?;
        report_failures(&update.failed);
    }

    if let Some(path) = &cli.redactions_json {
        if path.exists() {
            let restored = writer::read_sidecar(path)?;
            println!("Restored {} redactions from {}", restored.len(), path.display());
            for redaction in restored {
                viewer.redactions_mut().insert(redaction);
            }
        }
    }

    if let Some(query) = &cli.search {
        run_search(&mut viewer, query, cli.next);
    }

    for arg in &cli.redact {
        draw_redaction(&mut viewer, arg)?;
    }

    if let (Some(page), Some(png)) = (cli.dump_page, &cli.png) {
        dump_page(&mut viewer, page.saturating_sub(1), png)?;
    }

    let all = viewer.redactions().all();
    if let Some(path) = &cli.redactions_json {
        writer::write_sidecar(all, path)?;
        println!("Wrote {} redactions to {}", viewer.redactions().len(), path.display());
    }
    if let Some(output) = &cli.output {
        writer::save_redacted(&bytes, all, output)?;
        println!("Saved {}", output.display());
    }

    println!("{}", viewer.page_label());
    Ok(())
}

fn report_failures(pages: &[usize]) {
    for page in pages {
        println!("Page {} could not be rendered", page + 1);
    }
}

fn run_search(viewer: &mut Viewer, query: &str, steps: usize) {
    let results = viewer.search(query);
    for r in results {
        println!(
            "page {}: {:?} at ({:.1}, {:.1})",
            r.page + 1,
            r.text,
            r.rect.x,
            r.rect.y
        );
    }
    if results.is_empty() {
        if let Some(status) = viewer.search_status() {
            println!("{status}");
        }
        return;
    }
    for _ in 0..steps {
        viewer.search_next();
    }
    if let Some(status) = viewer.search_status() {
        println!("Result {status}, {}", viewer.page_label());
    }
}

/// Replays a press/drag/release over the requested page
fn draw_redaction(viewer: &mut Viewer, arg: &RedactArg) -> Result<()> {
    viewer.go_to_page(arg.page)?;
    let page_rect = viewer.overlay()?.page_rect;
    let start = Point::new(page_rect.x + arg.x, page_rect.y + arg.y);
    let end = Point::new(start.x + arg.width, start.y + arg.height);

    if !viewer.begin_draw(start)? {
        bail!("redaction start ({}, {}) is not on page {}", arg.x, arg.y, arg.page + 1);
    }
    viewer.update_draw(end);
    match viewer.end_draw(end)? {
        DrawOutcome::Committed(r) => {
            info!("Redacted page {} at {:?}", r.page + 1, r.rect);
            println!(
                "Redacted page {}: ({:.1}, {:.1}) {:.1}x{:.1}",
                r.page + 1,
                r.rect.x,
                r.rect.y,
                r.rect.width,
                r.rect.height
            );
        }
        DrawOutcome::Discarded(reason) => {
            warn!("Redaction on page {} discarded: {reason:?}", arg.page + 1);
            println!("Redaction on page {} discarded: {reason:?}", arg.page + 1);
        }
    }
    Ok(())
}

fn dump_page(viewer: &mut Viewer, page: usize, png: &Path) -> Result<()> {
    viewer.go_to_page(page)?;
    let entry = viewer
        .cache()
        .and_then(|c| c.entry(page))
        .context("page is not in the render window")?;
    let Some(raster) = entry.pixels() else {
        bail!(
            "page {} was not rendered: {}",
            page + 1,
            entry.failure().unwrap_or("unknown error")
        );
    };
    let image = image::RgbImage::from_raw(raster.width_px, raster.height_px, raster.pixels.clone())
        .context("raster size does not match its pixel data")?;
    image.save(png)?;
    println!(
        "Wrote page {} ({}x{}) to {}",
        page + 1,
        raster.width_px,
        raster.height_px,
        png.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_redact_argument() {
        let arg: RedactArg = "2:10,20.5,30,40".parse().unwrap();
        assert_eq!(
            arg,
            RedactArg {
                page: 1,
                x: 10.0,
                y: 20.5,
                width: 30.0,
                height: 40.0
            }
        );
    }

    #[test]
    fn rejects_malformed_redact_argument() {
        assert!("10,20,30,40".parse::<RedactArg>().is_err());
        assert!("0:1,2,3,4".parse::<RedactArg>().is_err());
        assert!("1:1,2,3".parse::<RedactArg>().is_err());
        assert!("1:a,2,3,4".parse::<RedactArg>().is_err());
    }

    #[test]
    fn log_level_is_validated() {
        let cli = Cli::try_parse_from(["pdftool", "a.pdf", "--log-level", "debug"]).unwrap();
        assert_eq!(LevelFilter::from(cli.log_level), LevelFilter::Debug);

        let cli = Cli::try_parse_from(["pdftool", "a.pdf"]).unwrap();
        assert_eq!(cli.log_level, LogLevel::Info);

        assert!(Cli::try_parse_from(["pdftool", "a.pdf", "--log-level", "loud"]).is_err());
    }

    #[test]
    fn cli_is_well_formed() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
