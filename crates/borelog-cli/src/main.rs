mod commands;
mod output;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "borelog",
    version,
    about = "Extract borehole log data (header, layers, SPT blow counts) from log sheets"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Where the page comes from and how it is tuned.
#[derive(Args)]
pub struct PageArgs {
    /// Path to a PDF log, or an already-rendered page image (PNG/JPEG)
    pub input_file: PathBuf,

    /// 1-based page number
    #[arg(short, long, default_value_t = 1)]
    pub page: u32,

    /// Session file holding the ROIs of each page
    #[arg(short, long = "rois", value_name = "FILE", default_value = "borelog-session.json")]
    pub rois: PathBuf,

    /// Depth in feet at the bottom of the description ROI
    #[arg(short = 'd', long)]
    pub total_depth: Option<f64>,

    /// JSON configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Text runs JSON (document coordinates); replaces the PDF text layer
    #[arg(long, value_name = "FILE")]
    pub text_runs: Option<PathBuf>,

    /// Image input: scale from text-run coordinates to pixels.
    /// PDF input: render scale (72 dpi = 1.0)
    #[arg(long)]
    pub scale: Option<f64>,

    /// Luminance below which a pixel counts as ink
    #[arg(long)]
    pub ink_threshold: Option<u8>,

    /// Fraction of a row that must be ink for it to be a divider
    #[arg(long)]
    pub row_ink_ratio: Option<f64>,

    /// Minimum vertical distance between dividers, in pixels
    #[arg(long)]
    pub min_gap: Option<f64>,

    /// Minimum layer thickness in feet
    #[arg(long)]
    pub min_thickness: Option<f64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the boring record of one page
    Extract {
        #[command(flatten)]
        page: PageArgs,

        /// OCR language code
        #[arg(long)]
        lang: Option<String>,

        /// Tesseract page segmentation mode
        #[arg(long)]
        psm: Option<u8>,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,

        /// Write the result to a JSON file
        #[arg(short = 'O', long = "out", value_name = "FILE")]
        out: Option<PathBuf>,

        /// Store the result in the session file
        #[arg(long)]
        save: bool,
    },
    /// Show detected dividers and layer intervals without running OCR
    Lines {
        #[command(flatten)]
        page: PageArgs,
    },
    /// Manage the regions of interest of a page
    Roi {
        #[command(subcommand)]
        action: RoiAction,
    },
    /// Print the default configuration as JSON
    Config,
}

#[derive(Subcommand)]
enum RoiAction {
    /// Set (or replace) an ROI, in page pixels
    Set {
        /// ROI kind: header, description or spt
        kind: String,
        x: f64,
        y: f64,
        w: f64,
        h: f64,

        /// 1-based page number
        #[arg(short, long, default_value_t = 1)]
        page: u32,

        /// Session file
        #[arg(short, long = "rois", value_name = "FILE", default_value = "borelog-session.json")]
        rois: PathBuf,

        /// Page image used to clamp the ROI to the page
        #[arg(long, value_name = "FILE")]
        image: Option<PathBuf>,
    },
    /// Clear one ROI kind, or all ROIs of a page
    Clear {
        /// ROI kind to clear (all kinds when omitted)
        kind: Option<String>,

        /// 1-based page number
        #[arg(short, long, default_value_t = 1)]
        page: u32,

        /// Session file
        #[arg(short, long = "rois", value_name = "FILE", default_value = "borelog-session.json")]
        rois: PathBuf,
    },
    /// List the ROIs stored in a session
    List {
        /// Only this page
        #[arg(short, long)]
        page: Option<u32>,

        /// Session file
        #[arg(short, long = "rois", value_name = "FILE", default_value = "borelog-session.json")]
        rois: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let result = match cli.command {
        Commands::Extract {
            page,
            lang,
            psm,
            output,
            out,
            save,
        } => commands::extract::run(&page, lang, psm, &output, out, save),
        Commands::Lines { page } => commands::lines::run(&page),
        Commands::Roi { action } => match action {
            RoiAction::Set {
                kind,
                x,
                y,
                w,
                h,
                page,
                rois,
                image,
            } => commands::roi::set(&rois, page, &kind, [x, y, w, h], image.as_deref()),
            RoiAction::Clear { kind, page, rois } => {
                commands::roi::clear(&rois, page, kind.as_deref())
            }
            RoiAction::List { page, rois } => commands::roi::list(&rois, page),
        },
        Commands::Config => commands::config::print_default(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
