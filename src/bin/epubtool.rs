//! epubtool - show and edit EPUB metadata
//!
//! Usage:
//!   epubtool book.epub                          Show title, authors and series
//!   epubtool book.epub -t "Title" -u "Sub"      Replace title and subtitle
//!   epubtool book.epub -a "One" "Two"           Replace the authors
//!   epubtool book.epub -s "Series" 2 -3 -c      Set the series in both dialects
//!   epubtool book.epub -m                       Dump the metadata element
//!
//! Edits are written to `<FILE>.new`; the original file is never changed.

use clap::Parser;
use epubtool::Result;
use epubtool::epub::core::Package;
use epubtool::epub::{
    AuthorEditor, PackageDocument, SeriesConfig, SeriesEditor, SeriesInfo, TitleEditor,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Show and edit the title, authors and series of an EPUB
#[derive(Parser, Debug)]
#[command(name = "epubtool")]
#[command(version)]
struct Args {
    /// EPUB file
    file: PathBuf,

    /// Print title, authors and series
    #[arg(short, long)]
    info: bool,

    /// Dump the metadata element
    #[arg(short, long)]
    metadata: bool,

    /// Set the series name and number
    #[arg(short, long, num_args = 2, value_names = ["NAME", "NUMBER"])]
    series: Option<Vec<String>>,

    /// Set the title
    #[arg(short, long)]
    title: Option<String>,

    /// Set the subtitle
    #[arg(short = 'u', long)]
    subtitle: Option<String>,

    /// Replace the authors
    #[arg(short, long = "author", num_args = 1.., value_name = "NAME")]
    authors: Vec<String>,

    /// Write the series as calibre:series metadata
    #[arg(short, long)]
    calibre: bool,

    /// Write the series as an EPUB 3 collection
    #[arg(short = '3', long)]
    epub3: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn edits(&self) -> bool {
        self.series.is_some()
            || self.title.is_some()
            || self.subtitle.is_some()
            || !self.authors.is_empty()
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let _ = FmtSubscriber::builder()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::WARN })
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            ExitCode::from(1)
        },
    }
}

fn run(args: &Args) -> Result<()> {
    // Reject bad series input before the archive is even opened
    let series = match args.series.as_deref() {
        Some([name, number]) => Some(SeriesInfo::new(name.as_str(), number.as_str())?),
        _ => None,
    };
    let config = SeriesConfig::from_switches(args.epub3, args.calibre);

    let package = Package::open(&args.file)?;
    let mut doc = package.document()?;

    if let Some(info) = &series {
        SeriesEditor::new(&mut doc, config).set_series(info);
    }
    if args.title.is_some() || args.subtitle.is_some() {
        TitleEditor::new(&mut doc).set_title(args.title.as_deref(), args.subtitle.as_deref());
    }
    if !args.authors.is_empty() {
        AuthorEditor::new(&mut doc).set_authors(args.authors.as_slice())?;
    }

    if args.info || !(args.edits() || args.metadata) {
        print_info(&args.file, &mut doc, config);
    }
    if args.metadata {
        println!("{}", doc.metadata_xml());
    }

    if let Some(out) = doc.save_to(&package)? {
        println!("New epub file: '{}'", out.display());
    }
    Ok(())
}

fn print_info(path: &Path, doc: &mut PackageDocument, config: SeriesConfig) {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    println!("File:\t{} (epub {})", name, doc.version().unwrap_or("?"));

    let title = TitleEditor::new(doc).title();
    println!("Info:\t\"{}\"", title);
    println!("\t{}", AuthorEditor::new(doc).authors().join(", "));

    if let Some(series) = SeriesEditor::new(doc, config).series() {
        println!("Series:\t{}", series);
    }
}
