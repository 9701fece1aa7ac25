//! Command-line interface implementation

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::datasource::{DataSource, FileDataSource};
use crate::loader::{LoadSession, Stage};
use crate::output::{generate_output_path, save_png, scale_image};
use crate::sheets::DirSheetSource;
use crate::validate::validate_all;

const EXIT_SUCCESS: u8 = 0;
const EXIT_ERROR: u8 = 1;
const EXIT_INVALID_ARGS: u8 = 2;

/// spritedb - Validate game content tables and compose their sprites
#[derive(Parser)]
#[command(name = "sdb")]
#[command(about = "spritedb - Validate game content tables and compose their sprites")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check every table's records against its schema
    Validate {
        /// Directory holding database.json and the content files
        data_dir: PathBuf,
    },

    /// Load sheets, resolve sprites and write them out as PNG
    Compose {
        /// Directory holding database.json and the content files
        data_dir: PathBuf,

        /// Directory holding the tilesheet images
        #[arg(long)]
        sheets: PathBuf,

        /// Output file or directory.
        /// If omitted: {id}.png
        /// If file (single sprite): out.png
        /// If file (multiple): out_{id}.png
        /// If directory (ends with /): dir/{id}.png
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Only compose the sprite with this ID
        #[arg(short, long)]
        sprite: Option<String>,

        /// Scale output by integer factor (1-16, default: 1)
        #[arg(long, default_value = "1", value_parser = clap::value_parser!(u8).range(1..=16))]
        scale: u8,
    },

    /// List the tables of a data directory with row counts
    Tables {
        /// Directory holding database.json and the content files
        data_dir: PathBuf,
    },
}

/// Run the CLI application
pub fn run() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { data_dir } => run_validate(&data_dir),
        Commands::Compose {
            data_dir,
            sheets,
            out,
            sprite,
            scale,
        } => run_compose(&data_dir, &sheets, out.as_deref(), sprite.as_deref(), scale),
        Commands::Tables { data_dir } => run_tables(&data_dir),
    }
}

/// Execute the validate command
fn run_validate(data_dir: &Path) -> ExitCode {
    let source = FileDataSource::new(data_dir);

    let reports = match validate_all(&source) {
        Ok(reports) => reports,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    };

    let mut failed = false;
    for report in &reports {
        match &report.error {
            Some(error) => {
                failed = true;
                println!("{}: {}", report.table, error);
            }
            None if !report.schema => {
                println!("{}: {} rows (no schema)", report.table, report.rows);
            }
            None => println!("{}: {} rows OK", report.table, report.rows),
        }
    }

    if failed {
        ExitCode::from(EXIT_ERROR)
    } else {
        ExitCode::from(EXIT_SUCCESS)
    }
}

/// Execute the compose command
fn run_compose(
    data_dir: &Path,
    sheets: &Path,
    out: Option<&Path>,
    sprite_filter: Option<&str>,
    scale: u8,
) -> ExitCode {
    let source = FileDataSource::new(data_dir);
    let sheet_source = DirSheetSource::new(sheets);

    let session = match LoadSession::new(&source, &sheet_source) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    };

    let mut last_stage = session.progress().stage;
    println!("{}...", last_stage);
    let result = session.run(|progress| {
        if last_stage != progress.stage {
            last_stage = progress.stage;
            if progress.stage != Stage::Complete {
                println!("{}...", progress.stage);
            }
        }
    });
    let (catalog, warnings) = match result {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };
    for warning in &warnings {
        eprintln!("Warning: {}", warning.message);
    }

    let ids: Vec<&str> = match sprite_filter {
        Some(id) => {
            if catalog.sprite(id).is_none() {
                eprintln!("Error: No sprite with ID '{}'", id);
                return ExitCode::from(EXIT_ERROR);
            }
            vec![id]
        }
        None => catalog.sprite_ids(),
    };

    let mut to_write = Vec::new();
    let mut unresolved = 0usize;
    for id in ids {
        match catalog.sprite(id).and_then(|s| s.img.as_ref()) {
            Some(img) => to_write.push((id, img)),
            None => unresolved += 1,
        }
    }
    if to_write.is_empty() {
        match sprite_filter {
            Some(id) => eprintln!("Error: Sprite '{}' did not resolve to an image", id),
            None => eprintln!("Error: No sprite resolved to an image"),
        }
        return ExitCode::from(EXIT_ERROR);
    }

    let is_single = to_write.len() == 1;
    for (id, img) in &to_write {
        let image = scale_image((*img).clone(), scale);
        let output_path = generate_output_path(out, id, is_single);
        if let Err(e) = save_png(&image, &output_path) {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
        println!("Saved: {}", output_path.display());
    }

    if unresolved > 0 {
        eprintln!("Warning: {} sprites have no resolved image", unresolved);
    }

    ExitCode::from(EXIT_SUCCESS)
}

/// Execute the tables command
fn run_tables(data_dir: &Path) -> ExitCode {
    let source = FileDataSource::new(data_dir);

    let entries = match source.tables() {
        Ok(entries) => entries,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    };

    let mut failed = false;
    for entry in &entries {
        let files: Vec<&str> = entry.files.iter().map(|f| f.file.as_str()).collect();
        match source.select(&entry.table_name) {
            Ok(rows) => println!(
                "{}: {} rows ({})",
                entry.table_name,
                rows.len(),
                files.join(", ")
            ),
            Err(e) => {
                failed = true;
                println!("{}: error: {}", entry.table_name, e);
            }
        }
    }

    if failed {
        ExitCode::from(EXIT_ERROR)
    } else {
        ExitCode::from(EXIT_SUCCESS)
    }
}
