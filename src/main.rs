//! Reportline - render spreadsheet reports from .grd templates

mod config;
mod data;
mod logger;

use anyhow::{Context, Result, anyhow, bail};
use std::env;
use std::path::PathBuf;

use config::Config;
use reportline_core::storage::write_workbook;
use reportline_core::{DirTemplateLoader, ReportDefinition, ReportGenerator, page_model};

fn print_usage() {
    eprintln!("Usage: reportline [OPTIONS] <REPORT> <DATA>");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  <REPORT>                  Report kind: evidence or attendance");
    eprintln!("  <DATA>                    Report data file (.toml)");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -t, --templates <DIR>     Template directory");
    eprintln!("  -o, --output <DIR>        Output directory");
    eprintln!("  -c, --config <FILE>       Config file (default: user config dir)");
    eprintln!("  -v, --verbose             Log progress to stderr");
    eprintln!("  -h, --help                Print help");
}

#[derive(Debug, Default, PartialEq)]
struct Options {
    report: String,
    data: PathBuf,
    templates: Option<PathBuf>,
    output: Option<PathBuf>,
    config: Option<PathBuf>,
    verbose: bool,
}

#[derive(Debug, PartialEq)]
enum Command {
    Help,
    Run(Options),
}

fn parse_args(args: &[String]) -> Result<Command, String> {
    let mut options = Options::default();
    let mut positional: Vec<String> = Vec::new();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => return Ok(Command::Help),
            "-v" | "--verbose" => options.verbose = true,
            flag @ ("-t" | "--templates" | "-o" | "--output" | "-c" | "--config") => {
                i += 1;
                let Some(value) = args.get(i) else {
                    return Err(format!("{} requires a path", flag));
                };
                let value = Some(PathBuf::from(value));
                match flag {
                    "-t" | "--templates" => options.templates = value,
                    "-o" | "--output" => options.output = value,
                    _ => options.config = value,
                }
            }
            arg if arg.starts_with('-') => return Err(format!("Unknown option: {}", arg)),
            arg => positional.push(arg.to_string()),
        }
        i += 1;
    }

    match positional.as_slice() {
        [report, data] => {
            options.report = report.clone();
            options.data = PathBuf::from(data);
            Ok(Command::Run(options))
        }
        [_, _, extra, ..] => Err(format!("Unexpected argument: {}", extra)),
        _ => Err("Expected <REPORT> and <DATA>".to_string()),
    }
}

fn run(options: &Options) -> Result<()> {
    let mut config = Config::load(options.config.as_deref())?;
    if let Some(dir) = &options.templates {
        config.template_dir = dir.clone();
    }
    if let Some(dir) = &options.output {
        config.output_dir = dir.clone();
    }

    let definition = ReportDefinition::builtin(&options.report).ok_or_else(|| {
        anyhow!(
            "Unknown report: {} (expected evidence or attendance)",
            options.report
        )
    })?;
    let table = data::read_table(&options.data)?;
    let generator = ReportGenerator::new(DirTemplateLoader::new(&config.template_dir));

    let report = if definition.is_paginated() {
        let definition = definition.with_page_capacity(config.attendance.page_capacity);
        let roster = data::roster_from_table(&table, &config.attendance)?;
        generator.generate_paged(
            &definition,
            &roster.params,
            &roster.entities,
            |params, page, _| Ok(page_model(params, page)),
        )?
    } else {
        let model = data::model_from_table(&table)?;
        generator.generate(&definition, &model)?
    };

    if report.documents.is_empty() {
        eprintln!("Warning: no entities to list, nothing written");
        return Ok(());
    }

    std::fs::create_dir_all(&config.output_dir).with_context(|| {
        format!(
            "Failed to create output directory {}",
            config.output_dir.display()
        )
    })?;
    for (name, workbook) in report.named_documents() {
        if name.contains(['/', '\\']) {
            bail!("Refusing to write {:?}: filename contains a path separator", name);
        }
        let path = config.output_dir.join(&name);
        write_workbook(&path, workbook)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("{}", path.display());
    }
    Ok(())
}

fn main() {
    let args: Vec<String> = env::args().collect();

    let options = match parse_args(&args) {
        Ok(Command::Help) => {
            print_usage();
            return;
        }
        Ok(Command::Run(options)) => options,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            print_usage();
            std::process::exit(1);
        }
    };

    logger::init(options.verbose);

    if let Err(e) = run(&options) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
