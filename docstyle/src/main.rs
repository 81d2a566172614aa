//! docstyle - Manuscript to styled Word document builder
//!
//! Renders JSON, structured Markdown or Word manuscripts into .docx files using
//! one of the bundled templates, with optional automatic restructuring of
//! text-heavy manuscripts.

#![deny(unsafe_code)]
#![cfg_attr(all(not(debug_assertions), not(test)), deny(clippy::all))]
#![allow(clippy::module_name_repetitions)]

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands, MarginArg, PolishArg};
use docstyle::auto_polish::{classify, PolishLevel};
use docstyle::config::{ToolConfig, CONFIG_FILE_NAME};
use docstyle::manuscript::{CustomSettings, Element, Manuscript};
use docstyle::markdown_source;
use docstyle::pipeline::{self, BuildReport};
use docstyle::theme::{ThemeRegistry, DEFAULT_TEMPLATE_ID};
use itertools::Itertools;
use std::path::{Path, PathBuf};

/// Main entry point for the docstyle CLI application
fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:?}", e);
        std::process::exit(1);
    }
}

/// Run the CLI application
fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            input,
            output,
            template,
            config,
            preset,
            polish_level,
            no_polish,
            margins,
            verbose,
        } => {
            init_logging(verbose);
            let overrides = cli_settings(preset, polish_level, no_polish, margins);
            handle_build_command(input, output, template, config, overrides)?;
        }

        Commands::Analyze {
            input,
            polish_level,
        } => {
            init_logging(false);
            handle_analyze_command(&input, polish_level)?;
        }

        Commands::Polish {
            input,
            output,
            polish_level,
        } => {
            init_logging(false);
            handle_polish_command(&input, &output, polish_level)?;
        }

        Commands::ConvertMd { input, output } => {
            init_logging(false);
            handle_convert_md_command(&input, &output)?;
        }

        Commands::Init {
            path,
            template,
            force,
        } => {
            init_logging(false);
            handle_init_command(path, template, force)?;
        }

        Commands::ListTemplates { config } => {
            handle_list_templates_command(config.as_deref())?;
        }
    }

    Ok(())
}

/// Warnings always reach stderr; `--verbose` adds stage progress
///
/// `RUST_LOG` still overrides the level when set.
fn init_logging(verbose: bool) {
    env_logger::Builder::new()
        .filter_level(default_log_level(verbose))
        .parse_default_env()
        .init();
}

fn default_log_level(verbose: bool) -> log::LevelFilter {
    if verbose {
        log::LevelFilter::Info
    } else {
        log::LevelFilter::Warn
    }
}

/// Settings given as command-line flags
fn cli_settings(
    preset: Option<String>,
    polish_level: Option<PolishArg>,
    no_polish: bool,
    margins: Option<MarginArg>,
) -> CustomSettings {
    CustomSettings {
        style_preset: preset,
        auto_polish: no_polish.then_some(false),
        auto_polish_level: polish_level.map(|l| l.as_setting().to_string()),
        margins: margins.map(|m| m.as_setting().to_string()),
        ..CustomSettings::default()
    }
}

/// Handle the build command
fn handle_build_command(
    input: PathBuf,
    mut output: PathBuf,
    template_arg: Option<String>,
    config_path: Option<PathBuf>,
    overrides: CustomSettings,
) -> Result<()> {
    let config = ToolConfig::discover(config_path.as_deref())
        .with_context(|| "Failed to load tool configuration")?;

    let mut manuscript = load_manuscript(&input)?;

    // config < manuscript < command line
    manuscript.custom_settings = config
        .settings
        .clone()
        .overlay(manuscript.custom_settings)
        .overlay(overrides);
    if manuscript.image_base_dir.is_none() {
        manuscript.image_base_dir = config.image_base_dir();
    }

    let registry = load_registry(&config)?;
    let template_id = template_arg
        .or_else(|| config.template.clone())
        .unwrap_or_else(|| DEFAULT_TEMPLATE_ID.to_string());
    let template = registry.get(&template_id).with_context(|| {
        format!(
            "Template '{}' not found. Run 'docstyle list-templates' to see available templates",
            template_id
        )
    })?;

    if output.extension().is_none() {
        output.set_extension("docx");
    }

    println!("Building document...");
    println!("Input: {}", input.display());
    println!("Output: {}", output.display());
    println!("Template: {} - {}", template_id, template.name);

    let report = pipeline::build_to_file(&manuscript, template, &output)
        .with_context(|| format!("Failed to build {}", output.display()))?;

    print_build_report(&report);
    println!("\n✓ Successfully wrote: {}", output.display());

    Ok(())
}

/// Handle the analyze command
fn handle_analyze_command(input: &Path, polish_level: Option<PolishArg>) -> Result<()> {
    let manuscript = load_manuscript(input)?;
    let elements = &manuscript.elements;

    println!("{}: {} elements\n", input.display(), elements.len());
    for (kind, count) in elements
        .iter()
        .map(Element::type_name)
        .counts()
        .into_iter()
        .sorted()
    {
        println!("  {:<18} {}", kind, count);
    }

    println!("\nAuto-polish:");
    for level in PolishLevel::ALL {
        let Some(profile) = level.profile() else {
            println!("  {:<8} disabled", level);
            continue;
        };
        let c = classify(elements, &profile);
        println!(
            "  {:<8} text ratio {:.2}, heavy {}/{} -> {}",
            level,
            c.text_ratio(),
            c.heavy_count,
            c.heavy_limit,
            if c.eligible { "eligible" } else { "unchanged" }
        );
    }

    if let Some(level) = polish_level {
        let settings = CustomSettings {
            auto_polish_level: Some(level.as_setting().to_string()),
            ..CustomSettings::default()
        };
        let outcome = pipeline::prepare_elements(elements, &settings);
        println!(
            "\nSequence at '{}' ({} elements):",
            outcome.level,
            outcome.elements.len()
        );
        for element in &outcome.elements {
            println!("  {}", element.type_name());
        }
    }

    Ok(())
}

/// Handle the polish command
fn handle_polish_command(
    input: &Path,
    output: &Path,
    polish_level: Option<PolishArg>,
) -> Result<()> {
    let manuscript = load_manuscript(input)?;

    let mut settings = manuscript.custom_settings.clone();
    if let Some(level) = polish_level {
        settings.auto_polish = None;
        settings.auto_polish_level = Some(level.as_setting().to_string());
    }

    let outcome = pipeline::prepare_elements(&manuscript.elements, &settings);
    let polished = Manuscript {
        elements: outcome.elements,
        ..manuscript
    };
    polished
        .save(output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!(
        "✓ {} ({}): {} elements -> {}",
        if outcome.polished { "Polished" } else { "Unchanged" },
        outcome.level,
        polished.elements.len(),
        output.display()
    );

    Ok(())
}

/// Handle the convert-md command
fn handle_convert_md_command(input: &Path, output: &Path) -> Result<()> {
    let content = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let manuscript = markdown_source::parse(&content);

    manuscript
        .save(output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!(
        "✓ Converted {} elements: {}",
        manuscript.elements.len(),
        output.display()
    );

    Ok(())
}

/// Handle the init command
fn handle_init_command(path: Option<PathBuf>, template: Option<String>, force: bool) -> Result<()> {
    let target_path = path.unwrap_or_else(|| PathBuf::from("."));

    if let Some(id) = template.as_deref() {
        let registry = ThemeRegistry::bundled().with_context(|| "Failed to load bundled themes")?;
        registry.get(id).with_context(|| {
            format!(
                "Template '{}' not found. Run 'docstyle list-templates' to see available templates",
                id
            )
        })?;
    }

    let config_path = ToolConfig::starter(template.as_deref())
        .write_into(&target_path, force)
        .with_context(|| format!("Failed to initialize {}", target_path.display()))?;

    println!("✓ Created {}", config_path.display());
    println!("\nNext steps:");
    println!("  1. Edit {} to pick a template and style settings", CONFIG_FILE_NAME);
    println!("  2. Put referenced images in the images/ directory");
    println!("  3. Run 'docstyle build <manuscript>' to generate the document");

    Ok(())
}

/// Handle the list-templates command
fn handle_list_templates_command(config_path: Option<&Path>) -> Result<()> {
    let config =
        ToolConfig::discover(config_path).with_context(|| "Failed to load tool configuration")?;
    let registry = load_registry(&config)?;

    println!("Available templates:\n");
    for (id, template) in registry.iter() {
        println!("  {} - {} ({}, {})", id, template.name, template.kind, template.tag);
    }
    println!("\nUsage: docstyle build <manuscript> -o out.docx --template <id>");

    Ok(())
}

fn load_manuscript(input: &Path) -> Result<Manuscript> {
    Manuscript::load(input).with_context(|| format!("Failed to load manuscript {}", input.display()))
}

/// External theme table from the configuration, or the bundled one
fn load_registry(config: &ToolConfig) -> Result<ThemeRegistry> {
    match config.themes_path() {
        Some(path) => ThemeRegistry::load(&path)
            .with_context(|| format!("Failed to load themes from {}", path.display())),
        None => ThemeRegistry::bundled().with_context(|| "Failed to load bundled themes"),
    }
}

/// Print build statistics
fn print_build_report(report: &BuildReport) {
    println!("\n  - {} elements", report.element_count);
    println!("  - {} images", report.image_count);

    let polish = &report.polish;
    match polish.classification {
        Some(c) => println!(
            "  - auto-polish '{}': text ratio {:.2}, heavy {}/{}, {}",
            polish.level,
            c.text_ratio(),
            c.heavy_count,
            c.heavy_limit,
            if polish.polished { "applied" } else { "not applied" }
        ),
        None => println!("  - auto-polish off"),
    }

    for path in &report.missing_images {
        println!("  ! missing image replaced by placeholder: {}", path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warnings_are_shown_by_default() {
        assert_eq!(default_log_level(false), log::LevelFilter::Warn);
        assert_eq!(default_log_level(true), log::LevelFilter::Info);
    }
}
