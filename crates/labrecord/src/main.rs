//! `labrec` - CLI for labrecord
//!
//! This binary renders lab-record forms, shows them in the desktop viewer,
//! and hosts the interactive editing shell.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::fs;
use std::path::Path;

use clap::Parser;
use tokio::sync::mpsc;

use labrecord::cli::{
    Cli, Command, ConfigCommand, EditCommand, NewCommand, PreviewCommand, RenderCommand,
};
use labrecord::download::{download_filename, save_document};
use labrecord::form::{form_template, load_form_file, parse_form};
use labrecord::preview::surface::Launcher;
use labrecord::preview::{BlobRegistry, FileSurface, PreviewCoordinator};
use labrecord::sources::{self, EventSource, FormFileWatcher, ShellSource};
use labrecord::{
    init_logging, Config, Controller, ControllerOptions, DocumentFormat, Error, Form, Notice,
    Renderers, UiEvent,
};

// Platform-specific imports using conditional compilation
#[cfg(target_os = "linux")]
use labrecord_linux as platform;

#[cfg(target_os = "macos")]
use labrecord_mac as platform;

type CliResult = Result<(), Box<dyn std::error::Error>>;

#[tokio::main]
async fn main() -> CliResult {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone())?;

    // Execute the command
    match cli.command {
        Command::Render(cmd) => handle_render(&config, &cmd),
        Command::Preview(cmd) => handle_preview(&config, &cmd).await,
        Command::Edit(cmd) => handle_edit(&config, &cmd).await,
        Command::New(cmd) => handle_new(&cmd),
        Command::Filename(cmd) => {
            println!("{}", download_filename(&cmd.title, cmd.format.into()));
            Ok(())
        }
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

fn handle_render(config: &Config, cmd: &RenderCommand) -> CliResult {
    let snapshot = Form::from_snapshot(load_form_file(&cmd.form)?).ensure_content()?;
    let format = cmd
        .format
        .map_or(config.output.default_format, DocumentFormat::from);

    let document = Renderers::from_config(&config.document)
        .get(format)
        .render(&snapshot)?;

    let path = if let Some(output) = &cmd.output {
        let dir = output
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let name = output
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or("output path has no file name")?;
        save_document(dir, name, &document)?
    } else {
        let dir = cmd.dir.clone().unwrap_or_else(|| config.output_dir());
        let name = download_filename(&snapshot.course_title, format);
        save_document(&dir, &name, &document)?
    };

    if cmd.json {
        let summary = serde_json::json!({
            "path": path,
            "format": format,
            "bytes": document.len(),
            "pages": document.page_count(),
            "experiments": snapshot.experiments.len(),
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("Wrote {}", path.display());
    }
    Ok(())
}

async fn handle_preview(config: &Config, cmd: &PreviewCommand) -> CliResult {
    platform::init()?;
    let bytes = fs::read(&cmd.form).map_err(|e| Error::form_load(&cmd.form, e.to_string()))?;
    let form = Form::from_snapshot(parse_form(&cmd.form, &bytes)?);

    if cmd.watch {
        let watcher = FormFileWatcher::new(&cmd.form, config.poll_interval()).with_seen(&bytes);
        println!(
            "Watching {} (Ctrl-C to stop); preview at {}",
            cmd.form.display(),
            config.preview_path().display()
        );
        return run_session(config, form, Box::new(watcher), true).await;
    }

    let snapshot = form.ensure_content()?;
    let document = Renderers::from_config(&config.document)
        .get(DocumentFormat::Pdf)
        .render(&snapshot)?;
    let pages = document.page_count().unwrap_or(1);

    let registry = BlobRegistry::new();
    let mut preview = PreviewCoordinator::new(preview_surface(config));
    preview.show(registry.publish(document))?;
    println!(
        "Preview: {} ({pages} page{})",
        config.preview_path().display(),
        if pages == 1 { "" } else { "s" }
    );
    Ok(())
}

async fn handle_edit(config: &Config, cmd: &EditCommand) -> CliResult {
    platform::init()?;
    let form = match &cmd.form {
        Some(path) => Form::from_snapshot(load_form_file(path)?),
        None => Form::new(),
    };
    let shell = ShellSource::stdin(config.output.default_format);
    run_session(config, form, Box::new(shell), false).await
}

/// Run the controller with one event source until it quits.
///
/// A watch session opens the preview straight away and stops on Ctrl-C.
async fn run_session(
    config: &Config,
    form: Form,
    source: Box<dyn EventSource>,
    watch: bool,
) -> CliResult {
    let (notice_tx, mut notices) = mpsc::unbounded_channel();
    let controller = Controller::new(
        form,
        preview_surface(config),
        Renderers::from_config(&config.document),
        ControllerOptions::from_config(config),
        notice_tx,
    );

    let printer = tokio::spawn(async move {
        while let Some(notice) = notices.recv().await {
            print_notice(&notice);
        }
    });

    let (tx, rx) = mpsc::channel(64);
    if watch {
        tx.send(UiEvent::Preview).await?;
        let quit = tx.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                let _ = quit.send(UiEvent::Quit).await;
            }
        });
    }
    let source_task = sources::spawn(source, tx);

    let controller = controller.run(rx).await;
    source_task.abort();

    // Dropping the controller closes the notice channel.
    drop(controller);
    let _ = printer.await;
    Ok(())
}

fn preview_surface(config: &Config) -> FileSurface {
    let surface = FileSurface::new(config.preview_path());
    if config.preview.launch_viewer {
        let launcher: Launcher = Box::new(platform::open_document);
        surface.with_launcher(launcher)
    } else {
        surface
    }
}

fn print_notice(notice: &Notice) {
    match notice {
        Notice::Error(_) => eprintln!("{notice}"),
        _ => println!("{notice}"),
    }
}

fn handle_new(cmd: &NewCommand) -> CliResult {
    if cmd.path.exists() && !cmd.force {
        return Err(format!(
            "{} already exists (use --force to overwrite)",
            cmd.path.display()
        )
        .into());
    }
    let today = chrono::Local::now().date_naive();
    fs::write(&cmd.path, form_template(cmd.experiments, today))?;
    println!(
        "Wrote {} with {} experiment(s)",
        cmd.path.display(),
        cmd.experiments
    );
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> CliResult {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Document]");
                println!(
                    "  Logo:               {}",
                    config
                        .document
                        .logo_path
                        .as_ref()
                        .map_or_else(|| "(none)".to_string(), |p| p.display().to_string())
                );
                println!(
                    "  Confirmation:       {}",
                    config.document.confirmation_statement
                );
                println!();
                println!("[Output]");
                println!("  Directory:          {}", config.output_dir().display());
                println!("  Default format:     {}", config.output.default_format);
                println!();
                println!("[Preview]");
                println!("  Path:               {}", config.preview_path().display());
                println!("  Debounce (ms):      {}", config.preview.debounce_ms);
                println!("  Poll interval (ms): {}", config.preview.poll_interval_ms);
                println!("  Launch viewer:      {}", config.preview.launch_viewer);
                println!(
                    "  Viewer:             {} ({})",
                    platform::viewer_command(),
                    platform::platform_name()
                );
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
