use crate::error::{ErrorKind, Result};
use crate::{Cli, Command};
use exn::{OptionExt, ResultExt};
use futures::StreamExt;
use medianorm_config::Config;
use medianorm_naming::{Registry, compute_source_id};
use medianorm_pipeline::device::{self, MediaDirectory};
use medianorm_pipeline::{Action, ProcessEvent, Stages, UploadEvent, process, upload_directory};
use medianorm_storage::backend::LocalBackend;
use std::path::{Path, PathBuf};
use std::pin::pin;
use std::sync::Arc;

pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref()).or_raise(|| ErrorKind::Config)?;
    let registry = config.registry().or_raise(|| ErrorKind::Config)?;
    match cli.command {
        Command::Standardize { names, schema, source } => {
            let source = source.as_deref().unwrap_or(&config.source.identifier);
            standardize(&registry, &names, schema.as_deref(), source)
        },
        Command::Scan { directory, extensions, source } => {
            let source = source.as_deref().unwrap_or(&config.source.identifier);
            let extensions: Vec<&str> = match extensions.is_empty() {
                true => config.scan.allow_list().unwrap_or_default(),
                false => extensions.iter().map(String::as_str).collect(),
            };
            let allow_list = (!extensions.is_empty()).then_some(extensions.as_slice());
            scan(&registry, &directory, allow_list, source)
        },
        Command::Schemas => {
            for schema in registry.schemas() {
                println!("{}\t{}", schema.name(), schema.pattern());
            }
            Ok(())
        },
        Command::Upload { directory, device, media } => upload(&config, directory, device, media).await,
        Command::Process { dry_run } => {
            let stages = stages(&config)?;
            let stages = match dry_run {
                true => stages.read_only(),
                false => stages,
            };
            process_uploads(&stages, &registry).await
        },
        Command::Device => {
            let (mount, identifier) = discover(&config)?;
            let source_id = compute_source_id(&identifier, config.source.length).or_raise(|| ErrorKind::Naming)?;
            println!("mount:      {}", mount.display());
            println!("identifier: {identifier}");
            println!("source id:  {source_id}");
            Ok(())
        },
    }
}

fn standardize(registry: &Registry, names: &[String], schema: Option<&str>, source: &str) -> Result<()> {
    let schema = match schema {
        Some(name) => Some(registry.get(name).ok_or_raise(|| ErrorKind::UnknownSchema(name.to_string()))?),
        None => None,
    };
    let mut failed = 0;
    for name in names {
        match registry.standardize_as(name, schema, source) {
            Ok(standardized) => println!("{name} -> {}", standardized.full_path()),
            Err(err) => {
                eprintln!("{name}: {}", &*err);
                failed += 1;
            },
        }
    }
    match failed {
        0 => Ok(()),
        n => exn::bail!(ErrorKind::Failed(n)),
    }
}

fn scan(registry: &Registry, directory: &Path, extensions: Option<&[&str]>, source: &str) -> Result<()> {
    let mapping = registry.standardize_directory(directory, extensions, source).or_raise(|| ErrorKind::Naming)?;
    for (path, canonical) in mapping {
        println!("{} -> {canonical}", path.display());
    }
    Ok(())
}

fn stages(config: &Config) -> Result<Stages> {
    config.storage.validate().or_raise(|| ErrorKind::Config)?;
    let open = |name: &'static str, root: &Path| -> Result<_> {
        LocalBackend::new(name, root).or_raise(|| ErrorKind::Storage(name))
    };
    Ok(Stages::new(
        Arc::new(open("upload", &config.storage.upload)?),
        Arc::new(open("processed", &config.storage.processed)?),
        Arc::new(open("failed", &config.storage.failed)?),
    ))
}

/// Finds the single connected device and its identifier.
fn discover(config: &Config) -> Result<(PathBuf, String)> {
    let mount = device::find_mtp_mount(&config.device.gvfs).or_raise(|| ErrorKind::Pipeline)?;
    let identifier = device::device_identifier(&mount).or_raise(|| ErrorKind::Pipeline)?;
    tracing::info!(mount = %mount.display(), %identifier, "Found device");
    Ok((mount, identifier))
}

async fn upload(config: &Config, directory: Option<PathBuf>, device: Option<String>, media: MediaDirectory) -> Result<()> {
    let (directory, device_name) = match directory {
        Some(directory) => (directory, device.unwrap_or_else(|| config.source.identifier.clone())),
        None => {
            let (mount, identifier) = discover(config)?;
            let storage = device::internal_storage(&mount, &config.device.internal_storage)
                .or_raise(|| ErrorKind::DeviceNotReady)?;
            (media.resolve(storage), device.unwrap_or(identifier))
        },
    };
    let stages = stages(config)?;
    let extensions = config.scan.allow_list();

    let mut events =
        pin!(upload_directory(&stages, &directory, extensions.as_deref(), &device_name, config.source.length));
    let (mut uploaded, mut skipped, mut failed) = (0, 0, 0);
    while let Some(event) = events.next().await {
        match event {
            Ok(UploadEvent::DiscoveryComplete(total)) => tracing::info!(total, directory = %directory.display(), "Found files"),
            Ok(UploadEvent::Uploaded(key)) => {
                println!("uploaded {key}");
                uploaded += 1;
            },
            Ok(UploadEvent::Skipped(key)) => {
                println!("skipped  {key}");
                skipped += 1;
            },
            Ok(UploadEvent::Started | UploadEvent::Complete) => {},
            Err(err) => {
                eprintln!("Error: {err:?}");
                failed += 1;
            },
        }
    }
    println!("{uploaded} uploaded, {skipped} skipped, {failed} failed");
    match failed {
        0 => Ok(()),
        n => exn::bail!(ErrorKind::Failed(n)),
    }
}

async fn process_uploads(stages: &Stages, registry: &Registry) -> Result<()> {
    let mut events = pin!(process(stages, registry));
    let mut failed = 0;
    while let Some(event) = events.next().await {
        match event {
            Ok(ProcessEvent::DiscoveryComplete(total)) => tracing::info!(total, "Found uploads"),
            Ok(ProcessEvent::Processed(action)) => match action {
                Action::Processed(path) => println!("processed {}", path.display()),
                Action::Failed(path) => println!("failed    {}", path.display()),
                Action::Duplicate(path) => println!("duplicate {}", path.display()),
            },
            Ok(ProcessEvent::Started | ProcessEvent::Complete) => {},
            Err(err) => {
                eprintln!("Error: {err:?}");
                failed += 1;
            },
        }
    }
    match failed {
        0 => Ok(()),
        n => exn::bail!(ErrorKind::Failed(n)),
    }
}
