use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use wad_tools_lib::import::{detect_format, open_archive};
use wad_tools_lib::texture::cache::DecodeCache;
use wad_tools_lib::texture::fullbright::split_fullbrights;
use wad_tools_lib::texture::sky::split_sky;
use wad_tools_lib::{DecodeOptions, ImportSession, ImportSettings};

fn usage() -> ! {
    eprintln!("Usage:");
    eprintln!("  wad-inspect list <archive>");
    eprintln!("  wad-inspect materials [--settings <file.toml>] <archive|image>...");
    eprintln!("  wad-inspect extract <archive> <output_dir> [lump_name]");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  wad-inspect list id1/gfx.wad");
    eprintln!("  wad-inspect materials --settings import.toml id1/maps/e1m1.bsp");
    eprintln!("  wad-inspect extract id1/gfx.wad ./out CONCHARS");
    eprintln!();
    eprintln!("Set WAD_INSPECT_VERBOSE=1 for decode tracing.");
    std::process::exit(1);
}

fn main() {
    let level = if std::env::var_os("WAD_INSPECT_VERBOSE").is_some() {
        tracing::Level::TRACE
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        usage();
    }

    let result = match args[1].as_str() {
        "list" => list(Path::new(&args[2])),
        "materials" => materials(&args[2..]),
        "extract" if args.len() >= 4 => extract(
            Path::new(&args[2]),
            Path::new(&args[3]),
            args.get(4).map(String::as_str),
        ),
        _ => usage(),
    };

    if let Err(e) = result {
        eprintln!("wad-inspect failed: {:?}", e);
        std::process::exit(1);
    }
}

fn list(path: &Path) -> Result<()> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let archive = open_archive(&bytes)?;

    eprintln!("{} ({:?}, {} lumps)", path.display(), archive.format(), archive.len());
    for entry in archive.entries() {
        println!(
            "{:>4}  {:<16}  {:?}  {:>8} bytes{}",
            entry.index,
            entry.name,
            entry.lump_type,
            entry.size,
            if entry.compressed { "  (compressed)" } else { "" }
        );
    }
    Ok(())
}

fn materials(args: &[String]) -> Result<()> {
    let mut settings = ImportSettings::default();
    let mut inputs: Vec<PathBuf> = Vec::new();
    let mut i = 0;
    while i < args.len() {
        if args[i] == "--settings" {
            let Some(file) = args.get(i + 1) else {
                bail!("--settings requires a file");
            };
            settings = ImportSettings::load(file)?;
            i += 2;
        } else {
            inputs.push(PathBuf::from(&args[i]));
            i += 1;
        }
    }
    if inputs.is_empty() {
        bail!("no input files");
    }

    let mut session = ImportSession::new(settings);
    for input in &inputs {
        let bytes = std::fs::read(input).with_context(|| format!("reading {}", input.display()))?;
        if detect_format(&bytes).is_some() {
            let summary = session
                .add_archive(&bytes, input)
                .with_context(|| format!("parsing {}", input.display()))?;
            eprintln!(
                "{}: {} added, {} duplicates, {} skipped",
                input.display(),
                summary.added,
                summary.duplicates,
                summary.skipped
            );
        } else {
            let image = image::load_from_memory(&bytes)
                .with_context(|| format!("{} is neither an archive nor a readable image", input.display()))?;
            session.add_loose_image(image.to_rgba8(), input);
        }
    }

    let report = session.finish();
    let output = serde_json::json!({
        "materials": report.materials,
        "warnings": report.warning_records(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// File-safe form of a texture name.
fn file_name(name: &str) -> String {
    name.replace('*', "#")
}

fn extract(path: &Path, output_dir: &Path, only: Option<&str>) -> Result<()> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let settings = ImportSettings::default();
    let mut cache = DecodeCache::new(open_archive(&bytes)?, DecodeOptions::default());
    std::fs::create_dir_all(output_dir)?;

    let indices: Vec<usize> = match only {
        Some(name) => match cache.archive().find(name) {
            Some(entry) => vec![entry.index],
            None => bail!("no lump named '{}' in {}", name, path.display()),
        },
        None => (0..cache.archive().len()).collect(),
    };

    let mut written = 0;
    for index in indices {
        let texture = match cache.decode(index) {
            Ok(Some(texture)) => texture,
            Ok(None) => continue,
            Err(e) => {
                eprintln!("  skipped: {}", e);
                continue;
            }
        };

        let split = split_fullbrights(texture, settings.effective_glow_suffix(), false);
        let mut outputs = vec![(file_name(&split.base.name), split.base.pixels.clone())];
        if let Some(glow) = split.glow {
            outputs.push((file_name(&glow.name), glow.pixels));
        }
        if wad_tools_lib::material::classify(&texture.name) == wad_tools_lib::material::Classification::Sky {
            if let Some(layers) = split_sky(texture, settings.sky_split_ratio) {
                outputs.push((format!("{}_near", file_name(&texture.name)), layers.near));
                outputs.push((format!("{}_far", file_name(&texture.name)), layers.far));
            }
        }

        for (name, pixels) in outputs {
            let target = output_dir.join(format!("{}.png", name));
            pixels
                .save(&target)
                .with_context(|| format!("writing {}", target.display()))?;
            written += 1;
        }
    }

    eprintln!("Extracted {} images to {}", written, output_dir.display());
    Ok(())
}
