use std::fs;
use std::io::Write;
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command};

fn main() -> Result<()> {
    let matches = Command::new("elf2x68k")
        .about("Convert an ELF32 big-endian m68k object into a Human68k X-file")
        .arg(
            Arg::new("symbols")
                .short('s')
                .action(ArgAction::SetTrue)
                .help("include a symbol table in the output"),
        )
        .arg(Arg::new("verbose").short('v').action(ArgAction::SetTrue).help("log progress"))
        .arg(Arg::new("input").required(true))
        .arg(Arg::new("output").required(true))
        .get_matches();

    let verbose = matches.get_flag("verbose");
    env_logger::builder()
        .format_level(false)
        .format_target(false)
        .filter_level(if verbose {
            log::LevelFilter::Info
        } else {
            log::LevelFilter::Warn
        })
        .init();

    let include_symbols = matches.get_flag("symbols");
    let input_path = Path::new(matches.get_one::<String>("input").unwrap());
    let output_path = Path::new(matches.get_one::<String>("output").unwrap());

    let input_file =
        fs::File::open(input_path).with_context(|| format!("failed to open {}", input_path.display()))?;
    let mmap = unsafe { memmap2::Mmap::map(&input_file) }
        .with_context(|| format!("failed to map {}", input_path.display()))?;

    let xfile = elf2x68k::convert(&mmap, include_symbols)
        .with_context(|| format!("failed to convert {}", input_path.display()))?;

    write_output(output_path, &xfile)
        .with_context(|| format!("failed to write {}", output_path.display()))?;

    Ok(())
}

fn write_output(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o755)
        .open(path)?;
    if let Err(e) = file.write_all(bytes) {
        drop(file);
        let _ = fs::remove_file(path);
        return Err(e);
    }
    Ok(())
}
