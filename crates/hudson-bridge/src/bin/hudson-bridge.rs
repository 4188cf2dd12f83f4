use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Arg, ArgAction, Command};

use hudson_bridge::bridge::{self, BridgeConfig};
use hudson_bridge::transport::TargetSpec;

fn main() -> Result<()> {
    let matches = Command::new("hudson-bridge")
        .about("Bridge a GDB remote-serial-protocol client to a HudsonBug target debugger")
        .arg(
            Arg::new("listen")
                .short('l')
                .value_name("PORT")
                .help("accept an inbound target connection on PORT instead of using a device or outbound connection"),
        )
        .arg(
            Arg::new("client-port")
                .short('p')
                .value_name("PORT")
                .default_value("2345")
                .help("port to listen on for the GDB client"),
        )
        .arg(
            Arg::new("prompt")
                .short('P')
                .value_name("CHAR")
                .default_value("-")
                .help("target prompt character ('-' standalone DB.X, '+' ROM variant)"),
        )
        .arg(Arg::new("verbose").short('v').action(ArgAction::SetTrue).help("log traffic in both directions"))
        .arg(Arg::new("target").help("device path or host:port to reach the target debugger"))
        .get_matches();

    let verbose = matches.get_flag("verbose");
    env_logger::builder()
        .format_level(false)
        .format_target(false)
        .filter_level(if verbose {
            log::LevelFilter::Trace
        } else {
            log::LevelFilter::Info
        })
        .init();

    let listen_port: Option<u16> = matches
        .get_one::<String>("listen")
        .map(|s| s.parse().context("invalid -l port"))
        .transpose()?;
    let target_arg = matches.get_one::<String>("target");

    let target = match (listen_port, target_arg) {
        (Some(port), None) => TargetSpec::TcpListen(port),
        (None, Some(target)) => {
            if target.rsplit_once(':').is_some() {
                TargetSpec::TcpConnect(target.clone())
            } else {
                TargetSpec::Serial(target.clone())
            }
        }
        (Some(_), Some(_)) => bail!("-l and a target argument are mutually exclusive"),
        (None, None) => bail!("either -l PORT or a target (device path or host:port) is required"),
    };

    let client_port: u16 = matches
        .get_one::<String>("client-port")
        .unwrap()
        .parse()
        .context("invalid -p port")?;
    let prompt = matches
        .get_one::<String>("prompt")
        .unwrap()
        .chars()
        .next()
        .context("-P requires a single character")?;

    let config = BridgeConfig {
        target,
        client_port,
        prompt,
        verbose,
    };

    let running = Arc::new(AtomicBool::new(true));
    let handler_flag = running.clone();
    ctrlc::set_handler(move || {
        log::info!("interrupted, shutting down");
        handler_flag.store(false, Ordering::Relaxed);
    })
    .context("failed to install SIGINT handler")?;

    bridge::run(config, running).context("bridge failed")?;
    Ok(())
}
