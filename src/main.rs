mod config;
mod logging;

use config::AppConfig;
use soundwatch_engine::{BackendKind, Device, DeviceMonitor, Purpose, Snapshot};
use std::{
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};
use tracing::{error, info};

const USAGE: &str = "usage: soundwatch [--config <path>] [--json] [--once] [--dummy]";

#[derive(Debug, Default, PartialEq, Eq)]
struct Args {
    config: Option<PathBuf>,
    json: bool,
    once: bool,
    dummy: bool,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args, String> {
    let mut parsed = Args::default();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let path = args
                    .next()
                    .ok_or_else(|| format!("--config needs a path\n{USAGE}"))?;
                parsed.config = Some(PathBuf::from(path));
            }
            "--json" => parsed.json = true,
            "--once" => parsed.once = true,
            "--dummy" => parsed.dummy = true,
            other => return Err(format!("unknown argument {other:?}\n{USAGE}")),
        }
    }
    Ok(parsed)
}

fn format_device(device: &Device, is_default: bool) -> String {
    let marker = if is_default { '*' } else { ' ' };
    let layout = device.layout.name.unwrap_or("custom");
    let mut line = format!(
        "{marker} {} ({})\n      {} ch {layout}",
        device.name,
        device.description,
        device.layout.channel_count()
    );
    if device.is_probed() {
        line.push_str(&format!(
            ", {}-{} Hz, default {} Hz",
            device.sample_rate_min, device.sample_rate_max, device.sample_rate_default
        ));
    } else if let Some(e) = &device.probe_error {
        line.push_str(&format!(", not probed: {e}"));
    }
    if device.is_raw {
        line.push_str(", raw");
    }
    line
}

fn format_snapshot(snapshot: &Snapshot) -> String {
    let mut out = String::new();
    for purpose in Purpose::ALL {
        let devices = snapshot.devices(purpose);
        out.push_str(&format!("{}s ({}):\n", purpose.label(), devices.len()));
        for (idx, device) in devices.iter().enumerate() {
            let is_default = snapshot.default_index(purpose) == Some(idx);
            out.push_str("  ");
            out.push_str(&format_device(device, is_default));
            out.push('\n');
        }
    }
    out
}

fn print_snapshot(snapshot: &Snapshot, json: bool) {
    if json {
        match serde_json::to_string(snapshot) {
            Ok(line) => println!("{line}"),
            Err(e) => error!("failed to encode device list: {}", e),
        }
    } else {
        print!("{}", format_snapshot(snapshot));
    }
}

#[tokio::main]
async fn main() -> Result<(), String> {
    logging::init()?;
    let args = parse_args(std::env::args().skip(1))?;
    let mut app = AppConfig::load(args.config.as_deref())?;
    app.json |= args.json;
    let mut watch = app.watch.with_env_overrides();
    if args.dummy {
        watch.backend = BackendKind::Dummy;
    }

    let mut monitor = DeviceMonitor::open(&watch).map_err(|e| e.to_string())?;
    let json = app.json;
    monitor.on_devices_change(move |snapshot| print_snapshot(snapshot, json));

    if args.once {
        monitor.flush_events();
        monitor.close();
        return Ok(());
    }

    let stop = Arc::new(AtomicBool::new(false));
    let waker = monitor.waker();
    let mut worker = tokio::task::spawn_blocking({
        let stop = stop.clone();
        move || {
            let stopped = || stop.load(Ordering::Acquire);
            while !stopped() {
                monitor.wait_events_unless(stopped);
            }
            monitor.close();
        }
    });

    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                error!("failed to listen for ctrl-c: {}", e);
            }
            info!("shutting down");
            stop.store(true, Ordering::Release);
            waker.wake();
            (&mut worker).await.map_err(|e| e.to_string())?;
        }
        result = &mut worker => {
            result.map_err(|e| e.to_string())?;
        }
    }
    Ok(())
}
