use log::info;
use ncs_usb_oxidized::{
    classify, cpu_temperature, hostname, ip_address, is_device_connected, round_to, timestamp_now,
    ClassificationRecord, ClassifyConfig, NcsDevice,
};
use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
struct Config {
    image_path: PathBuf,
    classify: ClassifyConfig,
}

fn next_arg(args: &[String], idx: &mut usize, flag: &str) -> Result<String, String> {
    *idx += 1;
    if *idx >= args.len() {
        return Err(format!("{} requires a value", flag));
    }
    Ok(args[*idx].clone())
}

fn parse_args() -> Result<Config, String> {
    let args: Vec<String> = std::env::args().collect();

    let mut image_path: Option<PathBuf> = None;
    let mut classify = ClassifyConfig::default();

    let mut idx = 1usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "--graph" => {
                classify.graph_path = PathBuf::from(next_arg(&args, &mut idx, "--graph")?);
            }
            "--labels" => {
                classify.labels_path = PathBuf::from(next_arg(&args, &mut idx, "--labels")?);
            }
            "--firmware" => {
                classify.firmware_path = PathBuf::from(next_arg(&args, &mut idx, "--firmware")?);
            }
            "--timeout-ms" => {
                let raw = next_arg(&args, &mut idx, "--timeout-ms")?;
                let millis: u64 = raw
                    .parse()
                    .map_err(|e| format!("--timeout-ms invalid integer '{}': {}", raw, e))?;
                classify.io_timeout = Duration::from_millis(millis);
            }
            other if other.starts_with("--") => {
                return Err(format!("unknown flag: {}", other));
            }
            other => {
                if image_path.is_some() {
                    return Err(format!("unexpected extra argument: {}", other));
                }
                image_path = Some(PathBuf::from(other));
            }
        }
        idx += 1;
    }

    let Some(image_path) = image_path else {
        return Err(
            "usage: image_classifier <image-path> [--graph PATH] [--labels PATH] [--firmware PATH] [--timeout-ms N]"
                .to_string(),
        );
    };

    Ok(Config {
        image_path,
        classify,
    })
}

fn run(config: Config) -> Result<(), Box<dyn Error>> {
    let starttime = timestamp_now();

    if !is_device_connected() {
        println!("No devices found");
        return Ok(());
    }

    let device = NcsDevice::new()?;
    info!(
        "found {} (vid 0x{:04x} pid 0x{:04x}, {})",
        device.name().unwrap_or("Movidius NCS"),
        device.vendor_id(),
        device.product_id(),
        if device.is_booted() { "runtime" } else { "boot mode" }
    );

    let [label1, label2, label3, label4, label5] = classify(&config.classify, &config.image_path)?;

    let cputemp = cpu_temperature().ok_or("unable to read CPU temperature")?;

    let record = ClassificationRecord {
        label1,
        label2,
        label3,
        label4,
        label5,
        currenttime: timestamp_now(),
        host: hostname(),
        cputemp: round_to(cputemp, 2),
        ipaddress: ip_address(),
        starttime,
    };

    println!("{}", serde_json::to_string(&record)?);
    Ok(())
}

fn main() {
    env_logger::init();

    let config = match parse_args() {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("error: {}", err);
            std::process::exit(2);
        }
    };

    if let Err(err) = run(config) {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}
