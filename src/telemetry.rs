use log::debug;
use std::net::UdpSocket;
use std::path::Path;
use std::process::Command;
use sysinfo::{Components, Disks, System};

// a.root-servers.net; the socket is never written to, connect() just picks
// the outbound interface.
const IP_PROBE_ADDR: &str = "198.41.0.4:53";

const THERMAL_ZONE_PATH: &str = "/sys/class/thermal/thermal_zone0/temp";

pub fn hostname() -> String {
    System::host_name().unwrap_or_else(|| "unknown".to_string())
}

pub fn ip_address() -> Option<String> {
    let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect(IP_PROBE_ADDR).ok()?;
    Some(socket.local_addr().ok()?.ip().to_string())
}

// vcgencmd is the authoritative source on a Pi; fall back to the generic
// thermal zone, then to whatever sensor chip sysinfo can see.
pub fn cpu_temperature() -> Option<f64> {
    if let Some(temp) = vcgencmd_temperature() {
        return Some(temp);
    }
    if let Some(temp) = thermal_zone_temperature() {
        return Some(temp);
    }
    component_temperature()
}

fn vcgencmd_temperature() -> Option<f64> {
    let output = Command::new("vcgencmd").arg("measure_temp").output().ok()?;
    if !output.status.success() {
        return None;
    }
    parse_vcgencmd_temp(&String::from_utf8_lossy(&output.stdout))
}

// vcgencmd prints a single line like "temp=48.3'C".
pub fn parse_vcgencmd_temp(raw: &str) -> Option<f64> {
    let rest = raw.trim().strip_prefix("temp=")?;
    let digits = rest.split('\'').next()?;
    digits.parse().ok()
}

pub fn thermal_zone_temperature() -> Option<f64> {
    let raw = std::fs::read_to_string(THERMAL_ZONE_PATH).ok()?;
    parse_thermal_millidegrees(&raw)
}

pub fn parse_thermal_millidegrees(raw: &str) -> Option<f64> {
    let millis: f64 = raw.trim().parse().ok()?;
    Some(millis / 1000.0)
}

fn component_temperature() -> Option<f64> {
    let components = Components::new_with_refreshed_list();
    for component in &components {
        let label = component.label().to_ascii_lowercase();
        if label.contains("cpu") || label.contains("package") || label.contains("soc") {
            debug!("cpu temperature from component '{}'", component.label());
            return Some(component.temperature() as f64);
        }
    }
    components
        .iter()
        .next()
        .map(|component| component.temperature() as f64)
}

pub fn memory_percent() -> f64 {
    let mut system = System::new();
    system.refresh_memory();
    let total = system.total_memory();
    if total == 0 {
        return 0.0;
    }
    let percent = system.used_memory() as f64 / total as f64 * 100.0;
    (percent * 10.0).round() / 10.0
}

pub fn disk_free_root() -> String {
    let disks = Disks::new_with_refreshed_list();
    let free = disks
        .iter()
        .find(|disk| disk.mount_point() == Path::new("/"))
        .map(|disk| disk.available_space())
        .unwrap_or(0);
    format_disk_free(free)
}

pub fn format_disk_free(bytes: u64) -> String {
    format!("{:.1} MB", bytes as f64 / 1024.0 / 1024.0)
}
