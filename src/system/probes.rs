//! Live text reports used by the agent tools
//!
//! Each probe returns a ready-to-read report string. Probes never fail; an
//! unavailable source is described in the returned text instead.

use std::path::Path;

use sysinfo::{Components, Disks, Networks, ProcessesToUpdate, System};

use super::collector::{format_uptime, percent, top_processes, ProcessOrder};
use super::platform::run_command;
use super::sockets;

const GIB: f64 = 1024.0 * 1024.0 * 1024.0;
const MIB: f64 = 1024.0 * 1024.0;

/// Services whose state is reported by the security scan
pub const SECURITY_SERVICES: [&str; 6] = [
    "ufw",
    "firewalld",
    "apparmor",
    "fail2ban",
    "auditd",
    "clamav-daemon",
];

async fn blocking<F>(what: &str, f: F) -> String
where
    F: FnOnce() -> String + Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!(probe = what, error = %e, "Probe task failed");
            format!("{} information not available", what)
        }
    }
}

pub async fn cpu_usage() -> String {
    blocking("CPU", || {
        let mut sys = System::new();
        sys.refresh_cpu_all();
        std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
        sys.refresh_cpu_all();

        let per_core: Vec<f32> = sys.cpus().iter().map(|c| c.cpu_usage()).collect();
        let average = if per_core.is_empty() {
            0.0
        } else {
            per_core.iter().sum::<f32>() / per_core.len() as f32
        };
        let frequencies: Vec<u64> = sys.cpus().iter().map(|c| c.frequency()).collect();
        format_cpu_report(average, &per_core, &frequencies)
    })
    .await
}

fn format_cpu_report(average: f32, per_core: &[f32], frequencies: &[u64]) -> String {
    let cores: Vec<String> = per_core.iter().map(|u| format!("'{:.1}%'", u)).collect();
    let mut report = format!(
        "CPU Usage: {:.1}% average across {} cores\nPer-core usage: [{}]\n",
        average,
        per_core.len(),
        cores.join(", ")
    );
    let known: Vec<u64> = frequencies.iter().copied().filter(|f| *f > 0).collect();
    if let Some(max) = known.iter().max() {
        let current = known.iter().sum::<u64>() / known.len() as u64;
        report.push_str(&format!("CPU Frequency: {} MHz (max: {} MHz)", current, max));
    }
    report
}

pub async fn memory() -> String {
    blocking("Memory", || {
        let mut sys = System::new();
        sys.refresh_memory();
        format!(
            "Physical Memory: {:.2}GB / {:.2}GB ({:.1}%)\n\
             Available: {:.2}GB\n\
             Swap Memory: {:.2}GB / {:.2}GB ({:.1}%)",
            sys.used_memory() as f64 / GIB,
            sys.total_memory() as f64 / GIB,
            percent(sys.used_memory(), sys.total_memory()),
            sys.available_memory() as f64 / GIB,
            sys.used_swap() as f64 / GIB,
            sys.total_swap() as f64 / GIB,
            percent(sys.used_swap(), sys.total_swap()),
        )
    })
    .await
}

pub async fn disks() -> String {
    blocking("Disk", || {
        let disks = Disks::new_with_refreshed_list();
        let mut lines = Vec::new();
        let (mut read, mut written) = (0u64, 0u64);
        for disk in disks.iter() {
            let total = disk.total_space();
            let used = total.saturating_sub(disk.available_space());
            lines.push(format!(
                "{} ({}): {:.2}GB / {:.2}GB ({:.1}% used)",
                disk.name().to_string_lossy(),
                disk.file_system().to_string_lossy(),
                used as f64 / GIB,
                total as f64 / GIB,
                percent(used, total),
            ));
            let usage = disk.usage();
            read += usage.total_read_bytes;
            written += usage.total_written_bytes;
        }
        if read > 0 || written > 0 {
            lines.push(format!(
                "\nDisk I/O: Read {:.2}GB, Write {:.2}GB",
                read as f64 / GIB,
                written as f64 / GIB
            ));
        }
        lines.join("\n")
    })
    .await
}

pub async fn top_processes_report() -> String {
    blocking("Process", || {
        let mut sys = System::new_all();
        std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
        sys.refresh_processes(ProcessesToUpdate::All, true);

        let mut report = String::from("Top 10 Processes by CPU Usage:\n");
        for proc in top_processes(&sys, 10, ProcessOrder::Cpu) {
            report.push_str(&format!(
                "- {} (PID: {}) - CPU: {:.1}%, Memory: {:.1}%\n",
                proc.name, proc.pid, proc.cpu_percent, proc.memory_percent
            ));
        }
        report.push_str("\nTop 10 Processes by Memory Usage:\n");
        for proc in top_processes(&sys, 10, ProcessOrder::Memory) {
            report.push_str(&format!(
                "- {} (PID: {}) - Memory: {:.1}%, CPU: {:.1}%\n",
                proc.name, proc.pid, proc.memory_percent, proc.cpu_percent
            ));
        }
        report
    })
    .await
}

pub async fn network() -> String {
    blocking("Network", || {
        let networks = Networks::new_with_refreshed_list();
        let mut names: Vec<&String> = networks.keys().collect();
        names.sort();

        let mut interfaces = Vec::new();
        let (mut sent, mut received) = (0u64, 0u64);
        for name in names {
            let Some(data) = networks.get(name) else {
                continue;
            };
            for net in data.ip_networks().iter().filter(|n| n.addr.is_ipv4()) {
                interfaces.push(format!("{}: {}", name, net.addr));
            }
            sent += data.total_transmitted();
            received += data.total_received();
        }

        let connections = if sockets::supported() {
            sockets::read_all().len().to_string()
        } else {
            format!("not available on {}", super::platform_name())
        };
        format!(
            "Network Interfaces:\n{}\nNetwork I/O: Sent {:.2}MB, Received {:.2}MB\nActive Connections: {}",
            interfaces.join("\n"),
            sent as f64 / MIB,
            received as f64 / MIB,
            connections
        )
    })
    .await
}

pub async fn thermal() -> String {
    blocking("Temperature", || {
        let components = Components::new_with_refreshed_list();
        let readings: Vec<String> = components
            .iter()
            .filter_map(|c| {
                c.temperature()
                    .map(|t| format!("{}: {:.1}°C", c.label(), t))
            })
            .collect();
        if readings.is_empty() {
            "Temperature sensors not available on this system".to_string()
        } else {
            format!("System Temperatures:\n{}", readings.join("\n"))
        }
    })
    .await
}

/// Battery state from `/sys/class/power_supply`
pub async fn battery() -> String {
    read_battery(Path::new("/sys/class/power_supply"))
        .await
        .unwrap_or_else(|| {
            "No battery detected (desktop system or battery info unavailable)".to_string()
        })
}

async fn read_battery(root: &Path) -> Option<String> {
    let mut entries = tokio::fs::read_dir(root).await.ok()?;
    while let Ok(Some(entry)) = entries.next_entry().await {
        let dir = entry.path();
        let kind = tokio::fs::read_to_string(dir.join("type")).await.unwrap_or_default();
        if kind.trim() != "Battery" {
            continue;
        }
        let capacity = tokio::fs::read_to_string(dir.join("capacity")).await.ok()?;
        let status = tokio::fs::read_to_string(dir.join("status")).await.unwrap_or_default();
        return format_battery(&capacity, &status);
    }
    None
}

fn format_battery(capacity: &str, status: &str) -> Option<String> {
    let capacity: u8 = capacity.trim().parse().ok()?;
    let state = match status.trim() {
        "Charging" | "Full" | "Not charging" => "Charging",
        _ => "Discharging",
    };
    Some(format!("Battery: {}% ({})", capacity, state))
}

pub fn uptime() -> String {
    format!("System uptime: {}", format_uptime(System::uptime()))
}

pub fn open_ports() -> String {
    if !sockets::supported() {
        return format!("Listening ports: not available on {}", super::platform_name());
    }
    let ports = sockets::listening_ports(&sockets::read_all());
    format!("Listening ports: {:?}", ports)
}

/// `systemctl is-active` state of each known security service
pub async fn security_services() -> String {
    if super::platform_name() != "linux" {
        return "Security service status is only available on systemd hosts".to_string();
    }
    let units = SECURITY_SERVICES.join(" ");
    let output = run_command(&format!("systemctl is-active {}", units)).await;
    // is-active exits non-zero when any unit is inactive, stdout still holds every state
    if output.stdout.trim().is_empty() {
        return format!("Unable to query services: {}", output.stderr.trim());
    }
    format_service_states(&SECURITY_SERVICES, &output.stdout)
}

fn format_service_states(units: &[&str], states: &str) -> String {
    let lines: Vec<String> = units
        .iter()
        .zip(states.lines())
        .map(|(unit, state)| format!("{}: {}", unit, state.trim()))
        .collect();
    let active = lines.iter().filter(|l| l.ends_with(": active")).count();
    format!("{} of {} active\n{}", active, lines.len(), lines.join("\n"))
}

/// Authentication events from the last 24 hours of the auth journal
pub async fn security_logs() -> String {
    if super::platform_name() != "linux" {
        return "Security log analysis is only available on systemd hosts".to_string();
    }
    let output = run_command(
        "journalctl --no-pager --since -24h -o cat SYSLOG_FACILITY=4 SYSLOG_FACILITY=10",
    )
    .await;
    if !output.success {
        return format!("Unable to read auth logs: {}", output.stderr.trim());
    }
    summarize_auth_events(&output.stdout)
}

fn summarize_auth_events(log: &str) -> String {
    let is_failure = |line: &str| {
        let line = line.to_lowercase();
        line.contains("failed password")
            || line.contains("authentication failure")
            || line.contains("invalid user")
    };
    let failures: Vec<&str> = log.lines().filter(|l| is_failure(l)).collect();
    let sudo = log.lines().filter(|l| l.contains("COMMAND=")).count();

    let mut summary = format!(
        "{} failed authentication attempts, {} sudo commands in the last 24 hours",
        failures.len(),
        sudo
    );
    let skip = failures.len().saturating_sub(5);
    for line in failures.iter().skip(skip) {
        summary.push_str(&format!("\n- {}", line.trim()));
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpu_report_format() {
        let report = format_cpu_report(15.0, &[10.0, 20.0], &[2400, 3600]);
        assert_eq!(
            report,
            "CPU Usage: 15.0% average across 2 cores\n\
             Per-core usage: ['10.0%', '20.0%']\n\
             CPU Frequency: 3000 MHz (max: 3600 MHz)"
        );
        let no_freq = format_cpu_report(0.0, &[0.0], &[0]);
        assert!(!no_freq.contains("Frequency"));
    }

    #[test]
    fn test_open_ports_reports_platform_support() {
        let report = open_ports();
        if sockets::supported() {
            assert!(report.starts_with("Listening ports: ["), "{report}");
        } else {
            assert_eq!(
                report,
                format!("Listening ports: not available on {}", std::env::consts::OS)
            );
        }
    }

    #[test]
    fn test_battery_format() {
        assert_eq!(
            format_battery("87\n", "Charging\n").as_deref(),
            Some("Battery: 87% (Charging)")
        );
        assert_eq!(
            format_battery("40", "Discharging").as_deref(),
            Some("Battery: 40% (Discharging)")
        );
        assert!(format_battery("n/a", "Full").is_none());
    }

    #[tokio::test]
    async fn test_read_battery_from_sysfs_tree() {
        let root = tempfile::tempdir().unwrap();
        let ac = root.path().join("AC");
        std::fs::create_dir(&ac).unwrap();
        std::fs::write(ac.join("type"), "Mains\n").unwrap();
        assert!(read_battery(root.path()).await.is_none());

        let bat = root.path().join("BAT0");
        std::fs::create_dir(&bat).unwrap();
        std::fs::write(bat.join("type"), "Battery\n").unwrap();
        std::fs::write(bat.join("capacity"), "55\n").unwrap();
        std::fs::write(bat.join("status"), "Discharging\n").unwrap();
        assert_eq!(
            read_battery(root.path()).await.as_deref(),
            Some("Battery: 55% (Discharging)")
        );
    }

    #[test]
    fn test_service_states() {
        let report = format_service_states(&["ufw", "auditd"], "active\ninactive\n");
        assert_eq!(report, "1 of 2 active\nufw: active\nauditd: inactive");
    }

    #[test]
    fn test_auth_summary() {
        let log = "\
Failed password for root from 10.0.0.5 port 2222 ssh2
pam_unix(sudo:session): session opened for user root
alice : TTY=pts/0 ; PWD=/home/alice ; USER=root ; COMMAND=/usr/bin/apt update
Invalid user admin from 10.0.0.9 port 4444
";
        let summary = summarize_auth_events(log);
        assert!(summary.starts_with(
            "2 failed authentication attempts, 1 sudo commands in the last 24 hours"
        ));
        assert!(summary.contains("- Invalid user admin"));
    }

    #[test]
    fn test_uptime_prefix() {
        assert!(uptime().starts_with("System uptime: "));
    }
}
