//! Host snapshot collection
//!
//! `sysinfo` covers the portable metrics; services, logs and packages come from the
//! platform's own tools and are parsed by the pure functions at the bottom of this file.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sysinfo::{Disks, Networks, ProcessesToUpdate, System};

use super::platform::{platform_name, run_command};
use super::sockets::{self, SocketEntry};

const TOP_PROCESSES: usize = 20;
const MAX_SERVICES: usize = 50;
const MAX_CONNECTIONS: usize = 20;
const MAX_PACKAGES: usize = 100;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BasicInfo {
    pub platform: String,
    pub system: String,
    pub release: String,
    pub version: String,
    pub machine: String,
    pub hostname: String,
    pub uptime: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CpuInfo {
    pub physical_cores: Option<usize>,
    pub total_cores: usize,
    pub max_frequency_mhz: Option<u64>,
    pub current_frequency_mhz: Option<u64>,
    pub cpu_usage: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryInfo {
    pub total: u64,
    pub available: u64,
    pub used: u64,
    pub free: u64,
    pub percent: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiskInfo {
    pub device: String,
    pub mountpoint: String,
    pub file_system: String,
    pub total_size: u64,
    pub used: u64,
    pub free: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HardwareInfo {
    pub cpu: CpuInfo,
    pub memory: MemoryInfo,
    pub disks: Vec<DiskInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessInfo {
    pub pid: u32,
    pub name: String,
    pub cpu_percent: f32,
    pub memory_percent: f32,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub name: String,
    pub status: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceAddress {
    pub interface: String,
    pub ip: String,
    pub prefix: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkInfo {
    pub interfaces: Vec<InterfaceAddress>,
    pub connections: Vec<SocketEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: Option<String>,
    pub priority: Option<String>,
    pub message: Option<String>,
    pub unit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageInfo {
    pub name: String,
    pub version: String,
}

/// Everything gathered in one collection pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemSnapshot {
    pub timestamp: DateTime<Utc>,
    pub basic_info: BasicInfo,
    pub hardware: HardwareInfo,
    pub processes: Vec<ProcessInfo>,
    pub services: Vec<ServiceInfo>,
    pub network: NetworkInfo,
    pub logs: Vec<LogEntry>,
    pub installed_software: Vec<PackageInfo>,
}

impl SystemSnapshot {
    /// Render the snapshot as the plain-text report that gets embedded
    pub fn format_for_embedding(&self) -> String {
        const GIB: f64 = 1024.0 * 1024.0 * 1024.0;
        let basic = &self.basic_info;
        let cpu = &self.hardware.cpu;
        let memory = &self.hardware.memory;

        let mut text = format!(
            "\nSystem Information Report - {}\n\n\
             === BASIC INFORMATION ===\n\
             Platform: {}\n\
             System: {} {}\n\
             Hostname: {}\n\
             Uptime: {}\n\n\
             === HARDWARE INFORMATION ===\n\
             CPU: {} physical cores, {} total cores\n\
             CPU Usage: {:.1}%\n\
             Memory: {:.2}GB used / {:.2}GB total ({:.1}%)\n\n\
             === TOP PROCESSES ===\n",
            self.timestamp.to_rfc3339(),
            basic.platform,
            basic.system,
            basic.release,
            basic.hostname,
            basic.uptime,
            cpu.physical_cores
                .map(|c| c.to_string())
                .unwrap_or_else(|| "unknown".to_string()),
            cpu.total_cores,
            cpu.cpu_usage,
            memory.used as f64 / GIB,
            memory.total as f64 / GIB,
            memory.percent,
        );

        for proc in self.processes.iter().take(10) {
            text.push_str(&format!(
                "- {} (PID: {}) - CPU: {:.1}%, Memory: {:.1}%\n",
                proc.name, proc.pid, proc.cpu_percent, proc.memory_percent
            ));
        }

        text.push_str("\n=== RECENT SYSTEM LOGS ===\n");
        for log in self.logs.iter().take(10) {
            text.push_str(&format!(
                "- {}\n",
                log.message.as_deref().unwrap_or("No message")
            ));
        }

        text
    }
}

/// Gathers [`SystemSnapshot`]s
#[derive(Debug, Clone)]
pub struct SystemDataCollector {
    max_log_entries: usize,
}

#[derive(Default)]
struct HostSample {
    basic_info: BasicInfo,
    hardware: HardwareInfo,
    processes: Vec<ProcessInfo>,
    interfaces: Vec<InterfaceAddress>,
    connections: Vec<SocketEntry>,
}

impl SystemDataCollector {
    pub fn new(max_log_entries: usize) -> Self {
        Self { max_log_entries }
    }

    /// Collect a full snapshot
    ///
    /// Sources that are unavailable on this platform simply come back empty.
    pub async fn collect_all(&self) -> SystemSnapshot {
        let sample = tokio::task::spawn_blocking(sample_host);
        let (sample, services, logs, installed_software) = tokio::join!(
            sample,
            self.services(),
            self.logs(),
            self.installed_software()
        );

        let sample = sample.unwrap_or_else(|e| {
            tracing::error!(error = %e, "Host sampling task failed");
            HostSample::default()
        });

        tracing::info!(
            processes = sample.processes.len(),
            services = services.len(),
            logs = logs.len(),
            packages = installed_software.len(),
            "Collected system snapshot"
        );

        SystemSnapshot {
            timestamp: Utc::now(),
            basic_info: sample.basic_info,
            hardware: sample.hardware,
            processes: sample.processes,
            services,
            network: NetworkInfo {
                interfaces: sample.interfaces,
                connections: sample.connections,
            },
            logs,
            installed_software,
        }
    }

    async fn services(&self) -> Vec<ServiceInfo> {
        let (command, parse): (&str, fn(&str) -> Vec<ServiceInfo>) = match platform_name() {
            "linux" => (
                "systemctl list-units --type=service --no-pager",
                parse_systemctl_units,
            ),
            "macos" => ("launchctl list", parse_launchctl_list),
            "windows" => (
                "powershell -NoProfile -Command \"Get-Service | Select-Object Name, Status, DisplayName | ConvertTo-Json\"",
                parse_windows_services,
            ),
            _ => return Vec::new(),
        };

        let output = run_command(command).await;
        if !output.success {
            tracing::debug!(stderr = %output.stderr.trim(), "Service listing unavailable");
            return Vec::new();
        }
        let mut services = parse(&output.stdout);
        services.truncate(MAX_SERVICES);
        services
    }

    async fn logs(&self) -> Vec<LogEntry> {
        let n = self.max_log_entries;
        let mut logs = match platform_name() {
            "linux" => {
                let output = run_command(&format!("journalctl --no-pager -n {} --output=json", n)).await;
                if output.success {
                    parse_journal(&output.stdout)
                } else {
                    Vec::new()
                }
            }
            "windows" => {
                let output = run_command(&format!(
                    "powershell -NoProfile -Command \"Get-WinEvent -FilterHashtable @{{LogName='System'; Level=1,2,3}} -MaxEvents {} | Select-Object TimeCreated, Id, LevelDisplayName, Message | ConvertTo-Json\"",
                    n
                ))
                .await;
                if output.success {
                    parse_windows_events(&output.stdout)
                } else {
                    Vec::new()
                }
            }
            _ => Vec::new(),
        };
        logs.truncate(n);
        logs
    }

    async fn installed_software(&self) -> Vec<PackageInfo> {
        let candidates: &[(&str, PackageFormat)] = match platform_name() {
            "linux" => &[
                ("dpkg -l", PackageFormat::Dpkg),
                (
                    "rpm -qa --queryformat '%{NAME} %{VERSION}\\n'",
                    PackageFormat::NameVersion,
                ),
                ("pacman -Q", PackageFormat::NameVersion),
            ],
            "macos" => &[("brew list --versions", PackageFormat::NameVersion)],
            "windows" => &[(
                "powershell -NoProfile -Command \"Get-CimInstance -ClassName Win32_Product | Select-Object Name, Version | ConvertTo-Json\"",
                PackageFormat::WindowsJson,
            )],
            _ => &[],
        };

        for (command, format) in candidates {
            let output = run_command(command).await;
            if output.success {
                let mut packages = parse_package_list(&output.stdout, *format);
                packages.truncate(MAX_PACKAGES);
                return packages;
            }
        }
        Vec::new()
    }
}

fn sample_host() -> HostSample {
    let mut sys = System::new_all();
    // CPU usage needs two refreshes separated by the minimum interval
    std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
    sys.refresh_cpu_usage();
    sys.refresh_processes(ProcessesToUpdate::All, true);

    let basic_info = BasicInfo {
        platform: System::long_os_version().unwrap_or_else(|| platform_name().to_string()),
        system: System::name().unwrap_or_else(|| platform_name().to_string()),
        release: System::kernel_version().unwrap_or_default(),
        version: System::os_version().unwrap_or_default(),
        machine: std::env::consts::ARCH.to_string(),
        hostname: System::host_name().unwrap_or_else(|| "unknown".to_string()),
        uptime: format_uptime(System::uptime()),
    };

    let frequencies: Vec<u64> = sys.cpus().iter().map(|c| c.frequency()).filter(|f| *f > 0).collect();
    let cpu = CpuInfo {
        physical_cores: System::physical_core_count(),
        total_cores: sys.cpus().len(),
        max_frequency_mhz: frequencies.iter().copied().max(),
        current_frequency_mhz: (!frequencies.is_empty())
            .then(|| frequencies.iter().sum::<u64>() / frequencies.len() as u64),
        cpu_usage: sys.global_cpu_usage(),
    };

    let memory = MemoryInfo {
        total: sys.total_memory(),
        available: sys.available_memory(),
        used: sys.used_memory(),
        free: sys.free_memory(),
        percent: percent(sys.used_memory(), sys.total_memory()),
    };

    let disks = Disks::new_with_refreshed_list()
        .iter()
        .map(|disk| {
            let total = disk.total_space();
            let free = disk.available_space();
            let used = total.saturating_sub(free);
            DiskInfo {
                device: disk.name().to_string_lossy().into_owned(),
                mountpoint: disk.mount_point().display().to_string(),
                file_system: disk.file_system().to_string_lossy().into_owned(),
                total_size: total,
                used,
                free,
                percentage: percent(used, total),
            }
        })
        .collect();

    let processes = top_processes(&sys, TOP_PROCESSES, ProcessOrder::Cpu);

    let networks = Networks::new_with_refreshed_list();
    let mut interfaces: Vec<InterfaceAddress> = networks
        .iter()
        .flat_map(|(name, data)| {
            data.ip_networks()
                .iter()
                .filter(|net| net.addr.is_ipv4())
                .map(move |net| InterfaceAddress {
                    interface: name.clone(),
                    ip: net.addr.to_string(),
                    prefix: net.prefix,
                })
        })
        .collect();
    interfaces.sort_by(|a, b| a.interface.cmp(&b.interface));

    let mut connections = sockets::read_all();
    connections.truncate(MAX_CONNECTIONS);

    HostSample {
        basic_info,
        hardware: HardwareInfo {
            cpu,
            memory,
            disks,
        },
        processes,
        interfaces,
        connections,
    }
}

/// Sort key for process listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProcessOrder {
    Cpu,
    Memory,
}

/// The `n` busiest processes from an already refreshed `System`
pub(crate) fn top_processes(sys: &System, n: usize, order: ProcessOrder) -> Vec<ProcessInfo> {
    let total_memory = sys.total_memory();
    let mut processes: Vec<ProcessInfo> = sys
        .processes()
        .iter()
        .map(|(pid, process)| ProcessInfo {
            pid: pid.as_u32(),
            name: process.name().to_string_lossy().into_owned(),
            cpu_percent: process.cpu_usage(),
            memory_percent: percent(process.memory(), total_memory) as f32,
            status: process.status().to_string(),
        })
        .collect();

    processes.sort_by(|a, b| {
        let (x, y) = match order {
            ProcessOrder::Cpu => (a.cpu_percent, b.cpu_percent),
            ProcessOrder::Memory => (a.memory_percent, b.memory_percent),
        };
        y.partial_cmp(&x).unwrap_or(std::cmp::Ordering::Equal)
    });
    processes.truncate(n);
    processes
}

pub(crate) fn percent(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

/// `273906` -> `3 days, 4:05:06`
pub fn format_uptime(seconds: u64) -> String {
    let days = seconds / 86_400;
    let hours = (seconds % 86_400) / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    let clock = format!("{}:{:02}:{:02}", hours, minutes, secs);
    match days {
        0 => clock,
        1 => format!("1 day, {}", clock),
        n => format!("{} days, {}", n, clock),
    }
}

/// Parse `systemctl list-units --type=service --no-pager`
///
/// Stops at the blank line that separates the unit table from the legend.
pub fn parse_systemctl_units(output: &str) -> Vec<ServiceInfo> {
    output
        .lines()
        .skip(1)
        .take_while(|line| !line.trim().is_empty())
        .filter_map(|line| {
            // Failed units are prefixed with a bullet
            let line = line.trim_start().trim_start_matches('●').trim_start();
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < 4 {
                return None;
            }
            Some(ServiceInfo {
                name: parts[0].to_string(),
                status: parts[2].to_string(),
                description: parts[4..].join(" "),
            })
        })
        .collect()
}

/// Parse `launchctl list` (`PID  Status  Label`)
pub fn parse_launchctl_list(output: &str) -> Vec<ServiceInfo> {
    output
        .lines()
        .skip(1)
        .filter_map(|line| {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < 3 {
                return None;
            }
            let status = if parts[0] == "-" { "inactive" } else { "active" };
            Some(ServiceInfo {
                name: parts[2].to_string(),
                status: status.to_string(),
                description: format!("last exit status {}", parts[1]),
            })
        })
        .collect()
}

fn json_list(output: &str) -> Vec<serde_json::Value> {
    match serde_json::from_str::<serde_json::Value>(output.trim()) {
        Ok(serde_json::Value::Array(items)) => items,
        Ok(value @ serde_json::Value::Object(_)) => vec![value],
        _ => Vec::new(),
    }
}

fn json_text(value: &serde_json::Value, key: &str) -> Option<String> {
    match value.get(key)? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// Parse `Get-Service | ConvertTo-Json`
pub fn parse_windows_services(output: &str) -> Vec<ServiceInfo> {
    json_list(output)
        .iter()
        .filter_map(|item| {
            let status = match item.get("Status") {
                // ServiceControllerStatus enum values
                Some(serde_json::Value::Number(n)) => match n.as_u64() {
                    Some(1) => "Stopped".to_string(),
                    Some(4) => "Running".to_string(),
                    Some(7) => "Paused".to_string(),
                    _ => n.to_string(),
                },
                _ => json_text(item, "Status").unwrap_or_default(),
            };
            Some(ServiceInfo {
                name: json_text(item, "Name")?,
                status,
                description: json_text(item, "DisplayName").unwrap_or_default(),
            })
        })
        .collect()
}

/// Parse `journalctl --output=json` (one JSON object per line)
pub fn parse_journal(output: &str) -> Vec<LogEntry> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| serde_json::from_str::<serde_json::Value>(line).ok())
        .map(|entry| LogEntry {
            timestamp: json_text(&entry, "__REALTIME_TIMESTAMP"),
            priority: json_text(&entry, "PRIORITY"),
            // Binary messages arrive as byte arrays and are skipped
            message: entry
                .get("MESSAGE")
                .and_then(|m| m.as_str())
                .map(str::to_string),
            unit: json_text(&entry, "_SYSTEMD_UNIT"),
        })
        .collect()
}

/// Parse `Get-WinEvent | ConvertTo-Json`
pub fn parse_windows_events(output: &str) -> Vec<LogEntry> {
    json_list(output)
        .iter()
        .map(|item| LogEntry {
            timestamp: json_text(item, "TimeCreated"),
            priority: json_text(item, "LevelDisplayName"),
            message: json_text(item, "Message"),
            unit: json_text(item, "Id"),
        })
        .collect()
}

/// Output layout of a package manager listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageFormat {
    /// `dpkg -l` table
    Dpkg,
    /// `name version` per line (`pacman -Q`, `brew list --versions`, rpm queryformat)
    NameVersion,
    /// PowerShell JSON with `Name` and `Version`
    WindowsJson,
}

/// Parse a package listing
pub fn parse_package_list(output: &str, format: PackageFormat) -> Vec<PackageInfo> {
    match format {
        PackageFormat::Dpkg => output
            .lines()
            .filter(|line| line.starts_with("ii") || line.starts_with("hi"))
            .filter_map(|line| {
                let parts: Vec<&str> = line.split_whitespace().collect();
                Some(PackageInfo {
                    name: parts.get(1)?.to_string(),
                    version: parts.get(2).unwrap_or(&"unknown").to_string(),
                })
            })
            .collect(),
        PackageFormat::NameVersion => output
            .lines()
            .filter_map(|line| {
                let mut parts = line.split_whitespace();
                let name = parts.next()?;
                Some(PackageInfo {
                    name: name.to_string(),
                    version: parts.next().unwrap_or("unknown").to_string(),
                })
            })
            .collect(),
        PackageFormat::WindowsJson => json_list(output)
            .iter()
            .filter_map(|item| {
                Some(PackageInfo {
                    name: json_text(item, "Name")?,
                    version: json_text(item, "Version").unwrap_or_else(|| "unknown".to_string()),
                })
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SYSTEMCTL: &str = "\
  UNIT                     LOAD   ACTIVE SUB     DESCRIPTION
  cron.service             loaded active running Regular background program processing daemon
● nginx.service            loaded failed failed  A high performance web server
  ssh.service              loaded active running OpenBSD Secure Shell server

LOAD   = Reflects whether the unit definition was properly loaded.
ACTIVE = The high-level unit activation state, i.e. generalization of SUB.
";

    #[test]
    fn test_parse_systemctl_units() {
        let services = parse_systemctl_units(SYSTEMCTL);
        assert_eq!(services.len(), 3);
        assert_eq!(services[0].name, "cron.service");
        assert_eq!(services[0].status, "active");
        assert_eq!(
            services[0].description,
            "Regular background program processing daemon"
        );
        assert_eq!(services[1].name, "nginx.service");
        assert_eq!(services[1].status, "failed");
    }

    #[test]
    fn test_parse_launchctl() {
        let output = "PID\tStatus\tLabel\n-\t0\tcom.apple.foo\n123\t0\tcom.apple.bar\n";
        let services = parse_launchctl_list(output);
        assert_eq!(services.len(), 2);
        assert_eq!(services[0].status, "inactive");
        assert_eq!(services[1].name, "com.apple.bar");
    }

    #[test]
    fn test_parse_journal() {
        let output = r#"{"__REALTIME_TIMESTAMP":"1700000000000000","PRIORITY":"3","MESSAGE":"disk full","_SYSTEMD_UNIT":"app.service"}
not json
{"PRIORITY":"6","MESSAGE":[104,105]}
"#;
        let logs = parse_journal(output);
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].message.as_deref(), Some("disk full"));
        assert_eq!(logs[0].unit.as_deref(), Some("app.service"));
        assert!(logs[1].message.is_none());
    }

    #[test]
    fn test_parse_windows_services_single_object() {
        let output = r#"{"Name":"Spooler","Status":4,"DisplayName":"Print Spooler"}"#;
        let services = parse_windows_services(output);
        assert_eq!(services.len(), 1);
        assert_eq!(services[0].status, "Running");
        assert_eq!(services[0].description, "Print Spooler");
    }

    #[test]
    fn test_parse_packages() {
        let dpkg = "\
Desired=Unknown/Install/Remove/Purge/Hold
||/ Name           Version      Architecture Description
+++-==============-============-============-=================================
ii  bash           5.1-6ubuntu1 amd64        GNU Bourne Again SHell
rc  oldpkg         1.0          amd64        removed package
ii  coreutils      8.32-4.1     amd64        GNU core utilities
";
        let packages = parse_package_list(dpkg, PackageFormat::Dpkg);
        assert_eq!(
            packages,
            vec![
                PackageInfo {
                    name: "bash".to_string(),
                    version: "5.1-6ubuntu1".to_string()
                },
                PackageInfo {
                    name: "coreutils".to_string(),
                    version: "8.32-4.1".to_string()
                },
            ]
        );

        let pacman = parse_package_list("linux 6.6.1\nvim 9.0\nlonely\n", PackageFormat::NameVersion);
        assert_eq!(pacman.len(), 3);
        assert_eq!(pacman[2].version, "unknown");

        let windows = parse_package_list(
            r#"[{"Name":"7-Zip","Version":"23.01"},{"Name":null}]"#,
            PackageFormat::WindowsJson,
        );
        assert_eq!(windows.len(), 1);
    }

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(59), "0:00:59");
        assert_eq!(format_uptime(86_400 + 3_661), "1 day, 1:01:01");
        assert_eq!(format_uptime(273_906), "3 days, 4:05:06");
    }

    fn sample_snapshot() -> SystemSnapshot {
        SystemSnapshot {
            timestamp: Utc::now(),
            basic_info: BasicInfo {
                platform: "Ubuntu 22.04".to_string(),
                system: "Linux".to_string(),
                release: "6.5.0".to_string(),
                hostname: "web01".to_string(),
                uptime: "2 days, 1:00:00".to_string(),
                ..BasicInfo::default()
            },
            hardware: HardwareInfo {
                cpu: CpuInfo {
                    physical_cores: Some(4),
                    total_cores: 8,
                    cpu_usage: 12.5,
                    ..CpuInfo::default()
                },
                memory: MemoryInfo {
                    total: 16 * 1024 * 1024 * 1024,
                    used: 4 * 1024 * 1024 * 1024,
                    percent: 25.0,
                    ..MemoryInfo::default()
                },
                disks: vec![],
            },
            processes: (0..12)
                .map(|i| ProcessInfo {
                    pid: 100 + i,
                    name: format!("worker{}", i),
                    cpu_percent: 1.0,
                    memory_percent: 0.5,
                    status: "Run".to_string(),
                })
                .collect(),
            services: vec![],
            network: NetworkInfo::default(),
            logs: vec![
                LogEntry {
                    message: Some("kernel: eth0 link up".to_string()),
                    ..LogEntry::default()
                },
                LogEntry::default(),
            ],
            installed_software: vec![],
        }
    }

    #[test]
    fn test_format_for_embedding_sections() {
        let text = sample_snapshot().format_for_embedding();
        assert!(text.contains("=== BASIC INFORMATION ==="));
        assert!(text.contains("Hostname: web01"));
        assert!(text.contains("System: Linux 6.5.0"));
        assert!(text.contains("CPU: 4 physical cores, 8 total cores"));
        assert!(text.contains("Memory: 4.00GB used / 16.00GB total (25.0%)"));
        assert!(text.contains("- worker0 (PID: 100) - CPU: 1.0%, Memory: 0.5%"));
        assert!(text.contains("worker9"));
        assert!(!text.contains("worker10"));
        assert!(text.contains("- kernel: eth0 link up\n- No message\n"));
    }
}
