//! ns-3 installation discovery.
//!
//! Probes the usual install locations and validates candidates by the
//! presence of a launcher (`ns3` for modern trees, `waf` for old ones).

use std::path::{Path, PathBuf};

use tracing::debug;

/// Which launcher the install carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Launcher {
    Ns3,
    Waf,
}

#[derive(Debug, Clone)]
pub struct Ns3Install {
    pub root: PathBuf,
    pub launcher: Launcher,
    pub version: Option<String>,
}

/// Probe well-known locations for an ns-3 tree.
///
/// Order: `$NS3_HOME`, `~/ns-3-dev`, `~/ns3`, `~/ns-allinone-*` children,
/// then `ns-3*` directories under /opt and /usr/local.
pub fn detect_ns3() -> Option<Ns3Install> {
    if let Ok(home) = std::env::var("NS3_HOME") {
        if let Some(install) = validate_install(Path::new(&home)) {
            return Some(install);
        }
    }
    if let Ok(home) = std::env::var("HOME") {
        let home = PathBuf::from(home);
        for candidate in [home.join("ns-3-dev"), home.join("ns3"), home.join("ns-3")] {
            if let Some(install) = validate_install(&candidate) {
                return Some(install);
            }
        }
        if let Some(install) = scan_dir(&home) {
            return Some(install);
        }
    }
    for base in ["/opt", "/usr/local"] {
        if let Some(install) = scan_dir(Path::new(base)) {
            return Some(install);
        }
    }
    None
}

/// Look for `ns-3*` / `ns-allinone-*` children of `base`.
fn scan_dir(base: &Path) -> Option<Ns3Install> {
    let entries = std::fs::read_dir(base).ok()?;
    let mut candidates: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("ns-3") || n.starts_with("ns-allinone"))
        })
        .collect();
    candidates.sort();
    // prefer the highest version when several are installed
    for candidate in candidates.into_iter().rev() {
        if let Some(install) = validate_install(&candidate) {
            return Some(install);
        }
        // allinone bundles nest the actual tree one level down
        if let Ok(children) = std::fs::read_dir(&candidate) {
            let mut nested: Vec<PathBuf> = children
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| {
                    p.file_name()
                        .and_then(|n| n.to_str())
                        .is_some_and(|n| n.starts_with("ns-3"))
                })
                .collect();
            nested.sort();
            for child in nested.into_iter().rev() {
                if let Some(install) = validate_install(&child) {
                    return Some(install);
                }
            }
        }
    }
    None
}

/// A directory is a usable install when it carries a launcher file.
pub fn validate_install(root: &Path) -> Option<Ns3Install> {
    let launcher = if root.join("ns3").is_file() {
        Launcher::Ns3
    } else if root.join("waf").is_file() {
        Launcher::Waf
    } else {
        return None;
    };
    let version = ns3_version(root);
    debug!(root = %root.display(), ?launcher, ?version, "发现 ns-3 安装");
    Some(Ns3Install {
        root: root.to_path_buf(),
        launcher,
        version,
    })
}

/// Version from the VERSION file, or from the directory name.
fn ns3_version(root: &Path) -> Option<String> {
    if let Ok(raw) = std::fs::read_to_string(root.join("VERSION")) {
        let version = raw.trim().to_string();
        if !version.is_empty() {
            return Some(version);
        }
    }
    root.file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| n.strip_prefix("ns-"))
        .map(|v| v.to_string())
}
