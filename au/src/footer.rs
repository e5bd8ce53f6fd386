//! Diagnostic footer comment
//!
//! Pages end with an HTML comment naming the project version and how much
//! CPU time the render took, split into user (compute) and system (syscall)
//! time.

use std::fs;
use std::io::{BufRead, BufReader};
use std::path::Path;

use nix::sys::resource::{UsageWho, getrusage};
use tracing::{debug, warn};

use crate::error::{AuroraError, AuroraResult};

/// Default keyword introducing the version header line
pub const DEFAULT_VERSION_MARKER: &str = "$Aurora:";

const VIM_MODELINE: &str = "\tvim: ft=html sts=4 sw=4 ts=4 noet:\n";

/// CPU time consumed by this process, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResourceUsage {
    pub user_ms: i64,
    pub system_ms: i64,
}

impl ResourceUsage {
    /// Sample the current process usage
    pub fn now() -> AuroraResult<Self> {
        let usage = getrusage(UsageWho::RUSAGE_SELF)?;
        let user = usage.user_time();
        let system = usage.system_time();
        Ok(Self {
            user_ms: user.tv_sec() as i64 * 1000 + user.tv_usec() as i64 / 1000,
            system_ms: system.tv_sec() as i64 * 1000 + system.tv_usec() as i64 / 1000,
        })
    }
}

/// Format the usage between two samples
pub fn render_time(start: &ResourceUsage, end: &ResourceUsage) -> String {
    format!(
        "compute:{}ms  syscall:{}ms",
        end.user_ms - start.user_ms,
        end.system_ms - start.system_ms
    )
}

/// Pull the version string from the keyword header of a project file.
///
/// The header is an RCS-style line such as
/// ` * $Aurora: index.rs,v 1.0.3 2024/07/09 04:35:51 -0700 kyau Exp $`,
/// which becomes `$Aurora: index.html,v 1.0.3-1a2b3c4d` where the suffix is
/// the first eight hex digits of the md5 of the date and time fields.
pub fn project_version(project_file: &Path, marker: &str) -> AuroraResult<String> {
    let file = fs::File::open(project_file)?;
    let prefix = format!(" * {}", marker);

    for line in BufReader::new(file).lines() {
        let line = line?;
        if !line.starts_with(&prefix) {
            continue;
        }
        let fields: Vec<&str> = line.split(' ').collect();
        if fields.len() < 7 {
            debug!(%line, "project_version: header too short");
            continue;
        }
        let hash = format!("{:x}", md5::compute(format!("{}{}", fields[5], fields[6])));
        let page = project_file
            .file_name()
            .map(|name| name.to_string_lossy().to_lowercase())
            .map(|name| Path::new(&name).with_extension("html").to_string_lossy().into_owned())
            .unwrap_or_default();
        return Ok(format!("{} {},v {}-{}", fields[2], page, fields[4], &hash[..8]));
    }

    Err(AuroraError::VersionNotFound {
        path: project_file.to_path_buf(),
    })
}

/// Build the closing diagnostic comment.
///
/// A missing version header does not fail the page; the comment reads
/// `unknown` instead.
pub fn comment(start: &ResourceUsage, project_file: &Path, marker: &str, vim: bool) -> AuroraResult<String> {
    let time = render_time(start, &ResourceUsage::now()?);
    let version = match project_version(project_file, marker) {
        Ok(version) => version,
        Err(e) => {
            warn!(file = %project_file.display(), error = %e, "no project version");
            "unknown".to_string()
        }
    };
    Ok(format!(
        "\n<!--\n\t{}  {}\n{}-->",
        version,
        time,
        if vim { VIM_MODELINE } else { "" }
    ))
}
