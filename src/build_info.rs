//! Version and build stamp of the running binary
//!
//! `build.rs` exports the build counter and compile time as environment
//! variables; they are folded into constants here so `get_status` and the
//! startup banner can report exactly which build is serving.

use serde::Serialize;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Local build counter; 0 when built without `build.rs` output
pub const BUILD_NUMBER: u64 = match option_env!("FITMACRO_BUILD_NUMBER") {
    Some(raw) => parse_build_number(raw),
    None => 0,
};

/// UTC compile time, `YYYY-MM-DDTHH:MM:SSZ`
pub const BUILD_TIMESTAMP: &str = match option_env!("FITMACRO_BUILD_TIMESTAMP") {
    Some(ts) => ts,
    None => "unknown",
};

/// Decimal digits to a number at compile time; malformed input yields 0
const fn parse_build_number(raw: &str) -> u64 {
    let digits = raw.as_bytes();
    if digits.is_empty() {
        return 0;
    }
    let mut n: u64 = 0;
    let mut i = 0;
    while i < digits.len() {
        let d = digits[i];
        if !d.is_ascii_digit() {
            return 0;
        }
        n = n * 10 + (d - b'0') as u64;
        i += 1;
    }
    n
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub build_number: u64,
    pub build_timestamp: &'static str,
    pub description: &'static str,
}

impl BuildInfo {
    pub fn current() -> Self {
        Self {
            name: NAME,
            version: VERSION,
            build_number: BUILD_NUMBER,
            build_timestamp: BUILD_TIMESTAMP,
            description: DESCRIPTION,
        }
    }
}

/// Print the startup banner to stderr (stdout belongs to the MCP transport)
pub fn print_startup_banner() {
    let info = BuildInfo::current();
    eprintln!("===============================================");
    eprintln!("  FitMacro Planner");
    eprintln!("  Version: {} | Build: {}", info.version, info.build_number);
    eprintln!("  Compiled: {}", info.build_timestamp);
    eprintln!("===============================================");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_build_number() {
        assert_eq!(parse_build_number("42"), 42);
        assert_eq!(parse_build_number("4x2"), 0);
        assert_eq!(parse_build_number(""), 0);
    }

    #[test]
    fn test_current_reports_package() {
        let info = BuildInfo::current();
        assert_eq!(info.name, "fitmacro");
        assert_eq!(info.version, env!("CARGO_PKG_VERSION"));
    }
}
