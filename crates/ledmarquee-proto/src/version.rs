use std::fmt;

/// Firmware version reported by a module.
///
/// The official dialect reports all fields. The sigroot dialect only reports
/// major and minor, so `patch` is `None` and `pre_release` is `false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VersionInfo {
    /// Major version
    pub major: u16,
    /// Minor version
    pub minor: u16,
    /// Patch version, when the dialect reports one
    pub patch: Option<u16>,
    /// Pre-release build flag
    pub pre_release: bool,
}

impl fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)?;
        if let Some(patch) = self.patch {
            write!(f, ".{patch}")?;
        }
        if self.pre_release {
            f.write_str("-pre")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        let full = VersionInfo { major: 0, minor: 2, patch: Some(1), pre_release: true };
        assert_eq!(full.to_string(), "0.2.1-pre");

        let short = VersionInfo { major: 1, minor: 12, patch: None, pre_release: false };
        assert_eq!(short.to_string(), "1.12");
    }
}
