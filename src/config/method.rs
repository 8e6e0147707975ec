//! Network transport method passed to R's installer.

use std::str::FromStr;

use serde::Serialize;

use crate::error::StatpackError;
use crate::shell::Platform;

/// Download method handed to `install.packages(method = ...)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadMethod {
    /// Let R pick its default transport.
    #[default]
    Auto,
    /// libcurl-backed `curl` transport.
    Curl,
    /// Windows-only WinINet transport.
    #[serde(rename = "wininet")]
    LegacyWinInet,
}

impl DownloadMethod {
    /// All accepted spellings, for error messages and help text.
    pub const VALID: &'static [&'static str] = &["auto", "curl", "wininet"];

    /// Value passed as R's `method` argument.
    pub fn as_r_method(&self) -> &'static str {
        match self {
            DownloadMethod::Auto => "auto",
            DownloadMethod::Curl => "curl",
            DownloadMethod::LegacyWinInet => "wininet",
        }
    }

    /// Whether this method can work on `platform`.
    pub fn is_supported_on(&self, platform: Platform) -> bool {
        match self {
            DownloadMethod::LegacyWinInet => platform.is_windows(),
            DownloadMethod::Auto | DownloadMethod::Curl => true,
        }
    }

    /// Rewrite a method that cannot work on `platform` to [`DownloadMethod::Auto`].
    pub fn normalize_for(self, platform: Platform) -> Self {
        if self.is_supported_on(platform) {
            self
        } else {
            DownloadMethod::Auto
        }
    }
}

impl FromStr for DownloadMethod {
    type Err = StatpackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "curl" => Ok(Self::Curl),
            "wininet" => Ok(Self::LegacyWinInet),
            other => Err(StatpackError::configuration(format!(
                "unknown download method '{}' (expected one of: {})",
                other,
                Self::VALID.join(", ")
            ))),
        }
    }
}

impl std::fmt::Display for DownloadMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_r_method())
    }
}
