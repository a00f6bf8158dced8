//! Application configuration parsed from environment variables.
//!
//! - `PDFMAPPER_PREVIEW_DEBOUNCE_MS`: quiet period before a preview render (default 800)
//! - `PDFMAPPER_DATE_FORMAT`: `as_is` (default) or `us`
//! - `PDFMAPPER_DEFAULT_PAGE_SIZE`: `WxH` in document points (default `612x792`)
//!
//! A debounce value that does not parse falls back to its default. The other
//! two are rejected, since a silently wrong page size or date style would
//! produce wrong output.

use std::time::Duration;

use engine::overlay::DateFormat;
use engine::transform::PageDimensions;

pub const DEFAULT_PREVIEW_DEBOUNCE_MS: u64 = 800;
pub const DEFAULT_PAGE_SIZE: &str = "612x792";

pub const ENV_PREVIEW_DEBOUNCE_MS: &str = "PDFMAPPER_PREVIEW_DEBOUNCE_MS";
pub const ENV_DATE_FORMAT: &str = "PDFMAPPER_DATE_FORMAT";
pub const ENV_DEFAULT_PAGE_SIZE: &str = "PDFMAPPER_DEFAULT_PAGE_SIZE";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown date format '{0}' (expected 'as_is' or 'us')")]
    DateFormat(String),
    #[error("invalid page size '{0}' (expected WxH with positive numbers, e.g. 612x792)")]
    PageSize(String),
    #[error("invalid page override '{0}' (expected N=WxH with N >= 1)")]
    PageOverride(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AppConfig {
    pub preview_debounce: Duration,
    pub date_format: DateFormat,
    pub default_page_size: PageDimensions,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            preview_debounce: Duration::from_millis(DEFAULT_PREVIEW_DEBOUNCE_MS),
            date_format: DateFormat::AsIs,
            default_page_size: PageDimensions::new(612.0, 792.0),
        }
    }
}

impl AppConfig {
    /// Build typed config from the process environment.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for an unknown date format or a malformed
    /// page size.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build typed config from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same as [`AppConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let debounce_ms = env_parse(&lookup, ENV_PREVIEW_DEBOUNCE_MS, DEFAULT_PREVIEW_DEBOUNCE_MS);
        let date_format = parse_date_format(lookup(ENV_DATE_FORMAT).as_deref().unwrap_or("as_is"))?;
        let default_page_size = parse_page_size(lookup(ENV_DEFAULT_PAGE_SIZE).as_deref().unwrap_or(DEFAULT_PAGE_SIZE))?;
        Ok(Self { preview_debounce: Duration::from_millis(debounce_ms), date_format, default_page_size })
    }
}

fn env_parse<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    lookup(key).and_then(|v| v.trim().parse::<T>().ok()).unwrap_or(default)
}

/// Parse `as_is` or `us`.
///
/// # Errors
///
/// Returns [`ConfigError::DateFormat`] for anything else.
pub fn parse_date_format(raw: &str) -> Result<DateFormat, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "as_is" | "as-is" | "asis" => Ok(DateFormat::AsIs),
        "us" => Ok(DateFormat::Us),
        _ => Err(ConfigError::DateFormat(raw.to_owned())),
    }
}

/// Parse a `WxH` page size such as `612x792`.
///
/// # Errors
///
/// Returns [`ConfigError::PageSize`] unless both sides are positive finite numbers.
pub fn parse_page_size(raw: &str) -> Result<PageDimensions, ConfigError> {
    let err = || ConfigError::PageSize(raw.to_owned());
    let (w, h) = raw.trim().split_once(['x', 'X']).ok_or_else(err)?;
    let width: f64 = w.trim().parse().map_err(|_| err())?;
    let height: f64 = h.trim().parse().map_err(|_| err())?;
    if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
        return Err(err());
    }
    Ok(PageDimensions::new(width, height))
}

/// Parse an `N=WxH` per-page size override.
///
/// # Errors
///
/// Returns [`ConfigError::PageOverride`] for a bad page number and
/// [`ConfigError::PageSize`] for a bad size.
pub fn parse_page_override(raw: &str) -> Result<(u32, PageDimensions), ConfigError> {
    let (page, size) = raw.split_once('=').ok_or_else(|| ConfigError::PageOverride(raw.to_owned()))?;
    let page: u32 = match page.trim().parse() {
        Ok(n) if n >= 1 => n,
        _ => return Err(ConfigError::PageOverride(raw.to_owned())),
    };
    Ok((page, parse_page_size(size)?))
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
