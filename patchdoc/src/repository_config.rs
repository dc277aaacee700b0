//! Configuration of the repository layer.

use crate::common::{atomic, Atomic, ReadExecutor, WriteExecutor, PLUGIN_NAME};
use crate::convert::{set_date_zone, DateZone};
use crate::errors::{ErrorKind, PatchError, PatchResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Settings shared by a repository factory and its repositories.
///
/// Cloning is cheap; clones share the same settings. Settings can change
/// until the configuration is built (or handed to a factory), after which
/// it is read-only.
#[derive(Clone, Debug)]
pub struct RepositoryConfig {
    inner: Arc<RepositoryConfigInner>,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl RepositoryConfig {
    pub fn new() -> Self {
        RepositoryConfig {
            inner: Arc::new(RepositoryConfigInner::new()),
        }
    }

    pub fn builder() -> RepositoryConfigBuilder {
        RepositoryConfigBuilder::new()
    }

    pub fn database_name(&self) -> Option<String> {
        self.inner.database_name.get().cloned()
    }

    pub fn set_database_name(&self, name: &str) -> PatchResult<()> {
        self.inner.set_database_name(name)
    }

    pub fn date_zone(&self) -> DateZone {
        self.inner.date_zone.read_with(|zone| *zone)
    }

    pub fn set_date_zone(&self, zone: DateZone) -> PatchResult<()> {
        self.inner.ensure_not_configured("Date zone")?;
        self.inner.date_zone.write_with(|current| *current = zone);
        Ok(())
    }

    /// Name used to tag this configuration's log lines.
    pub fn plugin_name(&self) -> String {
        self.inner.plugin_name.read_with(|name| name.clone())
    }

    pub fn set_plugin_name(&self, name: &str) -> PatchResult<()> {
        self.inner.ensure_not_configured("Plugin name")?;
        if name.is_empty() {
            log::error!("Plugin name cannot be empty");
            return Err(PatchError::new(
                "Plugin name cannot be empty",
                ErrorKind::InvalidOperation,
            ));
        }
        self.inner.plugin_name.write_with(|current| *current = name.to_string());
        Ok(())
    }

    pub fn is_configured(&self) -> bool {
        self.inner.configured.load(Ordering::Acquire)
    }

    /// Validates the settings, installs the date zone for the converters and
    /// freezes the configuration. Calling it again is a no-op.
    pub fn configure(&self) -> PatchResult<()> {
        self.inner.configure()
    }
}

#[derive(Debug)]
struct RepositoryConfigInner {
    configured: AtomicBool,
    database_name: OnceLock<String>,
    date_zone: Atomic<DateZone>,
    plugin_name: Atomic<String>,
}

impl RepositoryConfigInner {
    fn new() -> Self {
        RepositoryConfigInner {
            configured: AtomicBool::from(false),
            database_name: OnceLock::new(),
            date_zone: atomic(DateZone::default()),
            plugin_name: atomic(PLUGIN_NAME.to_string()),
        }
    }

    fn ensure_not_configured(&self, setting: &str) -> PatchResult<()> {
        if self.configured.load(Ordering::Acquire) {
            log::error!("{} cannot be changed after configuration", setting);
            return Err(PatchError::new(
                &format!("{} cannot be changed after configuration", setting),
                ErrorKind::InvalidOperation,
            ));
        }
        Ok(())
    }

    fn set_database_name(&self, name: &str) -> PatchResult<()> {
        self.ensure_not_configured("Database name")?;
        if name.is_empty() {
            log::error!("Database name cannot be empty");
            return Err(PatchError::new(
                "Database name cannot be empty",
                ErrorKind::InvalidOperation,
            ));
        }

        self.database_name.set(name.to_string()).map_err(|_| {
            log::error!("Database name is already set");
            PatchError::new("Database name is already set", ErrorKind::InvalidOperation)
        })
    }

    fn configure(&self) -> PatchResult<()> {
        if self.configured.load(Ordering::Acquire) {
            return Ok(());
        }

        if self.database_name.get().is_none() {
            log::error!("Database name is required");
            return Err(PatchError::new(
                "Database name is required",
                ErrorKind::InvalidOperation,
            ));
        }

        let zone = self.date_zone.read_with(|zone| *zone);
        set_date_zone(zone);
        self.configured.store(true, Ordering::Release);
        log::debug!("Repository configuration frozen with date zone {}", zone);
        Ok(())
    }
}

/// Builder for [RepositoryConfig].
///
/// The first invalid setting is kept and returned by [build](Self::build).
///
/// ```rust
/// use patchdoc::convert::DateZone;
/// use patchdoc::repository_config::RepositoryConfig;
///
/// let config = RepositoryConfig::builder()
///     .database_name("shop")
///     .date_zone(DateZone::Local)
///     .build()
///     .unwrap();
/// assert_eq!(config.database_name().as_deref(), Some("shop"));
/// ```
#[derive(Default)]
pub struct RepositoryConfigBuilder {
    error: Option<PatchError>,
    config: RepositoryConfig,
}

impl RepositoryConfigBuilder {
    pub fn new() -> Self {
        RepositoryConfigBuilder {
            error: None,
            config: RepositoryConfig::new(),
        }
    }

    pub fn database_name(mut self, name: &str) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.config.set_database_name(name) {
                self.error = Some(e);
            }
        }
        self
    }

    pub fn date_zone(mut self, zone: DateZone) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.config.set_date_zone(zone) {
                self.error = Some(e);
            }
        }
        self
    }

    /// Uses a fixed offset of `seconds_east` from UTC as the date zone.
    pub fn fixed_offset(mut self, seconds_east: i32) -> Self {
        if self.error.is_none() {
            match DateZone::fixed(seconds_east) {
                Ok(zone) => return self.date_zone(zone),
                Err(e) => self.error = Some(e),
            }
        }
        self
    }

    pub fn plugin_name(mut self, name: &str) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.config.set_plugin_name(name) {
                self.error = Some(e);
            }
        }
        self
    }

    pub fn build(self) -> PatchResult<RepositoryConfig> {
        if let Some(error) = self.error {
            return Err(error);
        }
        self.config.configure()?;
        Ok(self.config)
    }
}
