//! Scoped CPU profiling for a whole run.

use std::path::Path;
#[cfg(unix)]
use std::path::PathBuf;

use crate::config::ConfigError;

#[cfg(unix)]
const SAMPLE_FREQUENCY: i32 = 100;

/// Samples the process from [`CpuProfile::start`] until drop, then writes a
/// pprof protobuf report to the destination file.
#[cfg(unix)]
pub struct CpuProfile {
    path: PathBuf,
    file: std::fs::File,
    guard: pprof::ProfilerGuard<'static>,
}

#[cfg(unix)]
impl CpuProfile {
    /// Creates the destination before sampling starts, so an unwritable
    /// path fails the run up front.
    pub fn start(path: &Path) -> Result<Self, ConfigError> {
        let file = std::fs::File::create(path).map_err(|source| ConfigError::ProfileCreate {
            path: path.to_path_buf(),
            source,
        })?;
        let guard = pprof::ProfilerGuardBuilder::default()
            .frequency(SAMPLE_FREQUENCY)
            .blocklist(&["libc", "libgcc", "pthread", "vdso"])
            .build()
            .map_err(|err| ConfigError::Profiler(err.to_string()))?;

        tracing::debug!(path = %path.display(), "cpu profiling started");
        Ok(Self {
            path: path.to_path_buf(),
            file,
            guard,
        })
    }

    fn write_report(&mut self) -> anyhow::Result<()> {
        use std::io::Write;

        use pprof::protos::Message;

        let profile = self.guard.report().build()?.pprof()?;
        let mut encoded = Vec::new();
        profile.encode(&mut encoded)?;
        self.file.write_all(&encoded)?;
        self.file.sync_all()?;
        Ok(())
    }
}

#[cfg(unix)]
impl Drop for CpuProfile {
    fn drop(&mut self) {
        match self.write_report() {
            Ok(()) => tracing::debug!(path = %self.path.display(), "cpu profile written"),
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "failed to write cpu profile")
            }
        }
    }
}

#[cfg(not(unix))]
pub struct CpuProfile;

#[cfg(not(unix))]
impl CpuProfile {
    pub fn start(_path: &Path) -> Result<Self, ConfigError> {
        Err(ConfigError::Profiler(
            "cpu profiling is not supported on this platform".to_string(),
        ))
    }
}
