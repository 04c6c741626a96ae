use std::{
    ffi::OsString,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use log::Level;

use crate::{
    Error,
    encoder::{EpgDatEncoder, EpgWriterConfig, LogCallback, Progress, ProgressCallback},
    service::EpgService,
};

/// Outcome of [`EpgWriter::write`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteReport {
    pub services_written: u32,
    pub services_skipped: usize,
    pub events_written: usize,
    pub events_skipped: usize,
    pub descriptions: usize,
    pub collisions: usize,
    /// Path of the created file, `None` when there was nothing to write.
    pub output: Option<PathBuf>,
}

/// Writes a list of services with their events into an `epg.dat` file.
///
/// The whole image is encoded in memory first. The file is only created when
/// at least one description was collected, and it is written under a
/// temporary name and renamed into place so readers never see a partial file.
pub struct EpgWriter {
    path: PathBuf,
    services: Vec<EpgService>,
    config: EpgWriterConfig,
    log: Option<LogCallback>,
    progress: Option<ProgressCallback>,
}

impl EpgWriter {
    pub fn new(path: impl Into<PathBuf>, services: Vec<EpgService>) -> Self {
        Self {
            path: path.into(),
            services,
            config: EpgWriterConfig::default(),
            log: None,
            progress: None,
        }
    }

    /// Targets `config.file_name` inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>, services: Vec<EpgService>, config: EpgWriterConfig) -> Self {
        Self {
            path: dir.as_ref().join(&config.file_name),
            services,
            config,
            log: None,
            progress: None,
        }
    }

    pub fn with_config(mut self, config: EpgWriterConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_log(mut self, log: impl FnMut(&str) + Send + 'static) -> Self {
        self.log = Some(Box::new(log));
        self
    }

    pub fn with_progress(mut self, progress: impl FnMut(Progress) + Send + 'static) -> Self {
        self.progress = Some(Box::new(progress));
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(self) -> Result<WriteReport, Error> {
        let EpgWriter {
            path,
            services,
            config,
            log,
            progress,
        } = self;

        let mut encoder = EpgDatEncoder::new(config).with_expected_services(services.len());
        encoder.set_log(log);
        encoder.set_progress(progress);

        let name = display_name(&path);
        encoder.report(Level::Info, &format!("Creating '{name}' file..."));

        for service in &services {
            encoder.push_service(service);
        }

        encoder.finish();

        let output = if encoder.is_empty() {
            encoder.report(Level::Info, &format!("No EPG events to write, '{name}' is not created."));
            None
        } else {
            Self::finalize(&path, &mut encoder)?;
            Some(path)
        };

        let stats = encoder.stats();
        Ok(WriteReport {
            services_written: stats.services_written,
            services_skipped: stats.services_skipped,
            events_written: stats.events_written,
            events_skipped: stats.events_skipped,
            descriptions: encoder.table().len(),
            collisions: stats.collisions,
            output,
        })
    }

    fn finalize(path: &Path, encoder: &mut EpgDatEncoder) -> Result<(), Error> {
        let data = encoder.to_bytes();
        let tmp = temp_path(path);

        let res = write_file(&tmp, &data).and_then(|_| fs::rename(&tmp, path));
        if let Err(err) = res {
            let _ = fs::remove_file(&tmp);
            encoder.report(Level::Error, &format!("Writing '{}' failed: {err}", path.display()));

            return Err(err.into());
        }

        let msg = format!("The '{}' file creation is complete.", display_name(path));
        encoder.report(Level::Info, &msg);

        Ok(())
    }
}

fn write_file(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(data)?;
    file.sync_all()
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".tmp");

    path.with_file_name(name)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
