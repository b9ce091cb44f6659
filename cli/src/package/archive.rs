//! Deployable archive assembly

use std::fs;
use std::io::{self, Cursor};

use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use crate::errors::CliError;
use crate::models::resource::LocalFileEntry;
use crate::package::exclusions::NoiseFilter;

/// The zip that is uploaded to the controller
#[derive(Debug, Clone)]
pub struct PackagedArchive {
    /// Complete zip bytes; an archive with no entries is still a valid zip
    pub bytes: Vec<u8>,

    /// Entry names in archive order
    pub entries: Vec<String>,

    /// Paths dropped by the noise filter
    pub excluded: Vec<String>,
}

impl PackagedArchive {
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// True when every needed byte already lives on the controller
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Zip the files in `to_send` that are not noise.
///
/// Entries are keyed by their path relative to the staged root and written in
/// path order so identical inputs produce identical archives.
pub fn build_archive(
    to_send: &[LocalFileEntry],
    noise: &NoiseFilter,
) -> Result<PackagedArchive, CliError> {
    let mut excluded = Vec::new();
    let mut files: Vec<&LocalFileEntry> = Vec::with_capacity(to_send.len());
    for entry in to_send {
        if noise.is_noise(&entry.relative_path) {
            debug!("Excluding {}", entry.relative_path);
            excluded.push(entry.relative_path.clone());
        } else {
            files.push(entry);
        }
    }
    files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let mut entries = Vec::with_capacity(files.len());

    for entry in files {
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(DateTime::default())
            .large_file(entry.size_bytes >= u32::MAX as u64);
        #[cfg(unix)]
        let options = {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&entry.absolute_path)?.permissions().mode();
            options.unix_permissions(mode)
        };

        writer.start_file(entry.relative_path.as_str(), options)?;
        let mut file = fs::File::open(&entry.absolute_path)?;
        io::copy(&mut file, &mut writer)?;
        entries.push(entry.relative_path.clone());
    }

    let bytes = writer.finish()?.into_inner();
    debug!(
        "Packed {} files ({} excluded) into {} bytes",
        entries.len(),
        excluded.len(),
        bytes.len()
    );

    Ok(PackagedArchive {
        bytes,
        entries,
        excluded,
    })
}
