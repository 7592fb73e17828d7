use std::io::{Cursor, Write};

use rayon::prelude::*;
use zip::{CompressionMethod, DateTime, ZipWriter, write::SimpleFileOptions};

use crate::{
    encode::transcode::{EncodedImage, TranscodeOptions, encode_under_budget},
    foundation::{
        core::RasterBuffer,
        error::{RasterError, RasterResult},
    },
};

/// A buffer and the human-readable name it is exported under.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NamedAsset {
    pub name: String,
    pub buffer: RasterBuffer,
}

impl NamedAsset {
    pub fn new(name: impl Into<String>, buffer: RasterBuffer) -> Self {
        Self {
            name: name.into(),
            buffer,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PackOptions {
    /// Folder inside the archive holding every entry; `None` writes entries at the root.
    pub folder: Option<String>,
    /// Index given to the first asset in entry names.
    pub first_index: usize,
    pub transcode: TranscodeOptions,
}

impl Default for PackOptions {
    fn default() -> Self {
        Self {
            folder: Some("sticker_pack".to_owned()),
            first_index: 1,
            transcode: TranscodeOptions::default(),
        }
    }
}

impl PackOptions {
    pub fn validate(&self) -> RasterResult<()> {
        if let Some(folder) = &self.folder
            && (folder.is_empty() || folder.contains(['/', '\\']) || folder == "..")
        {
            return Err(RasterError::validation(format!(
                "archive folder '{folder}' must be a single non-empty path segment"
            )));
        }
        self.transcode.validate()
    }

    fn entry_path(&self, file_name: &str) -> String {
        match &self.folder {
            Some(folder) => format!("{folder}/{file_name}"),
            None => file_name.to_owned(),
        }
    }
}

/// Lowercase, then replace every character outside `[a-z0-9]` with `_`.
pub fn sanitize_name(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// `{index:02}_{sanitized}.{ext}`
pub fn entry_name(index: usize, name: &str, extension: &str) -> String {
    format!("{index:02}_{}.{extension}", sanitize_name(name))
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackagedEntry {
    /// Full path inside the archive.
    pub path: String,
    pub len: usize,
    pub quality_percent: u8,
    pub budget_met: bool,
}

/// An asset that was left out of the archive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackagingFailure {
    pub index: usize,
    pub name: String,
    pub reason: String,
}

#[derive(Clone)]
pub struct PackedArchive {
    pub bytes: Vec<u8>,
    pub entries: Vec<PackagedEntry>,
    pub failures: Vec<PackagingFailure>,
}

impl std::fmt::Debug for PackedArchive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackedArchive")
            .field("len", &self.bytes.len())
            .field("entries", &self.entries)
            .field("failures", &self.failures)
            .finish()
    }
}

impl PackedArchive {
    pub fn total(&self) -> usize {
        self.entries.len() + self.failures.len()
    }

    /// Turn skipped assets into [`RasterError::PartialPackaging`].
    pub fn ensure_complete(self) -> RasterResult<Self> {
        if self.failures.is_empty() {
            Ok(self)
        } else {
            Err(RasterError::PartialPackaging {
                failed: self.failures.len(),
                total: self.total(),
            })
        }
    }
}

/// Transcode every asset under the configured budget and bundle the results into one ZIP.
///
/// Assets are transcoded in parallel and written in input order with stored entries and a
/// fixed timestamp, so the same input always yields the same bytes. An asset that fails
/// to transcode is logged and skipped; its index is not reused.
#[tracing::instrument(skip(assets, opts), fields(assets = assets.len()))]
pub fn pack(assets: &[NamedAsset], opts: &PackOptions) -> RasterResult<PackedArchive> {
    opts.validate()?;

    let encoded: Vec<RasterResult<EncodedImage>> = assets
        .par_iter()
        .map(|asset| encode_under_budget(&asset.buffer, &opts.transcode))
        .collect();

    let file_opts = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Stored)
        .last_modified_time(DateTime::default());
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    if let Some(folder) = &opts.folder {
        zip.add_directory(folder.as_str(), file_opts)
            .map_err(|e| RasterError::archive(format!("add folder '{folder}': {e}")))?;
    }

    let mut entries = Vec::with_capacity(assets.len());
    let mut failures = Vec::new();
    for (i, (asset, result)) in assets.iter().zip(encoded).enumerate() {
        let index = opts.first_index + i;
        let image = match result {
            Ok(image) => image,
            Err(e) => {
                tracing::warn!(index, name = %asset.name, error = %e, "skipping asset");
                failures.push(PackagingFailure {
                    index,
                    name: asset.name.clone(),
                    reason: e.to_string(),
                });
                continue;
            }
        };

        let path = opts.entry_path(&entry_name(index, &asset.name, image.format.extension()));
        zip.start_file(path.as_str(), file_opts)
            .map_err(|e| RasterError::archive(format!("start '{path}': {e}")))?;
        zip.write_all(&image.bytes)
            .map_err(|e| RasterError::archive(format!("write '{path}': {e}")))?;

        tracing::debug!(%path, len = image.len(), quality = image.quality_percent, "packed");
        entries.push(PackagedEntry {
            path,
            len: image.len(),
            quality_percent: image.quality_percent,
            budget_met: image.budget_met,
        });
    }

    let bytes = zip
        .finish()
        .map_err(|e| RasterError::archive(format!("finish: {e}")))?
        .into_inner();

    if !failures.is_empty() {
        tracing::warn!(
            failed = failures.len(),
            total = assets.len(),
            "archive built without some assets"
        );
    }
    Ok(PackedArchive {
        bytes,
        entries,
        failures,
    })
}
