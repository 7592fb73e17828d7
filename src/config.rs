use std::path::Path;

use anyhow::Context;

use crate::{
    composite::overlay::CompositeOptions,
    encode::{package::PackOptions, transcode::TranscodeOptions},
    foundation::error::{RasterError, RasterResult},
    prepare::{crop::CropOptions, isolate::IsolateOptions, normalize::NormalizeOptions},
};

/// Options for every stage, loadable from JSON. Missing sections and fields take their
/// defaults.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub normalize: NormalizeOptions,
    pub isolate: IsolateOptions,
    pub crop: CropOptions,
    pub transcode: TranscodeOptions,
    pub composite: CompositeOptions,
    pub pack: PackOptions,
}

impl PipelineConfig {
    pub fn from_json_str(s: &str) -> RasterResult<Self> {
        let cfg: Self = serde_json::from_str(s)
            .map_err(|e| RasterError::validation(format!("pipeline config: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_path(path: impl AsRef<Path>) -> RasterResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> RasterResult<()> {
        self.normalize.validate()?;
        self.isolate.validate()?;
        self.crop.validate()?;
        self.transcode.validate()?;
        self.composite.validate()?;
        self.pack.validate()
    }
}
