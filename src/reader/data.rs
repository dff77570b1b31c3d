//! Bundled sample of the GSS 2018 extract
//!
//! 48 respondents with the raw survey codes, sentinel tokens and the
//! `"89 or older"` age value. Used by tests and by the `--sample` flag of the
//! binaries so the dashboard runs without network access.

use crate::config::LoaderConfig;
use crate::dataset::Dataset;
use crate::Result;

pub static GSS_SAMPLE: &str = include_str!("../../data/gss_sample.csv");

/// Clean the bundled sample with `config` (its `source` is ignored)
pub fn load_sample(config: &LoaderConfig) -> Result<Dataset> {
    let raw = super::parse_csv(GSS_SAMPLE.as_bytes().to_vec())?;
    super::clean(&raw, config)
}
