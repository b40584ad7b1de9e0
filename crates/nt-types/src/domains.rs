//! RNTuple storage-parameter domains.
//!
//! The four tunable knobs of the storage format and their allowed values, as
//! exercised by the iotools benchmarks: compression codec, cluster size,
//! page size, and cluster bunch (how many clusters are read ahead at once).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::{TunerError, TunerResult};
use crate::parameter::{Parameter, ParameterValue};

pub const KIB: u64 = 1024;
pub const MIB: u64 = 1024 * 1024;

/// Compression codecs supported by RNTuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    None,
    Zlib,
    Lz4,
    Lzma,
    Zstd,
}

impl Compression {
    pub const ALL: [Compression; 5] = [
        Compression::None,
        Compression::Zlib,
        Compression::Lz4,
        Compression::Lzma,
        Compression::Zstd,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Zlib => "zlib",
            Self::Lz4 => "lz4",
            Self::Lzma => "lzma",
            Self::Zstd => "zstd",
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Compression {
    type Err = TunerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "zlib" => Ok(Self::Zlib),
            "lz4" => Ok(Self::Lz4),
            "lzma" => Ok(Self::Lzma),
            "zstd" => Ok(Self::Zstd),
            other => Err(TunerError::InvalidParameterValue {
                parameter: "compression_type".into(),
                value: other.into(),
                allowed: "none, zlib, lz4, lzma, zstd".into(),
            }),
        }
    }
}

/// One full set of storage-format settings.
///
/// This is the immutable value bundle handed to the evaluator; the default
/// is ROOT's own default parameter set and serves as the scoring baseline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub compression_type: Compression,
    pub cluster_size: u64,
    pub page_size: u64,
    pub cluster_bunch: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            compression_type: Compression::Lz4,
            cluster_size: 50 * MIB,
            page_size: 64 * KIB,
            cluster_bunch: 1,
        }
    }
}

impl Settings {
    /// Raw value strings in configuration order, as written to run history.
    pub fn value_strings(&self) -> Vec<String> {
        vec![
            self.compression_type.to_string(),
            self.cluster_size.to_string(),
            self.page_size.to_string(),
            self.cluster_bunch.to_string(),
        ]
    }
}

fn sized_domain(entries: &[(u64, u64, &str)]) -> (Vec<ParameterValue>, Vec<String>) {
    let values = entries
        .iter()
        .map(|(n, unit, _)| ParameterValue::Int(n * unit))
        .collect();
    let names = entries
        .iter()
        .map(|(n, _, suffix)| format!("{n} {suffix}"))
        .collect();
    (values, names)
}

/// Compression-type parameter over a (possibly restricted) codec list.
///
/// Restricting the list to a single codec pins the parameter: it stays in
/// the configuration but is never selected for mutation.
pub fn compression_parameter(
    current: Compression,
    allowed: &[Compression],
) -> TunerResult<Parameter> {
    let values = allowed
        .iter()
        .map(|c| ParameterValue::Text(c.to_string()))
        .collect();
    Parameter::categorical(
        "compression_type",
        values,
        None,
        &ParameterValue::Text(current.to_string()),
    )
}

/// Cluster-size parameter: 20 MiB through 500 MiB.
pub fn cluster_size_parameter(current: u64) -> TunerResult<Parameter> {
    let (values, names) = sized_domain(&[
        (20, MIB, "MB"),
        (30, MIB, "MB"),
        (40, MIB, "MB"),
        (50, MIB, "MB"),
        (100, MIB, "MB"),
        (200, MIB, "MB"),
        (300, MIB, "MB"),
        (400, MIB, "MB"),
        (500, MIB, "MB"),
    ]);
    Parameter::discrete(
        "cluster_size",
        values,
        Some(names),
        &ParameterValue::Int(current),
    )
}

/// Page-size parameter: 16 KiB through 16 MiB, powers of two.
pub fn page_size_parameter(current: u64) -> TunerResult<Parameter> {
    let (values, names) = sized_domain(&[
        (16, KIB, "KB"),
        (32, KIB, "KB"),
        (64, KIB, "KB"),
        (128, KIB, "KB"),
        (256, KIB, "KB"),
        (512, KIB, "KB"),
        (1, MIB, "MB"),
        (2, MIB, "MB"),
        (4, MIB, "MB"),
        (8, MIB, "MB"),
        (16, MIB, "MB"),
    ]);
    Parameter::discrete(
        "page_size",
        values,
        Some(names),
        &ParameterValue::Int(current),
    )
}

/// Cluster-bunch parameter: 1 through 5 clusters per read.
pub fn cluster_bunch_parameter(current: u64) -> TunerResult<Parameter> {
    let values = (1..=5).map(ParameterValue::Int).collect();
    Parameter::discrete(
        "cluster_bunch",
        values,
        None,
        &ParameterValue::Int(current),
    )
}
