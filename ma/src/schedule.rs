//! Adaptation schedule parsing
//!
//! Turns the raw `ADAP_*` values of a case file into a validated
//! [`AdaptationSchedule`] and normalized [`AdaptationOptions`].

use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::case::CaseConfig;
use crate::error::ConfigError;

pub const KEY_COMPLEXITIES: &str = "ADAP_COMPLEXITIES";
pub const KEY_SUB_ITERATIONS: &str = "ADAP_SUBITE";
pub const KEY_MIN_EDGE: &str = "ADAP_HMIN";
pub const KEY_MAX_EDGE: &str = "ADAP_HMAX";
pub const KEY_GRADATION: &str = "ADAP_HGRAD";
pub const KEY_BACK: &str = "ADAP_BACK";
pub const KEY_BACK_NAME: &str = "ADAP_BACK_NAME";
pub const KEY_TOOL_PATH: &str = "ADAP_PATH";

/// Upper edge-length bound used when none is configured
pub const DEFAULT_MAX_EDGE_LENGTH: f64 = 1e300;

pub const DEFAULT_GRADATION: f64 = 3.0;

/// Unvalidated adaptation settings, as text
#[derive(Debug, Clone, Default)]
pub struct RawAdaptationSettings {
    pub complexities: Option<String>,
    pub sub_iterations: Option<String>,
    pub min_edge_length: Option<String>,
    pub max_edge_length: Option<String>,
    pub gradation: Option<String>,
    pub back_mesh: Option<String>,
    pub back_mesh_name: Option<String>,
    pub tool_search_path: Option<String>,
}

impl RawAdaptationSettings {
    /// Pick the adaptation keys out of a case file
    pub fn from_case(case: &CaseConfig) -> Self {
        let get = |key: &str| case.get(key).map(str::to_string);
        Self {
            complexities: get(KEY_COMPLEXITIES),
            sub_iterations: get(KEY_SUB_ITERATIONS),
            min_edge_length: get(KEY_MIN_EDGE),
            max_edge_length: get(KEY_MAX_EDGE),
            gradation: get(KEY_GRADATION),
            back_mesh: get(KEY_BACK),
            back_mesh_name: get(KEY_BACK_NAME),
            tool_search_path: get(KEY_TOOL_PATH),
        }
    }
}

/// One complexity level of the schedule
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ComplexityLevel {
    pub complexity: f64,
    pub sub_iterations: u32,
}

impl ComplexityLevel {
    /// Complexity as used in file names (no decimals)
    pub fn label(&self) -> String {
        format!("{:.0}", self.complexity)
    }
}

/// Ordered complexity levels; never empty
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdaptationSchedule {
    levels: Vec<ComplexityLevel>,
}

impl AdaptationSchedule {
    /// Parse the two textual lists into a schedule
    pub fn parse(complexities: &str, sub_iterations: &str) -> Result<Self, ConfigError> {
        debug!(%complexities, %sub_iterations, "AdaptationSchedule::parse: called");
        let complexities = split_list(KEY_COMPLEXITIES, complexities)?;
        let sub_iterations = split_list(KEY_SUB_ITERATIONS, sub_iterations)?;

        if complexities.len() != sub_iterations.len() {
            return Err(ConfigError::LengthMismatch {
                complexities: complexities.len(),
                sub_iterations: sub_iterations.len(),
            });
        }

        let levels = complexities
            .iter()
            .zip(&sub_iterations)
            .map(|(c, s)| {
                Ok(ComplexityLevel {
                    complexity: parse_positive_f64(KEY_COMPLEXITIES, c)?,
                    sub_iterations: parse_positive_u32(KEY_SUB_ITERATIONS, s)?,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        // The global counter runs one past the total, so the total must stay below u32::MAX
        let total = levels.iter().try_fold(0u32, |acc, l| acc.checked_add(l.sub_iterations));
        if total.is_none_or(|t| t == u32::MAX) {
            return Err(ConfigError::TooManyIterations {
                key: KEY_SUB_ITERATIONS,
                total: levels.iter().map(|l| u64::from(l.sub_iterations)).sum(),
                max: u32::MAX - 1,
            });
        }

        Ok(Self { levels })
    }

    pub fn levels(&self) -> &[ComplexityLevel] {
        &self.levels
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Sum of the sub-iterations over all levels
    pub fn total_global_iterations(&self) -> u32 {
        self.levels.iter().map(|l| l.sub_iterations).sum()
    }
}

/// Back-mesh usage for the adaptation tool
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BackMesh {
    pub enabled: bool,
    /// File name relative to the case root
    pub mesh: Option<String>,
}

/// Normalized adaptation bounds and tool options
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdaptationOptions {
    pub min_edge_length: f64,
    pub max_edge_length: f64,
    pub gradation: f64,
    pub back_mesh: BackMesh,
    /// Directory searched first for the external tools
    pub tool_search_path: Option<PathBuf>,
}

impl Default for AdaptationOptions {
    fn default() -> Self {
        Self {
            min_edge_length: 0.0,
            max_edge_length: DEFAULT_MAX_EDGE_LENGTH,
            gradation: DEFAULT_GRADATION,
            back_mesh: BackMesh::default(),
            tool_search_path: None,
        }
    }
}

impl AdaptationOptions {
    /// Normalize the optional settings; absent values take their defaults
    pub fn parse(raw: &RawAdaptationSettings) -> Result<Self, ConfigError> {
        debug!(?raw, "AdaptationOptions::parse: called");
        let defaults = Self::default();
        let number = |key, value: &Option<String>, default| match value {
            Some(v) => parse_f64(key, v),
            None => Ok(default),
        };

        let back_requested = raw
            .back_mesh
            .as_deref()
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("YES"));
        let back_name = raw.back_mesh_name.as_deref().map(str::trim).filter(|n| !n.is_empty());
        let back_mesh = match (back_requested, back_name) {
            (true, Some(name)) => {
                info!("Use {} as a back mesh", name);
                BackMesh {
                    enabled: true,
                    mesh: Some(name.to_string()),
                }
            }
            (true, None) => {
                warn!("{}=YES without {}: back mesh option is ignored", KEY_BACK, KEY_BACK_NAME);
                BackMesh::default()
            }
            (false, _) => BackMesh::default(),
        };

        Ok(Self {
            min_edge_length: number(KEY_MIN_EDGE, &raw.min_edge_length, defaults.min_edge_length)?,
            max_edge_length: number(KEY_MAX_EDGE, &raw.max_edge_length, defaults.max_edge_length)?,
            gradation: number(KEY_GRADATION, &raw.gradation, defaults.gradation)?,
            back_mesh,
            tool_search_path: raw
                .tool_search_path
                .as_deref()
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(PathBuf::from),
        })
    }
}

/// Validated schedule plus options
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdaptationPlan {
    pub schedule: AdaptationSchedule,
    pub options: AdaptationOptions,
}

impl AdaptationPlan {
    pub fn parse(raw: &RawAdaptationSettings) -> Result<Self, ConfigError> {
        let complexities = raw
            .complexities
            .as_deref()
            .ok_or(ConfigError::MissingKey(KEY_COMPLEXITIES))?;
        let sub_iterations = raw
            .sub_iterations
            .as_deref()
            .ok_or(ConfigError::MissingKey(KEY_SUB_ITERATIONS))?;

        let schedule = AdaptationSchedule::parse(complexities, sub_iterations)?;
        let options = AdaptationOptions::parse(raw)?;
        info!(
            levels = schedule.len(),
            total = schedule.total_global_iterations(),
            "Parsed adaptation schedule"
        );
        Ok(Self { schedule, options })
    }

    pub fn from_case(case: &CaseConfig) -> Result<Self, ConfigError> {
        Self::parse(&RawAdaptationSettings::from_case(case))
    }
}

fn split_list(key: &'static str, text: &str) -> Result<Vec<String>, ConfigError> {
    let inner = text.trim().trim_start_matches('(').trim_end_matches(')').trim();
    if inner.is_empty() {
        return Err(ConfigError::EmptyList { key });
    }
    Ok(inner.split(',').map(|item| item.trim().to_string()).collect())
}

fn parse_f64(key: &'static str, value: &str) -> Result<f64, ConfigError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ConfigError::NotNumeric {
            key,
            value: value.to_string(),
        })
}

fn parse_positive_f64(key: &'static str, value: &str) -> Result<f64, ConfigError> {
    let v = parse_f64(key, value)?;
    if v <= 0.0 {
        return Err(ConfigError::NonPositive {
            key,
            value: value.to_string(),
        });
    }
    Ok(v)
}

fn parse_positive_u32(key: &'static str, value: &str) -> Result<u32, ConfigError> {
    let v: i64 = value.trim().parse().map_err(|_| ConfigError::NotNumeric {
        key,
        value: value.to_string(),
    })?;
    u32::try_from(v)
        .ok()
        .filter(|v| *v > 0)
        .ok_or_else(|| ConfigError::NonPositive {
            key,
            value: value.to_string(),
        })
}
