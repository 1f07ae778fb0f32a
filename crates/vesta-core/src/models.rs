//! Domain models: search requests, predicate parameters and result sets.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::TimeLimitConfig;
use crate::error::DataError;

/// Predicate categories a request may enable.
///
/// Mirrors the search-type flags of the inbound API: a category must be
/// requested for its parameters to be compiled, and a requested category must
/// be supported by the target resource's [`CapabilitySet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CategorySet {
    /// Geo-spatial predicate requested.
    #[serde(default)]
    pub geo: bool,
    /// Temporal predicate requested.
    #[serde(default)]
    pub temporal: bool,
    /// Attribute predicates requested.
    #[serde(default)]
    pub attribute: bool,
    /// Response field selection requested.
    #[serde(default)]
    pub response_filter: bool,
}

/// Temporal relation between the supplied time(s) and the matched records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemporalRelation {
    /// Records inside `[time, endTime]`.
    During,
    /// Alias of `During` used by count queries.
    Between,
    /// Records in the lookback window ending at `time`.
    Before,
    /// Records in the window starting at `time`, clamped to now.
    After,
}

impl fmt::Display for TemporalRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::During => write!(f, "during"),
            Self::Between => write!(f, "between"),
            Self::Before => write!(f, "before"),
            Self::After => write!(f, "after"),
        }
    }
}

impl FromStr for TemporalRelation {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "during" => Ok(Self::During),
            "between" => Ok(Self::Between),
            "before" => Ok(Self::Before),
            "after" => Ok(Self::After),
            _ => Err(DataError::Validation(format!(
                "unsupported temporal relation '{}'",
                s
            ))),
        }
    }
}

/// Temporal predicate parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemporalParams {
    /// Relation between `time` and the matched records.
    pub relation: TemporalRelation,
    /// Start (or pivot) time, ISO-8601 with zone offset.
    pub time: String,
    /// End time; mandatory for `during`/`between`.
    pub end_time: Option<String>,
}

/// Geo predicate parameters.
///
/// Exactly one of four shapes is selected by which fields are present:
/// circle (`lon`+`lat`+`radius`), polygon/linestring (`geometry`+`relation`+
/// `coordinates`+`geoproperty`), or bbox (same fields with `geometry = "bbox"`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeoParams {
    /// Geometry kind: `polygon`, `linestring` or `bbox`.
    pub geometry: Option<String>,
    /// Geo relation (`within`, `intersects`, ...); passed through verbatim.
    pub relation: Option<String>,
    /// GeoJSON-style coordinate array.
    pub coordinates: Option<Value>,
    /// Name of the geo property being queried.
    pub geoproperty: Option<String>,
    /// Circle centre longitude.
    pub lon: Option<f64>,
    /// Circle centre latitude.
    pub lat: Option<f64>,
    /// Circle radius in meters.
    pub radius: Option<f64>,
}

/// One attribute predicate: `attribute <operator> value` or a between-range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributePredicate {
    /// Document field the predicate applies to.
    pub attribute: String,
    /// Operator token: `>`, `<`, `>=`, `<=`, `==`, `!=` or `<==>`.
    pub operator: String,
    /// Comparison value for single-valued operators.
    pub value: Option<String>,
    /// Lower bound for the `<==>` (between) operator.
    pub value_lower: Option<String>,
    /// Upper bound for the `<==>` (between) operator.
    pub value_upper: Option<String>,
}

/// Result page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// Number of records to skip.
    pub offset: u32,
    /// Maximum number of records to return.
    pub limit: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self { offset: 0, limit: 10 }
    }
}

/// Requested output encoding for exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON array of records (default).
    #[default]
    Json,
    /// Flattened comma-separated values.
    Csv,
    /// Parquet. Accepted as a token but not implemented.
    Parquet,
}

impl FromStr for OutputFormat {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            "parquet" => Ok(Self::Parquet),
            _ => Err(DataError::Validation(format!("unknown output format '{}'", s))),
        }
    }
}

/// Predicate categories a resource declares support for in the catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CapabilitySet {
    /// Temporal predicates supported.
    pub temporal: bool,
    /// Geo-spatial predicates supported.
    pub spatial: bool,
    /// Attribute predicates supported.
    pub attribute: bool,
}

impl CapabilitySet {
    /// Builds a capability set from the catalogue's label list
    /// (`TEMPORAL`, `SPATIAL`, `ATTR`). Unknown labels are ignored.
    pub fn from_labels<S: AsRef<str>>(labels: &[S]) -> Self {
        let mut set = Self::default();
        for label in labels {
            match label.as_ref().to_uppercase().as_str() {
                "TEMPORAL" => set.temporal = true,
                "SPATIAL" => set.spatial = true,
                "ATTR" => set.attribute = true,
                _ => {}
            }
        }
        set
    }

    /// True when no capability is declared.
    pub fn is_empty(&self) -> bool {
        !(self.temporal || self.spatial || self.attribute)
    }
}

/// One inbound search, count or export request.
///
/// Built by the API layer per call and immutable afterwards. Requests may
/// carry several ids, but only the first is ever used for clause building and
/// index addressing; later ids are accepted and ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Target resource ids. At least one is required.
    pub ids: Vec<String>,
    /// Requested predicate categories.
    pub categories: CategorySet,
    /// Geo parameters, consulted when `categories.geo` is set.
    pub geo: Option<GeoParams>,
    /// Temporal parameters, consulted when `categories.temporal` is set.
    pub temporal: Option<TemporalParams>,
    /// Attribute predicates, consulted when `categories.attribute` is set.
    pub attributes: Vec<AttributePredicate>,
    /// Fields to project into the response, for `categories.response_filter`.
    pub response_fields: Option<Vec<String>>,
    /// Result page window for interactive searches.
    pub pagination: Pagination,
    /// Output encoding for exports.
    pub format: OutputFormat,
    /// Deployment time-limit policy handed down by the bootstrap layer.
    pub time_limit: TimeLimitConfig,
}

impl SearchRequest {
    /// Creates a request targeting `ids` with no predicates enabled.
    pub fn new(ids: Vec<String>, time_limit: TimeLimitConfig) -> Self {
        Self {
            ids,
            categories: CategorySet::default(),
            geo: None,
            temporal: None,
            attributes: Vec::new(),
            response_fields: None,
            pagination: Pagination::default(),
            format: OutputFormat::default(),
            time_limit,
        }
    }

    /// Enables the geo category with the given parameters.
    pub fn with_geo(mut self, geo: GeoParams) -> Self {
        self.categories.geo = true;
        self.geo = Some(geo);
        self
    }

    /// Enables the temporal category with the given parameters.
    pub fn with_temporal(mut self, temporal: TemporalParams) -> Self {
        self.categories.temporal = true;
        self.temporal = Some(temporal);
        self
    }

    /// Enables the attribute category with the given predicates.
    pub fn with_attributes(mut self, attributes: Vec<AttributePredicate>) -> Self {
        self.categories.attribute = true;
        self.attributes = attributes;
        self
    }

    /// Enables response field selection.
    pub fn with_response_fields(mut self, fields: Vec<String>) -> Self {
        self.categories.response_filter = true;
        self.response_fields = Some(fields);
        self
    }

    /// Sets the result page window.
    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = pagination;
        self
    }

    /// Sets the export output format.
    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// The id all clause building and index addressing uses.
    ///
    /// # Panics
    ///
    /// Panics if the id list is empty; call [`SearchRequest::validate`] first.
    pub fn primary_id(&self) -> &str {
        &self.ids[0]
    }

    /// Structural validation, run before any compilation.
    ///
    /// Checks id presence and shape
    /// (`<domain>/<ownerHash>/<resourceServer>/<resourceGroup>[/<resourceName>]`)
    /// and that field selection, when requested, names its fields.
    pub fn validate(&self) -> Result<(), DataError> {
        let Some(first) = self.ids.first() else {
            return Err(DataError::Validation("resource id is empty".to_string()));
        };
        let segments = first.split('/').count();
        if !(4..=5).contains(&segments) {
            return Err(DataError::Validation(format!("malformed id: {}", first)));
        }
        if self.categories.response_filter && self.response_fields.is_none() {
            return Err(DataError::Validation(
                "response filtering fields are not passed in attrs parameter".to_string(),
            ));
        }
        Ok(())
    }

    /// Backend index addressed by this request.
    ///
    /// Derived from the first id by dropping the resource-name segment (when
    /// present) and joining the group-level segments with `__`.
    pub fn search_index(&self) -> String {
        let segments: Vec<&str> = self.primary_id().split('/').collect();
        let group = if segments.len() > 4 {
            &segments[..segments.len() - 1]
        } else {
            &segments[..]
        };
        group.join("__")
    }
}

/// Records returned by an interactive search, with paging metadata.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResultSet {
    /// Matching records, field-selected per the request.
    pub records: Vec<Value>,
    /// Total number of matches across all pages, when known.
    pub total_hits: Option<u64>,
    /// Offset this page was fetched at.
    pub offset: u32,
    /// Limit this page was fetched with.
    pub limit: u32,
}
