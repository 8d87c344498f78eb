use super::Fields;
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// Granularity of a time series query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Resolution {
    #[default]
    Raw,
    /// 30 minute buckets.
    SevenDays,
    /// One hour buckets.
    ThirtyDays,
    /// One day buckets.
    SixMonths,
}

impl Resolution {
    pub fn as_param(&self) -> &'static str {
        match self {
            Resolution::Raw => "raw",
            Resolution::SevenDays => "30",
            Resolution::ThirtyDays => "60",
            Resolution::SixMonths => "1440",
        }
    }
}

impl std::str::FromStr for Resolution {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "raw" => Ok(Resolution::Raw),
            "30" => Ok(Resolution::SevenDays),
            "60" => Ok(Resolution::ThirtyDays),
            "1440" => Ok(Resolution::SixMonths),
            other => Err(crate::error::Error::validation(format!(
                "unknown resolution {:?} (expected raw, 30, 60 or 1440)",
                other
            ))),
        }
    }
}

/// One point of a time series.
///
/// `min`/`max` come with non-raw resolutions; `name` and `group` only when
/// several metrics were requested at once.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataPoint {
    pub timestamp: DateTime<Utc>,
    pub value: i64,
    pub group: Option<i64>,
    pub min: Option<i64>,
    pub max: Option<i64>,
    pub name: Option<String>,
}

impl DataPoint {
    /// Decode from a resource's `attributes`.
    pub fn from_attributes(attrs: &Value) -> Result<Self> {
        let f = Fields::new("DataPoint", attrs);
        Ok(Self {
            timestamp: f.required_datetime(&["timestamp"])?,
            value: f.required(&["value"])?,
            group: f.optional(&["group"])?,
            min: f.optional(&["min"])?,
            max: f.optional(&["max"])?,
            name: f.optional(&["name"])?,
        })
    }

    pub fn from_resource(resource: &Value) -> Result<Self> {
        let attrs = resource.get("attributes").unwrap_or(&Value::Null);
        Self::from_attributes(attrs)
    }
}
