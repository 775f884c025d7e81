use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult};

static DURATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+):([0-5]\d)$").expect("valid duration regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeUnit {
    Sqft,
    Sqm,
    Acres,
    Hectares,
}

impl SizeUnit {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sqft => "sqft",
            Self::Sqm => "sqm",
            Self::Acres => "acres",
            Self::Hectares => "hectares",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyType {
    Residential,
    Commercial,
    Industrial,
    Agricultural,
    #[serde(rename = "Mixed Use")]
    MixedUse,
    Land,
}

impl PropertyType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Residential => "Residential",
            Self::Commercial => "Commercial",
            Self::Industrial => "Industrial",
            Self::Agricultural => "Agricultural",
            Self::MixedUse => "Mixed Use",
            Self::Land => "Land",
        }
    }
}

/// Parses the dashboard's type selector, where "all" means no type constraint.
pub fn parse_type_selector(raw: &str) -> AppResult<Option<PropertyType>> {
    match raw {
        "all" => Ok(None),
        "Residential" => Ok(Some(PropertyType::Residential)),
        "Commercial" => Ok(Some(PropertyType::Commercial)),
        "Industrial" => Ok(Some(PropertyType::Industrial)),
        "Agricultural" => Ok(Some(PropertyType::Agricultural)),
        "Mixed Use" => Ok(Some(PropertyType::MixedUse)),
        "Land" => Ok(Some(PropertyType::Land)),
        other => Err(AppError::Validation(format!(
            "unknown property type selector '{}'",
            other
        ))),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeadStatus {
    New,
    Contacted,
    Qualified,
    Converted,
}

impl LeadStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "New",
            Self::Contacted => "Contacted",
            Self::Qualified => "Qualified",
            Self::Converted => "Converted",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallKind {
    Inbound,
    Outbound,
}

impl CallKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Inbound => "inbound",
            Self::Outbound => "outbound",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallStatus {
    Active,
    Completed,
}

impl CallStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: String,
    pub location: String,
    pub price: f64,
    pub size: f64,
    pub size_unit: SizeUnit,
    pub size_sqft: Option<f64>,
    pub size_sqm: Option<f64>,
    pub size_acres: Option<f64>,
    pub size_hectares: Option<f64>,
    pub property_type: PropertyType,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Raw form submission, before validation and size derivation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDraft {
    pub location: String,
    pub price: f64,
    pub size: f64,
    pub size_unit: SizeUnit,
    pub property_type: PropertyType,
    pub description: Option<String>,
}

/// Fully derived write record; the four converted size fields are filled in
/// at write time and never recomputed on read.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProperty {
    pub location: String,
    pub price: f64,
    pub size: f64,
    pub size_unit: SizeUnit,
    pub size_sqft: Option<f64>,
    pub size_sqm: Option<f64>,
    pub size_acres: Option<f64>,
    pub size_hectares: Option<f64>,
    pub property_type: PropertyType,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub location: Option<String>,
    pub property_type: Option<String>,
    pub budget: Option<String>,
    pub status: LeadStatus,
    pub source: String,
    pub date: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLead {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub location: Option<String>,
    pub property_type: Option<String>,
    pub budget: Option<String>,
    pub status: LeadStatus,
    pub source: String,
    pub date: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Call {
    pub id: String,
    pub kind: CallKind,
    pub phone_number: String,
    pub name: Option<String>,
    pub duration: String,
    pub status: CallStatus,
    pub query: Option<String>,
    pub lead_generated: bool,
    pub lead_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Call {
    /// Duration is free-form "m:ss" text in the store; returns whole seconds
    /// when it matches that shape.
    pub fn duration_seconds(&self) -> Option<u64> {
        let captures = DURATION_RE.captures(&self.duration)?;
        let minutes: u64 = captures.get(1)?.as_str().parse().ok()?;
        let seconds: u64 = captures.get(2)?.as_str().parse().ok()?;
        Some(minutes * 60 + seconds)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCall {
    pub kind: CallKind,
    pub phone_number: String,
    pub name: Option<String>,
    pub query: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallCompletion {
    pub duration: String,
    pub query: String,
    pub lead_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PropertyFilters {
    pub query: Option<String>,
    pub property_type: Option<PropertyType>,
    pub price_range: Option<(f64, f64)>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct LeadFilters {
    pub query: Option<String>,
}
