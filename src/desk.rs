use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tokio::time::Duration;

use crate::db::Store;
use crate::errors::{AppError, AppResult};
use crate::export::{export_filename, render_leads_csv};
use crate::filter::{filter_leads, filter_properties};
use crate::models::{
    Call, CallKind, Lead, LeadFilters, LeadStatus, NewProperty, Property, PropertyDraft,
    PropertyFilters,
};
use crate::pipeline::{CallOutcome, CallPipeline, DEFAULT_RESOLUTION_DELAY};
use crate::units::convert_size;

const DEFAULT_CALL_HISTORY_LIMIT: u32 = 10;

/// Orchestration facade for the dealer dashboard: property CRUD with
/// write-time size derivation, filtered listings, lead management, CSV export,
/// and the simulated call pipeline. Holds no cache; every listing call
/// re-fetches from the store.
#[derive(Clone)]
pub struct DeskCore {
    store: Arc<dyn Store>,
    pipeline: CallPipeline,
}

impl DeskCore {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self::with_resolution_delay(store, DEFAULT_RESOLUTION_DELAY)
    }

    pub fn with_resolution_delay(store: Arc<dyn Store>, resolution_delay: Duration) -> Self {
        let pipeline = CallPipeline::new(Arc::clone(&store), resolution_delay);
        Self { store, pipeline }
    }

    pub fn pipeline(&self) -> &CallPipeline {
        &self.pipeline
    }

    pub fn create_property(&self, draft: PropertyDraft) -> AppResult<Property> {
        let record = derive_property(draft)?;
        let property = self.store.insert_property(&record)?;
        tracing::info!(property_id = %property.id, location = %property.location, "property created");
        Ok(property)
    }

    pub fn list_properties(&self, filters: &PropertyFilters) -> AppResult<Vec<Property>> {
        let properties = self.store.list_properties()?;
        Ok(filter_properties(&properties, filters)
            .into_iter()
            .cloned()
            .collect())
    }

    pub fn update_property(&self, property_id: &str, draft: PropertyDraft) -> AppResult<Property> {
        let record = derive_property(draft)?;
        self.store
            .update_property(property_id, &record)?
            .ok_or_else(|| AppError::NotFound(format!("property '{}'", property_id)))
    }

    pub fn delete_property(&self, property_id: &str) -> AppResult<bool> {
        self.store.delete_property(property_id)
    }

    pub fn property_count(&self) -> AppResult<u64> {
        self.store.count_properties()
    }

    pub fn list_leads(&self, filters: &LeadFilters) -> AppResult<Vec<Lead>> {
        let leads = self.store.list_leads()?;
        Ok(filter_leads(&leads, filters).into_iter().cloned().collect())
    }

    pub fn set_lead_status(&self, lead_id: &str, status: LeadStatus) -> AppResult<()> {
        if self.store.set_lead_status(lead_id, status)? {
            Ok(())
        } else {
            Err(AppError::NotFound(format!("lead '{}'", lead_id)))
        }
    }

    /// Writes the full lead collection as CSV into `dir`, returning the
    /// written path.
    pub fn export_leads(&self, dir: &Path) -> AppResult<PathBuf> {
        let leads = self.store.list_leads()?;
        let csv = render_leads_csv(&leads);
        let path = dir.join(export_filename(Utc::now().date_naive()));
        fs::write(&path, csv)?;
        tracing::info!(path = %path.display(), count = leads.len(), "leads exported");
        Ok(path)
    }

    pub async fn start_call(&self, kind: CallKind) -> AppResult<Call> {
        self.pipeline.start_call(kind).await
    }

    pub async fn wait_for_call_resolution(&self) -> Option<CallOutcome> {
        self.pipeline.wait_for_resolution().await
    }

    pub async fn cancel_pending_call(&self) -> bool {
        self.pipeline.cancel_pending().await
    }

    pub fn call_history(&self, limit: Option<u32>) -> AppResult<Vec<Call>> {
        self.store.list_calls(Some(limit.unwrap_or(DEFAULT_CALL_HISTORY_LIMIT)))
    }
}

fn derive_property(draft: PropertyDraft) -> AppResult<NewProperty> {
    if draft.location.trim().is_empty() {
        return Err(AppError::Validation("location is required".to_string()));
    }
    if !draft.price.is_finite() || draft.price < 0.0 {
        return Err(AppError::Validation(
            "price must be a non-negative number".to_string(),
        ));
    }
    if !draft.size.is_finite() || draft.size <= 0.0 {
        return Err(AppError::Validation(
            "size must be a positive number".to_string(),
        ));
    }

    // Derived size fields are computed once, here, and never recomputed on read.
    let breakdown = convert_size(draft.size, draft.size_unit);
    Ok(NewProperty {
        location: draft.location,
        price: draft.price,
        size: draft.size,
        size_unit: draft.size_unit,
        size_sqft: Some(breakdown.sqft),
        size_sqm: Some(breakdown.sqm),
        size_acres: Some(breakdown.acres),
        size_hectares: Some(breakdown.hectares),
        property_type: draft.property_type,
        description: draft.description,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PropertyType, SizeUnit};

    fn draft(location: &str, price: f64, size: f64) -> PropertyDraft {
        PropertyDraft {
            location: location.to_string(),
            price,
            size,
            size_unit: SizeUnit::Acres,
            property_type: PropertyType::Agricultural,
            description: None,
        }
    }

    #[test]
    fn derivation_fills_all_four_size_fields() {
        let record = derive_property(draft("Pune", 1_000_000.0, 1.0)).expect("valid draft");
        assert_eq!(record.size_sqft, Some(43_560.00));
        assert_eq!(record.size_sqm, Some(4_046.82));
        assert_eq!(record.size_acres, Some(1.0));
        assert_eq!(record.size_hectares, Some(0.4047));
    }

    #[test]
    fn blank_location_is_rejected() {
        let error = derive_property(draft("   ", 100.0, 1.0)).expect_err("invalid");
        assert!(matches!(error, AppError::Validation(_)));
    }

    #[test]
    fn negative_price_and_nonpositive_size_are_rejected() {
        assert!(derive_property(draft("Pune", -1.0, 1.0)).is_err());
        assert!(derive_property(draft("Pune", 100.0, 0.0)).is_err());
        assert!(derive_property(draft("Pune", f64::NAN, 1.0)).is_err());
    }
}
