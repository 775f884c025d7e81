use std::fs;
use std::sync::Arc;

use tempfile::TempDir;
use tokio::time::Duration;

use propdesk::models::{
    CallKind, CallStatus, LeadFilters, LeadStatus, PropertyDraft, PropertyFilters, PropertyType,
    SizeUnit,
};
use propdesk::{CallOutcome, DeskCore, SqliteStore};

fn desk_over_tempdir() -> (TempDir, DeskCore) {
    let dir = TempDir::new().expect("temp dir");
    let store = SqliteStore::new(&dir.path().join("desk.sqlite")).expect("open store");
    let desk = DeskCore::with_resolution_delay(Arc::new(store), Duration::from_millis(20));
    (dir, desk)
}

fn draft(location: &str, property_type: PropertyType, price: f64) -> PropertyDraft {
    PropertyDraft {
        location: location.to_string(),
        price,
        size: 100.0,
        size_unit: SizeUnit::Sqm,
        property_type,
        description: Some(format!("{} listing", location)),
    }
}

#[test]
fn property_crud_with_derived_sizes_and_filters() {
    let (_dir, desk) = desk_over_tempdir();

    let mumbai = desk
        .create_property(draft("Mumbai", PropertyType::Residential, 5_000_000.0))
        .expect("create");
    desk.create_property(draft("Noida", PropertyType::Commercial, 20_000_000.0))
        .expect("create");

    assert_eq!(mumbai.size_sqft, Some(1_076.40));
    assert_eq!(desk.property_count().expect("count"), 2);

    let by_query = desk
        .list_properties(&PropertyFilters {
            query: Some("noida".to_string()),
            ..Default::default()
        })
        .expect("list");
    assert_eq!(by_query.len(), 1);
    assert_eq!(by_query[0].location, "Noida");

    let by_price = desk
        .list_properties(&PropertyFilters {
            price_range: Some((5_000_000.0, 5_000_000.0)),
            ..Default::default()
        })
        .expect("list");
    assert_eq!(by_price.len(), 1);
    assert_eq!(by_price[0].location, "Mumbai");

    let updated = desk
        .update_property(
            &mumbai.id,
            draft("South Mumbai", PropertyType::Residential, 6_000_000.0),
        )
        .expect("update");
    assert_eq!(updated.location, "South Mumbai");
    assert_eq!(updated.size_sqft, Some(1_076.40));

    assert!(desk.delete_property(&mumbai.id).expect("delete"));
    assert_eq!(desk.property_count().expect("count"), 1);
}

#[tokio::test]
async fn inbound_call_produces_lead_history_and_csv() {
    let (dir, desk) = desk_over_tempdir();

    let call = desk.start_call(CallKind::Inbound).await.expect("start call");
    assert_eq!(call.status, CallStatus::Active);

    let outcome = desk.wait_for_call_resolution().await.expect("outcome");
    let CallOutcome::LeadGenerated { lead, .. } = outcome else {
        panic!("expected generated lead");
    };
    assert_eq!(lead.source, "Inbound Call");

    let leads = desk.list_leads(&LeadFilters::default()).expect("leads");
    assert_eq!(leads.len(), 1);
    assert_eq!(leads[0].name, "Incoming Caller");
    assert_eq!(leads[0].status, LeadStatus::New);

    let history = desk.call_history(None).expect("history");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, CallStatus::Completed);
    assert!(history[0].lead_generated);
    assert_eq!(history[0].lead_id.as_deref(), Some(lead.id.as_str()));
    assert_eq!(history[0].duration_seconds(), Some(154));

    desk.set_lead_status(&lead.id, LeadStatus::Contacted)
        .expect("status update");
    let filtered = desk
        .list_leads(&LeadFilters {
            query: Some("incoming".to_string()),
        })
        .expect("leads");
    assert_eq!(filtered[0].status, LeadStatus::Contacted);

    let export_dir = dir.path().join("exports");
    fs::create_dir_all(&export_dir).expect("export dir");
    let path = desk.export_leads(&export_dir).expect("export");
    let csv = fs::read_to_string(&path).expect("read export");
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(
        lines[0],
        "Name,Phone,Email,Location,Property Type,Budget,Status,Source,Date"
    );
    assert!(lines[1].starts_with("Incoming Caller,"));
}

#[tokio::test]
async fn cancelled_call_leaves_row_active_and_store_untouched() {
    let (_dir, desk) = desk_over_tempdir();

    let call = desk.start_call(CallKind::Outbound).await.expect("start call");
    assert!(desk.cancel_pending_call().await);

    tokio::time::sleep(Duration::from_millis(60)).await;
    assert!(desk.list_leads(&LeadFilters::default()).expect("leads").is_empty());

    let history = desk.call_history(None).expect("history");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, call.id);
    assert_eq!(history[0].status, CallStatus::Active);
    assert!(!history[0].lead_generated);
}
