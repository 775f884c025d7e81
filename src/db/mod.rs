use crate::errors::{AppError, AppResult};
use crate::models::{
    Call, CallCompletion, CallKind, CallStatus, Lead, LeadStatus, NewCall, NewLead, NewProperty,
    Property, PropertyType, SizeUnit,
};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Minimal CRUD contract of the hosted table store. The core depends only on
/// this seam, so tests can inject a fake instead of a live backend.
pub trait Store: Send + Sync {
    fn insert_property(&self, property: &NewProperty) -> AppResult<Property>;
    fn get_property(&self, property_id: &str) -> AppResult<Option<Property>>;
    fn list_properties(&self) -> AppResult<Vec<Property>>;
    fn update_property(&self, property_id: &str, property: &NewProperty)
        -> AppResult<Option<Property>>;
    fn delete_property(&self, property_id: &str) -> AppResult<bool>;
    fn count_properties(&self) -> AppResult<u64>;

    fn insert_lead(&self, lead: &NewLead) -> AppResult<Lead>;
    fn list_leads(&self) -> AppResult<Vec<Lead>>;
    fn set_lead_status(&self, lead_id: &str, status: LeadStatus) -> AppResult<bool>;

    fn insert_call(&self, call: &NewCall) -> AppResult<Call>;
    fn get_call(&self, call_id: &str) -> AppResult<Option<Call>>;
    fn list_calls(&self, limit: Option<u32>) -> AppResult<Vec<Call>>;
    fn complete_call(&self, call_id: &str, completion: &CallCompletion) -> AppResult<bool>;
}

#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl SqliteStore {
    pub fn new(path: &Path) -> AppResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| AppError::Io(err.to_string()))?;
        }
        let conn = Connection::open(path).map_err(AppError::from)?;
        conn.pragma_update(None, "foreign_keys", "ON")
            .map_err(AppError::from)?;
        conn.execute_batch(SCHEMA_SQL).map_err(AppError::from)?;

        Ok(Self {
            conn: Mutex::new(conn),
            db_path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn conn(&self) -> AppResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::Internal("store mutex poisoned".to_string()))
    }
}

impl Store for SqliteStore {
    fn insert_property(&self, property: &NewProperty) -> AppResult<Property> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO properties (
               id, location, price, size, size_unit, size_sqft, size_sqm, size_acres,
               size_hectares, property_type, description, created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)",
            params![
                id,
                property.location,
                property.price,
                property.size,
                property.size_unit.as_str(),
                property.size_sqft,
                property.size_sqm,
                property.size_acres,
                property.size_hectares,
                property.property_type.as_str(),
                property.description,
                now.to_rfc3339(),
            ],
        )?;

        Ok(Property {
            id,
            location: property.location.clone(),
            price: property.price,
            size: property.size,
            size_unit: property.size_unit,
            size_sqft: property.size_sqft,
            size_sqm: property.size_sqm,
            size_acres: property.size_acres,
            size_hectares: property.size_hectares,
            property_type: property.property_type,
            description: property.description.clone(),
            created_at: now,
            updated_at: now,
        })
    }

    fn get_property(&self, property_id: &str) -> AppResult<Option<Property>> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT id, location, price, size, size_unit, size_sqft, size_sqm, size_acres,
                    size_hectares, property_type, description, created_at, updated_at
             FROM properties WHERE id = ?1",
            [property_id],
            parse_property_row,
        )
        .optional()
        .map_err(AppError::from)
    }

    fn list_properties(&self) -> AppResult<Vec<Property>> {
        let conn = self.conn()?;
        let mut statement = conn.prepare(
            "SELECT id, location, price, size, size_unit, size_sqft, size_sqm, size_acres,
                    size_hectares, property_type, description, created_at, updated_at
             FROM properties ORDER BY created_at DESC, rowid DESC",
        )?;
        let rows = statement.query_map([], parse_property_row)?;
        let mut properties = Vec::new();
        for row in rows {
            properties.push(row?);
        }
        Ok(properties)
    }

    fn update_property(
        &self,
        property_id: &str,
        property: &NewProperty,
    ) -> AppResult<Option<Property>> {
        let now = Utc::now();
        let changed = {
            let conn = self.conn()?;
            conn.execute(
                "UPDATE properties
                 SET location = ?1, price = ?2, size = ?3, size_unit = ?4, size_sqft = ?5,
                     size_sqm = ?6, size_acres = ?7, size_hectares = ?8, property_type = ?9,
                     description = ?10, updated_at = ?11
                 WHERE id = ?12",
                params![
                    property.location,
                    property.price,
                    property.size,
                    property.size_unit.as_str(),
                    property.size_sqft,
                    property.size_sqm,
                    property.size_acres,
                    property.size_hectares,
                    property.property_type.as_str(),
                    property.description,
                    now.to_rfc3339(),
                    property_id,
                ],
            )?
        };

        if changed == 0 {
            return Ok(None);
        }
        self.get_property(property_id)
    }

    fn delete_property(&self, property_id: &str) -> AppResult<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM properties WHERE id = ?1", [property_id])?;
        Ok(deleted > 0)
    }

    fn count_properties(&self) -> AppResult<u64> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM properties", [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }

    fn insert_lead(&self, lead: &NewLead) -> AppResult<Lead> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO leads (
               id, name, phone, email, location, property_type, budget, status, source,
               date, notes, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                id,
                lead.name,
                lead.phone,
                lead.email,
                lead.location,
                lead.property_type,
                lead.budget,
                lead.status.as_str(),
                lead.source,
                lead.date,
                lead.notes,
                now.to_rfc3339(),
            ],
        )?;

        Ok(Lead {
            id,
            name: lead.name.clone(),
            phone: lead.phone.clone(),
            email: lead.email.clone(),
            location: lead.location.clone(),
            property_type: lead.property_type.clone(),
            budget: lead.budget.clone(),
            status: lead.status,
            source: lead.source.clone(),
            date: lead.date.clone(),
            notes: lead.notes.clone(),
            created_at: now,
        })
    }

    fn list_leads(&self) -> AppResult<Vec<Lead>> {
        let conn = self.conn()?;
        let mut statement = conn.prepare(
            "SELECT id, name, phone, email, location, property_type, budget, status, source,
                    date, notes, created_at
             FROM leads ORDER BY created_at DESC, rowid DESC",
        )?;
        let rows = statement.query_map([], parse_lead_row)?;
        let mut leads = Vec::new();
        for row in rows {
            leads.push(row?);
        }
        Ok(leads)
    }

    fn set_lead_status(&self, lead_id: &str, status: LeadStatus) -> AppResult<bool> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE leads SET status = ?1 WHERE id = ?2",
            params![status.as_str(), lead_id],
        )?;
        Ok(changed > 0)
    }

    fn insert_call(&self, call: &NewCall) -> AppResult<Call> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO calls (
               id, kind, phone_number, name, duration, status, query, lead_generated,
               lead_id, created_at
             ) VALUES (?1, ?2, ?3, ?4, '0:00', ?5, ?6, 0, NULL, ?7)",
            params![
                id,
                call.kind.as_str(),
                call.phone_number,
                call.name,
                CallStatus::Active.as_str(),
                call.query,
                now.to_rfc3339(),
            ],
        )?;

        Ok(Call {
            id,
            kind: call.kind,
            phone_number: call.phone_number.clone(),
            name: call.name.clone(),
            duration: "0:00".to_string(),
            status: CallStatus::Active,
            query: call.query.clone(),
            lead_generated: false,
            lead_id: None,
            created_at: now,
        })
    }

    fn get_call(&self, call_id: &str) -> AppResult<Option<Call>> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT id, kind, phone_number, name, duration, status, query, lead_generated,
                    lead_id, created_at
             FROM calls WHERE id = ?1",
            [call_id],
            parse_call_row,
        )
        .optional()
        .map_err(AppError::from)
    }

    fn list_calls(&self, limit: Option<u32>) -> AppResult<Vec<Call>> {
        let conn = self.conn()?;
        let limit = i64::from(limit.unwrap_or(100));
        let mut statement = conn.prepare(
            "SELECT id, kind, phone_number, name, duration, status, query, lead_generated,
                    lead_id, created_at
             FROM calls ORDER BY created_at DESC, rowid DESC LIMIT ?1",
        )?;
        let rows = statement.query_map([limit], parse_call_row)?;
        let mut calls = Vec::new();
        for row in rows {
            calls.push(row?);
        }
        Ok(calls)
    }

    fn complete_call(&self, call_id: &str, completion: &CallCompletion) -> AppResult<bool> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE calls
             SET status = ?1, duration = ?2, query = ?3, lead_generated = ?4, lead_id = ?5
             WHERE id = ?6 AND status = ?7",
            params![
                CallStatus::Completed.as_str(),
                completion.duration,
                completion.query,
                completion.lead_id.is_some(),
                completion.lead_id,
                call_id,
                CallStatus::Active.as_str(),
            ],
        )?;
        Ok(changed > 0)
    }
}

fn parse_property_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Property> {
    Ok(Property {
        id: row.get(0)?,
        location: row.get(1)?,
        price: row.get(2)?,
        size: row.get(3)?,
        size_unit: parse_size_unit(&row.get::<_, String>(4)?)?,
        size_sqft: row.get(5)?,
        size_sqm: row.get(6)?,
        size_acres: row.get(7)?,
        size_hectares: row.get(8)?,
        property_type: parse_property_type(&row.get::<_, String>(9)?)?,
        description: row.get(10)?,
        created_at: parse_time(&row.get::<_, String>(11)?)?,
        updated_at: parse_time(&row.get::<_, String>(12)?)?,
    })
}

fn parse_lead_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Lead> {
    Ok(Lead {
        id: row.get(0)?,
        name: row.get(1)?,
        phone: row.get(2)?,
        email: row.get(3)?,
        location: row.get(4)?,
        property_type: row.get(5)?,
        budget: row.get(6)?,
        status: parse_lead_status(&row.get::<_, String>(7)?)?,
        source: row.get(8)?,
        date: row.get(9)?,
        notes: row.get(10)?,
        created_at: parse_time(&row.get::<_, String>(11)?)?,
    })
}

fn parse_call_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Call> {
    Ok(Call {
        id: row.get(0)?,
        kind: parse_call_kind(&row.get::<_, String>(1)?)?,
        phone_number: row.get(2)?,
        name: row.get(3)?,
        duration: row.get(4)?,
        status: parse_call_status(&row.get::<_, String>(5)?)?,
        query: row.get(6)?,
        lead_generated: row.get(7)?,
        lead_id: row.get(8)?,
        created_at: parse_time(&row.get::<_, String>(9)?)?,
    })
}

fn parse_size_unit(raw: &str) -> rusqlite::Result<SizeUnit> {
    match raw {
        "sqft" => Ok(SizeUnit::Sqft),
        "sqm" => Ok(SizeUnit::Sqm),
        "acres" => Ok(SizeUnit::Acres),
        "hectares" => Ok(SizeUnit::Hectares),
        other => Err(invalid_text(format!("unknown size unit '{}'", other))),
    }
}

fn parse_property_type(raw: &str) -> rusqlite::Result<PropertyType> {
    match raw {
        "Residential" => Ok(PropertyType::Residential),
        "Commercial" => Ok(PropertyType::Commercial),
        "Industrial" => Ok(PropertyType::Industrial),
        "Agricultural" => Ok(PropertyType::Agricultural),
        "Mixed Use" => Ok(PropertyType::MixedUse),
        "Land" => Ok(PropertyType::Land),
        other => Err(invalid_text(format!("unknown property type '{}'", other))),
    }
}

fn parse_lead_status(raw: &str) -> rusqlite::Result<LeadStatus> {
    match raw {
        "New" => Ok(LeadStatus::New),
        "Contacted" => Ok(LeadStatus::Contacted),
        "Qualified" => Ok(LeadStatus::Qualified),
        "Converted" => Ok(LeadStatus::Converted),
        other => Err(invalid_text(format!("unknown lead status '{}'", other))),
    }
}

fn parse_call_kind(raw: &str) -> rusqlite::Result<CallKind> {
    match raw {
        "inbound" => Ok(CallKind::Inbound),
        "outbound" => Ok(CallKind::Outbound),
        other => Err(invalid_text(format!("unknown call kind '{}'", other))),
    }
}

fn parse_call_status(raw: &str) -> rusqlite::Result<CallStatus> {
    match raw {
        "active" => Ok(CallStatus::Active),
        "completed" => Ok(CallStatus::Completed),
        other => Err(invalid_text(format!("unknown call status '{}'", other))),
    }
}

fn parse_time(raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|error| invalid_text(error.to_string()))
}

fn invalid_text(message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        0,
        rusqlite::types::Type::Text,
        Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, message)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_store() -> (TempDir, SqliteStore) {
        let dir = TempDir::new().expect("temp dir");
        let store = SqliteStore::new(&dir.path().join("desk.sqlite")).expect("open store");
        (dir, store)
    }

    fn sample_property(location: &str) -> NewProperty {
        NewProperty {
            location: location.to_string(),
            price: 5_000_000.0,
            size: 1200.0,
            size_unit: SizeUnit::Sqft,
            size_sqft: Some(1200.0),
            size_sqm: Some(111.48),
            size_acres: Some(0.0275),
            size_hectares: Some(0.0111),
            property_type: PropertyType::Residential,
            description: Some("Corner plot".to_string()),
        }
    }

    #[test]
    fn property_round_trip_preserves_derived_sizes() {
        let (_dir, store) = open_store();
        let inserted = store
            .insert_property(&sample_property("Mumbai"))
            .expect("insert");
        let fetched = store
            .get_property(&inserted.id)
            .expect("get")
            .expect("present");
        assert_eq!(fetched.location, "Mumbai");
        assert_eq!(fetched.size_sqm, Some(111.48));
        assert_eq!(fetched.property_type, PropertyType::Residential);
    }

    #[test]
    fn properties_list_newest_first() {
        let (_dir, store) = open_store();
        store.insert_property(&sample_property("Older")).expect("insert");
        store.insert_property(&sample_property("Newer")).expect("insert");
        let listed = store.list_properties().expect("list");
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].location, "Newer");
        assert_eq!(listed[1].location, "Older");
    }

    #[test]
    fn delete_reports_whether_a_row_existed() {
        let (_dir, store) = open_store();
        let inserted = store.insert_property(&sample_property("Noida")).expect("insert");
        assert!(store.delete_property(&inserted.id).expect("delete"));
        assert!(!store.delete_property(&inserted.id).expect("redelete"));
        assert_eq!(store.count_properties().expect("count"), 0);
    }

    #[test]
    fn complete_call_transitions_exactly_once() {
        let (_dir, store) = open_store();
        let call = store
            .insert_call(&NewCall {
                kind: CallKind::Inbound,
                phone_number: "+91 98765 43210".to_string(),
                name: Some("Incoming Caller".to_string()),
                query: Some("Voice agent is collecting information...".to_string()),
            })
            .expect("insert call");
        assert_eq!(call.status, CallStatus::Active);
        assert_eq!(call.duration, "0:00");

        let completion = CallCompletion {
            duration: "2:34".to_string(),
            query: "Looking for 3BHK apartment in Noida".to_string(),
            lead_id: None,
        };
        assert!(store.complete_call(&call.id, &completion).expect("complete"));
        assert!(!store.complete_call(&call.id, &completion).expect("recomplete"));

        let fetched = store.get_call(&call.id).expect("get").expect("present");
        assert_eq!(fetched.status, CallStatus::Completed);
        assert_eq!(fetched.duration, "2:34");
        assert!(!fetched.lead_generated);
        assert_eq!(fetched.lead_id, None);
    }

    #[test]
    fn lead_status_update_reports_missing_rows() {
        let (_dir, store) = open_store();
        assert!(!store
            .set_lead_status("missing", LeadStatus::Contacted)
            .expect("update"));
    }
}
