use std::sync::{Arc, RwLock};

use chrono::Utc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};

use crate::db::Store;
use crate::errors::{AppError, AppResult};
use crate::models::{Call, CallCompletion, CallKind, Lead, LeadStatus, NewCall, NewLead};

pub const DEFAULT_RESOLUTION_DELAY: Duration = Duration::from_millis(5000);

const COLLECTING_QUERY: &str = "Voice agent is collecting information...";
const RESOLVED_DURATION: &str = "2:34";

type LeadListener = Arc<dyn Fn(&Lead) + Send + Sync>;

/// Canned caller identity and conversation outcome, keyed only by call kind.
/// This is a demo stand-in: no real telephony channel exists, so the "query
/// understanding" is a fixed script.
struct CallScript {
    phone_number: &'static str,
    caller_name: &'static str,
    customer_query: &'static str,
    location: &'static str,
    property_type: &'static str,
    budget: &'static str,
    source: &'static str,
}

impl CallScript {
    fn for_kind(kind: CallKind) -> Self {
        match kind {
            CallKind::Inbound => Self {
                phone_number: "+91 98765 43210",
                caller_name: "Incoming Caller",
                customer_query: "Looking for 3BHK apartment in Noida",
                location: "Noida",
                property_type: "3BHK Residential",
                budget: "₹ 50,00,000",
                source: "Inbound Call",
            },
            CallKind::Outbound => Self {
                phone_number: "+91 91234 56789",
                caller_name: "Outbound Prospect",
                customer_query: "Interested in commercial property in Mumbai",
                location: "Mumbai",
                property_type: "Commercial",
                budget: "₹ 2,00,00,000",
                source: "Outbound Call",
            },
        }
    }

    fn synthesized_email(&self) -> String {
        format!(
            "{}@email.com",
            self.caller_name.to_lowercase().replace(' ', ".")
        )
    }
}

/// How a simulated call resolved. A failed lead insert still completes the
/// call, but as a distinct outcome rather than a silent success.
#[derive(Debug, Clone)]
pub enum CallOutcome {
    LeadGenerated { call_id: String, lead: Lead },
    CompletedWithoutLead { call_id: String, error: String },
}

/// Tracks at most one simulated call at a time. The delayed resolution runs as
/// an abortable task, so tearing the pipeline down cannot leave a timer firing
/// store writes after the fact.
#[derive(Clone)]
pub struct CallPipeline {
    store: Arc<dyn Store>,
    resolution_delay: Duration,
    active_call: Arc<Mutex<Option<String>>>,
    pending: Arc<Mutex<Option<JoinHandle<CallOutcome>>>>,
    listener: Arc<RwLock<Option<LeadListener>>>,
}

impl CallPipeline {
    pub fn new(store: Arc<dyn Store>, resolution_delay: Duration) -> Self {
        Self {
            store,
            resolution_delay,
            active_call: Arc::new(Mutex::new(None)),
            pending: Arc::new(Mutex::new(None)),
            listener: Arc::new(RwLock::new(None)),
        }
    }

    /// Registers the callback fired when a resolved call produced a lead, so
    /// dependent views can refresh their own fetch of the lead collection.
    pub fn set_lead_listener(&self, listener: LeadListener) {
        let mut slot = self.listener.write().expect("lead listener write lock");
        *slot = Some(listener);
    }

    pub async fn has_active_call(&self) -> bool {
        self.active_call.lock().await.is_some()
    }

    /// Creates the call record in `active` status and schedules its resolution
    /// after the fixed delay. Returns immediately; rejects while another call
    /// is still tracked.
    pub async fn start_call(&self, kind: CallKind) -> AppResult<Call> {
        let mut active = self.active_call.lock().await;
        if active.is_some() {
            return Err(AppError::Validation(
                "a simulated call is already active".to_string(),
            ));
        }

        let script = CallScript::for_kind(kind);
        let call = self.store.insert_call(&NewCall {
            kind,
            phone_number: script.phone_number.to_string(),
            name: Some(script.caller_name.to_string()),
            query: Some(COLLECTING_QUERY.to_string()),
        })?;
        *active = Some(call.id.clone());
        drop(active);

        tracing::info!(call_id = %call.id, kind = kind.as_str(), "simulated call started");

        let store = Arc::clone(&self.store);
        let active_call = Arc::clone(&self.active_call);
        let listener = Arc::clone(&self.listener);
        let delay = self.resolution_delay;
        let call_id = call.id.clone();

        let handle = tokio::spawn(async move {
            sleep(delay).await;
            let outcome = resolve_call(store.as_ref(), kind, &call_id);

            if let CallOutcome::LeadGenerated { lead, .. } = &outcome {
                let callback = listener.read().expect("lead listener read lock").clone();
                if let Some(callback) = callback {
                    callback(lead);
                }
            }

            let mut active = active_call.lock().await;
            if active.as_deref() == Some(call_id.as_str()) {
                *active = None;
            }
            outcome
        });

        let mut pending = self.pending.lock().await;
        *pending = Some(handle);

        Ok(call)
    }

    /// Awaits the scheduled resolution, returning its outcome. `None` when no
    /// resolution is pending or the task was cancelled underneath us.
    pub async fn wait_for_resolution(&self) -> Option<CallOutcome> {
        let handle = self.pending.lock().await.take()?;
        handle.await.ok()
    }

    /// Aborts a pending resolution before it fires. The call row stays in
    /// `active` status; no store write happens after this returns. Reports
    /// whether anything was cancelled.
    pub async fn cancel_pending(&self) -> bool {
        let Some(handle) = self.pending.lock().await.take() else {
            return false;
        };
        handle.abort();

        let mut active = self.active_call.lock().await;
        let cancelled = active.take();
        if let Some(call_id) = cancelled {
            tracing::info!(call_id = %call_id, "pending call resolution cancelled");
        }
        true
    }
}

fn resolve_call(store: &dyn Store, kind: CallKind, call_id: &str) -> CallOutcome {
    let script = CallScript::for_kind(kind);
    let new_lead = NewLead {
        name: script.caller_name.to_string(),
        phone: script.phone_number.to_string(),
        email: Some(script.synthesized_email()),
        location: Some(script.location.to_string()),
        property_type: Some(script.property_type.to_string()),
        budget: Some(script.budget.to_string()),
        status: LeadStatus::New,
        source: script.source.to_string(),
        date: Utc::now().date_naive().to_string(),
        notes: Some(format!(
            "Generated from {} call. Query: {}",
            kind.as_str(),
            script.customer_query
        )),
    };

    match store.insert_lead(&new_lead) {
        Ok(lead) => {
            let completion = CallCompletion {
                duration: RESOLVED_DURATION.to_string(),
                query: script.customer_query.to_string(),
                lead_id: Some(lead.id.clone()),
            };
            if let Err(error) = store.complete_call(call_id, &completion) {
                tracing::warn!(call_id = %call_id, error = %error, "failed to mark call completed");
            } else {
                tracing::info!(call_id = %call_id, lead_id = %lead.id, "call resolved with lead");
            }
            CallOutcome::LeadGenerated {
                call_id: call_id.to_string(),
                lead,
            }
        }
        Err(error) => {
            // Lead insert failed: the call still completes, without linkage.
            let completion = CallCompletion {
                duration: RESOLVED_DURATION.to_string(),
                query: script.customer_query.to_string(),
                lead_id: None,
            };
            if let Err(update_error) = store.complete_call(call_id, &completion) {
                tracing::warn!(call_id = %call_id, error = %update_error, "failed to mark call completed");
            }
            tracing::warn!(call_id = %call_id, error = %error, "call resolved without lead");
            CallOutcome::CompletedWithoutLead {
                call_id: call_id.to_string(),
                error: error.to_string(),
            }
        }
    }
}
