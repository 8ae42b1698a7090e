//! Address form controller.
//!
//! Owns the form's current values and reacts to the form's events: field
//! input, clear, submit and page load. Persistence, the lookup service and
//! user-facing alerts are injected, so the whole flow runs without a browser
//! or network.
//!
//! Lookups may overlap (the user keeps typing while one is in flight). Each
//! one takes a ticket from a monotonically increasing counter and its result
//! is only applied if no newer lookup (or clear) was issued meanwhile.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::cep::{self, CEP_DIGITS};
use crate::client::LookupClient;
use crate::store::{LocalStore, StoreClient};
use crate::types::{AddressRecord, Field, LookupOutcome};

pub const NOT_FOUND_MESSAGE: &str = "CEP não encontrado";
pub const SUBMIT_MESSAGE: &str = "Formulário preparado para envio (exemplo).";

/// Blocking user notification (the page's `alert`).
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// Writes notifications to stderr
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str) {
        info!(notification = message, "user notification");
        eprintln!("{}", message);
    }
}

/// Keeps every notification for later inspection
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str) {
        self.messages
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(message.to_string());
    }
}

/// What became of a lookup triggered by an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupReport {
    /// No lookup was due (incomplete CEP, or not the CEP field)
    Skipped,
    /// Address fields were filled in and saved
    Applied,
    /// The service does not know the CEP; the user was told
    NotFound,
    /// Transport or protocol failure, logged; fields untouched
    Failed,
    /// A newer lookup or a clear superseded this one
    Stale,
}

pub struct FormController<S, L, N> {
    store: LocalStore<S>,
    lookup: L,
    notifier: N,
    form: RwLock<AddressRecord>,
    latest_ticket: AtomicU64,
}

impl<S, L, N> FormController<S, L, N>
where
    S: StoreClient,
    L: LookupClient,
    N: Notifier,
{
    pub fn new(store: LocalStore<S>, lookup: L, notifier: N) -> Self {
        Self {
            store,
            lookup,
            notifier,
            form: RwLock::new(AddressRecord::default()),
            latest_ticket: AtomicU64::new(0),
        }
    }

    pub fn store(&self) -> &LocalStore<S> {
        &self.store
    }

    pub fn lookup_client(&self) -> &L {
        &self.lookup
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Current field values
    pub async fn snapshot(&self) -> AddressRecord {
        self.form.read().await.clone()
    }

    /// A field changed. The CEP is masked in place; everything is persisted;
    /// a complete CEP triggers a lookup.
    pub async fn on_input(&self, field: Field, value: &str) -> LookupReport {
        let postal_code = {
            let mut form = self.form.write().await;
            let value = match field {
                Field::PostalCode => cep::format_cep(value),
                _ => value.to_string(),
            };
            form.set(field, value);
            self.persist(&form);
            form.postal_code.clone()
        };

        if field == Field::PostalCode && cep::is_complete(&postal_code) {
            self.lookup(&postal_code).await
        } else {
            LookupReport::Skipped
        }
    }

    /// Empty every field and forget the saved record.
    pub async fn on_clear(&self) {
        let mut form = self.form.write().await;
        // Anything still in flight belongs to the old form.
        self.latest_ticket.fetch_add(1, Ordering::SeqCst);
        *form = AddressRecord::default();
        self.store.clear();
        info!("form cleared");
    }

    /// Nothing is sent anywhere; the user just gets the confirmation.
    pub fn on_submit(&self) -> &'static str {
        self.notifier.notify(SUBMIT_MESSAGE);
        SUBMIT_MESSAGE
    }

    /// Restore the saved record into the form, then refresh the address if
    /// the restored CEP is complete.
    pub async fn on_load(&self) -> LookupReport {
        let postal_code = {
            let mut form = self.form.write().await;
            match self.store.restore() {
                Ok(Some(record)) => {
                    info!(cep = %record.postal_code, saved_at = ?record.saved_at, "restored saved form");
                    *form = record.without_timestamp();
                }
                Ok(None) => debug!("no saved form to restore"),
                Err(e) => error!(error = %e, "failed to restore saved form"),
            }
            form.postal_code.clone()
        };

        if cep::is_complete(&postal_code) {
            self.lookup(&postal_code).await
        } else {
            LookupReport::Skipped
        }
    }

    /// Look `postal_code` up and fill the address fields from the answer.
    ///
    /// Does nothing unless the code has exactly eight digits. Errors are
    /// logged and leave the form as it was.
    pub async fn lookup(&self, postal_code: &str) -> LookupReport {
        let digits = cep::cep_digits(postal_code);
        if digits.len() != CEP_DIGITS {
            return LookupReport::Skipped;
        }

        let ticket = self.latest_ticket.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(cep = %digits, ticket, "starting lookup");

        let outcome = match self.lookup.fetch(&digits).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(cep = %digits, error = %e, "CEP lookup failed");
                return LookupReport::Failed;
            }
        };

        match outcome {
            LookupOutcome::NotFound => {
                if !self.is_latest(ticket) {
                    debug!(cep = %digits, ticket, "discarding stale not-found answer");
                    return LookupReport::Stale;
                }
                self.notifier.notify(NOT_FOUND_MESSAGE);
                LookupReport::NotFound
            }
            LookupOutcome::Found(remote) => {
                let mut form = self.form.write().await;
                // Checked under the lock so a concurrent clear cannot slip in between.
                if !self.is_latest(ticket) {
                    debug!(cep = %digits, ticket, "discarding stale lookup answer");
                    return LookupReport::Stale;
                }
                form.apply_remote(&remote);
                self.persist(&form);
                info!(cep = %digits, city = %form.city, uf = %form.state_code, "address filled from lookup");
                LookupReport::Applied
            }
        }
    }

    fn is_latest(&self, ticket: u64) -> bool {
        self.latest_ticket.load(Ordering::SeqCst) == ticket
    }

    fn persist(&self, form: &AddressRecord) {
        if let Err(e) = self.store.save(form) {
            warn!(error = %e, "failed to autosave form");
        }
    }
}
