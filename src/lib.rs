pub mod cep;
pub mod client;
pub mod config;
pub mod form;
pub mod server;
pub mod store;
pub mod types;

pub use cep::{cep_digits, format_cep, is_complete};
pub use client::{LookupClient, LookupError, ViaCepClient};
pub use config::AppConfig;
pub use form::{FormController, LogNotifier, LookupReport, Notifier, RecordingNotifier};
pub use store::{FileStorage, LocalStore, MemoryStorage, StoreClient, StoreError};
pub use types::{AddressRecord, Field, LookupOutcome, RemoteAddress};
