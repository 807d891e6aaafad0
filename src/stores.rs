//! Stores

use crate::{services::ServiceCatalog, settings::StoreSettings, uuids::TypedUuid};

/// Store UUID
pub type StoreUuid = TypedUuid<Store>;

/// A garment-care store and the services it sells.
#[derive(Debug, Clone)]
pub struct Store {
    /// Store identity
    pub uuid: StoreUuid,
    /// Trading name
    pub name: String,
    /// Resolved store configuration
    pub settings: StoreSettings,
    /// Services offered and their prices
    pub catalog: ServiceCatalog<'static>,
}
