//! Drivers

use jiff::civil::Weekday;
use smallvec::SmallVec;

use crate::{stores::StoreUuid, uuids::TypedUuid};

/// Driver UUID
pub type DriverUuid = TypedUuid<Driver>;

/// A driver who collects or delivers orders for a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Driver {
    /// Driver identity
    pub uuid: DriverUuid,
    /// Employing store
    pub store: StoreUuid,
    /// Display name
    pub name: String,
    /// Whether the driver is taking work
    pub active: bool,
    /// Days the driver works
    pub working_days: SmallVec<[Weekday; 7]>,
}

impl Driver {
    /// Create an active driver working the given days.
    pub fn new(
        uuid: DriverUuid,
        store: StoreUuid,
        name: impl Into<String>,
        working_days: impl IntoIterator<Item = Weekday>,
    ) -> Self {
        let mut days: SmallVec<[Weekday; 7]> = SmallVec::new();

        for day in working_days {
            if !days.contains(&day) {
                days.push(day);
            }
        }

        Self {
            uuid,
            store,
            name: name.into(),
            active: true,
            working_days: days,
        }
    }

    /// Whether the driver works on `day`.
    pub fn works_on(&self, day: Weekday) -> bool {
        self.working_days.contains(&day)
    }

    /// Whether the driver can take work for `store`.
    pub fn can_serve(&self, store: StoreUuid) -> bool {
        self.active && self.store == store
    }
}
