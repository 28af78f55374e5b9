use energymap_common::Facility;
use tracing::{debug, info};

use crate::store::FacilityStore;

/// Read-only snapshot of geo-tagged facilities. Shared across workers as
/// `Arc<FacilityIndex>`; refreshing means building a new index.
#[derive(Debug, Clone, Default)]
pub struct FacilityIndex {
    facilities: Vec<Facility>,
}

impl FacilityIndex {
    /// Keeps insertion order. Facilities with missing or out-of-range
    /// coordinates are left out.
    pub fn from_facilities(facilities: impl IntoIterator<Item = Facility>) -> Self {
        let facilities = facilities
            .into_iter()
            .filter(|f| {
                let ok = f.coordinate().is_valid();
                if !ok {
                    debug!(
                        facility_id = %f.id,
                        name = f.name.as_str(),
                        "Skipping facility with invalid coordinates"
                    );
                }
                ok
            })
            .collect();
        Self { facilities }
    }

    pub async fn load(store: &dyn FacilityStore) -> anyhow::Result<Self> {
        let facilities = store.list_all_with_coordinates().await?;
        let fetched = facilities.len();
        let index = Self::from_facilities(facilities);
        info!(fetched, indexed = index.len(), "Facility index loaded");
        Ok(index)
    }

    pub fn facilities(&self) -> &[Facility] {
        &self.facilities
    }

    pub fn len(&self) -> usize {
        self.facilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facilities.is_empty()
    }
}
