pub mod batch;
pub mod classifier;
pub mod error;
pub mod extractor;
pub mod facility_index;
pub mod gazetteer;
pub mod geocoding;
pub mod pipeline;
pub mod proximity;
pub mod store;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use batch::{BatchReport, BatchRunner, InFlightSet};
pub use error::LocatorError;
pub use pipeline::LocationPipeline;
