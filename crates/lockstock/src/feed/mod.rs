//! Social feed aggregation: source registry plus Reddit and X fan-out

pub mod aggregator;
pub mod registry;

pub use aggregator::SocialFeedAggregator;
pub use registry::{SourceKind, SourceRegistry, SourceStore};
