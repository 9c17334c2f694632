pub use grainfall_building_blocks::*;
pub use grainfall_concepts::*;

pub use grainfall_core::backend::partitioned::{
    Coordinator, Parallelizer, PartitionedRelaxer, RoundSummary, Settings,
};
pub use grainfall_core::backend::serial::*;
pub use grainfall_core::backend::*;
pub use grainfall_core::storage::*;
