pub mod initial;
pub mod metric;
pub mod profile;
pub mod refine;
pub mod simplex;
pub mod symmetry;

pub use initial::initial_center;
pub use metric::{asymmetry_metric, MetricContext};
pub use profile::{wedge_profiles, BaseOffsets, ProfileConfig, WedgeProfiles};
pub use refine::{find_center, refine_center, RefineConfig, RefineOutcome, RefineStatus};
pub use symmetry::{mirror_of, symmetric_mask};
