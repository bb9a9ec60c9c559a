/// Jaccard similarity at or above which two candidates are treated as the same item
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.7;
/// Leading positions of the ranked list in which category caps are enforced
pub const DEFAULT_DIVERSITY_WINDOW: usize = 20;
/// Maximum candidates of one type inside the diversity window
pub const DEFAULT_MAX_PER_TYPE: usize = 8;
/// Maximum candidates for one destination inside the diversity window
pub const DEFAULT_MAX_PER_DESTINATION: usize = 6;
/// Size of the final shortlist handed to aggregation
pub const DEFAULT_TOP_N: usize = 30;
/// Maximum raw items taken from a single worker result
pub const DEFAULT_MAX_CANDIDATES_PER_WORKER: usize = 50;
/// Maximum outbound queries the worker stage may issue
pub const DEFAULT_MAX_WORKER_QUERIES: usize = 8;
/// Schema version stamped into every checkpoint envelope
pub const CHECKPOINT_SCHEMA_VERSION: u32 = 1;
/// Default directory for run data
pub const DEFAULT_DATA_ROOT: &str = "./data";
