pub mod daily_cache;
pub mod describer;
pub mod metrics;
pub mod providers;
pub mod resolver;
pub mod sources;
pub mod storage;

pub use daily_cache::DailyCacheManager;
pub use describer::DescriptionGenerator;
pub use metrics::{get_metrics, init_metrics};
pub use resolver::{FallbackChain, FallbackResolver, Tier};
pub use storage::{ImageDownloader, LocalStorage};
