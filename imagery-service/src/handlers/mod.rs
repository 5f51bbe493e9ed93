pub mod ask;
pub mod daily;
pub mod health;
pub mod images;
pub mod metrics;

pub use ask::ask;
pub use daily::{daily_image, daily_images};
pub use health::{health_check, readiness_check};
pub use images::{generate_image, search_image};
pub use metrics::metrics_endpoint;
