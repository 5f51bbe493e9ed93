//! Last-resort pool of known-good image URLs.

use super::pick;

pub const DEFAULT_POOL: [&str; 3] = [
    "https://images.unsplash.com/photo-1506905925346-21bda4d32df4?ixlib=rb-4.0.3&auto=format&fit=crop&w=1200&q=80",
    "https://images.unsplash.com/photo-1446776877081-d282a0f896e2?ixlib=rb-4.0.3&auto=format&fit=crop&w=1200&q=80",
    "https://images.unsplash.com/photo-1578662996442-48f60103fc96?ixlib=rb-4.0.3&auto=format&fit=crop&w=1200&q=80",
];

#[derive(Debug, Clone)]
pub struct StaticPool {
    urls: Vec<String>,
}

impl Default for StaticPool {
    fn default() -> Self {
        Self {
            urls: DEFAULT_POOL.iter().map(|u| u.to_string()).collect(),
        }
    }
}

impl StaticPool {
    pub fn pick(&self) -> String {
        pick(&self.urls)
            .cloned()
            .unwrap_or_else(|| DEFAULT_POOL[0].to_string())
    }
}

#[cfg(test)]
impl StaticPool {
    pub(crate) fn contains(&self, url: &str) -> bool {
        self.urls.iter().any(|u| u == url)
    }
}
