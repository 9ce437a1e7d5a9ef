mod settings;

pub use settings::{BrowserConfig, FetchConfig, PipelineConfig, Settings, SiteConfig};
