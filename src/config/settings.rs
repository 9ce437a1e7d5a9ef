use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub keywords: Vec<String>,
    pub site: SiteConfig,
    pub fetch: FetchConfig,
    pub browser: BrowserConfig,
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub base_url: String,
    pub search_url: String,
    /// Structural markers the fetcher expects in a well-formed page body,
    /// one per page kind. A body missing its marker triggers the browser
    /// fallback.
    pub search_marker: String,
    pub listing_marker: String,
    pub seller_marker: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.made-in-china.com".to_string(),
            search_url: "https://www.made-in-china.com/products-search/hot-china-products"
                .to_string(),
            search_marker: "product-item".to_string(),
            listing_marker: "product-title".to_string(),
            seller_marker: "company-name".to_string(),
        }
    }
}

impl SiteConfig {
    /// Search result page URL for a keyword. Page 1 is `<keyword>.html`,
    /// later pages append `-p<n>`.
    pub fn search_page_url(&self, keyword: &str, page: u32) -> String {
        let slug = keyword.trim().replace(' ', "-");
        if page <= 1 {
            format!("{}/{}.html", self.search_url, slug)
        } else {
            format!("{}/{}-p{}.html", self.search_url, slug, page)
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Cooperative delay floor between consecutive fetches, milliseconds.
    pub request_delay_ms: u64,
    pub request_timeout_secs: u64,
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
    /// Caller deadline per fetch, seconds. Zero disables the deadline.
    pub fetch_deadline_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            request_delay_ms: 2000,
            request_timeout_secs: 30,
            max_retries: 3,
            retry_base_delay_ms: 1000,
            fetch_deadline_secs: 90,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub enabled: bool,
    pub webdriver_url: String,
    /// Settle period after navigation, letting client-side content
    /// materialize before the page source is read.
    pub settle_ms: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            webdriver_url: "http://localhost:9515".to_string(),
            settle_ms: 2000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub max_pages: u32,
    /// Concurrency cap across targets in one batch.
    pub concurrency: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_pages: 5,
            concurrency: 2,
        }
    }
}

impl Settings {
    pub fn new() -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        settings.try_deserialize()
    }
}
