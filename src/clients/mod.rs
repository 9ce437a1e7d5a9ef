pub mod browser;
pub mod http;
pub mod pool;

pub use browser::BrowserClient;
pub use http::HttpClient;
pub use pool::ClientPool;
