mod candidate;
mod history;
mod listing;
mod run;
mod seller;

pub use candidate::{Candidate, ListingCandidate, SellerCandidate};
pub use history::{EntityKind, HistoryEntry};
pub use listing::{Listing, Price};
pub use run::{BatchSummary, ScrapeRun, TargetFailure};
pub use seller::Seller;
