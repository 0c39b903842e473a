pub mod enrichment;
pub mod user;

pub use enrichment::{EnrichmentGateway, HttpEnrichmentGateway};
pub use user::UserService;
