//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument.

pub mod contact_repo;
pub mod delivery_log_repo;
pub mod favorite_repo;
pub mod mutual_match_repo;
pub mod preference_repo;
pub mod queue_repo;
pub mod shortlist_repo;

pub use contact_repo::ContactRepo;
pub use delivery_log_repo::DeliveryLogRepo;
pub use favorite_repo::FavoriteRepo;
pub use mutual_match_repo::MutualMatchRepo;
pub use preference_repo::PreferenceRepo;
pub use queue_repo::QueueRepo;
pub use shortlist_repo::ShortlistRepo;
