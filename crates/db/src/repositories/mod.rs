pub mod player_cache_repo;

pub use player_cache_repo::PlayerCacheRepo;
