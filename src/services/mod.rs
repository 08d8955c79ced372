//! Business logic services

pub mod catalog;
pub mod loans;
pub mod redis;
pub mod renewal;
pub mod users;

use std::sync::Arc;

use crate::{
    clock::Clock,
    config::AuthConfig,
    repository::{BookInstanceStore, Repository},
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub repository: Repository,
    pub catalog: catalog::CatalogService,
    pub loans: loans::LoansService,
    pub users: users::UsersService,
    pub redis: redis::RedisService,
}

impl Services {
    /// Create all services. Book instances go through `store` so tests can swap it.
    pub fn new(
        repository: Repository,
        store: Arc<dyn BookInstanceStore>,
        clock: Arc<dyn Clock>,
        auth_config: AuthConfig,
        page_size: i64,
        redis_service: redis::RedisService,
    ) -> Self {
        Self {
            catalog: catalog::CatalogService::new(
                repository.clone(),
                store.clone(),
                clock.clone(),
                page_size,
            ),
            loans: loans::LoansService::new(store, clock, page_size),
            users: users::UsersService::new(repository.clone(), auth_config),
            redis: redis_service,
            repository,
        }
    }
}
