// Declare modules within the adapters directory
pub mod http_scheduling_client;
pub mod in_memory_cache;
pub mod in_memory_repository;
pub mod in_memory_scheduling;
pub mod postgres_repository;
