pub mod state;
pub mod store;
pub mod store_memory;
pub mod store_redis;
pub mod transitions;
