pub mod clock;
pub mod crypto_pool;
pub mod snapshot;
pub mod swap;
pub mod tweak_price;
