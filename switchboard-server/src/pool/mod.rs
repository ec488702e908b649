mod server_pool;

pub use server_pool::*;
