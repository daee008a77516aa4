pub mod allocator;
pub mod policy;
pub mod pool;
pub mod summary;
