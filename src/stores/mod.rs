pub mod data_api;
pub mod memory;
pub mod traits;
pub mod types;

pub use data_api::DataApiStore;
pub use memory::MemoryStore;
pub use traits::ListingStore;
