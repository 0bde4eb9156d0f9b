pub mod memory;
pub mod resolver;

pub use memory::InMemoryCatalog;
pub use resolver::SeatMapResolver;
