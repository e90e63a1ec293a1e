pub mod builders;
pub mod mock_executor;

pub use builders::*;
pub use mock_executor::*;
