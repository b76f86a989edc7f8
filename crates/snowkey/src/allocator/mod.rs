mod lock;
mod mutex;
mod policy;

pub use lock::*;
pub use policy::*;
