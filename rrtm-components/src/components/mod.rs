mod first_order;
mod power_law_storage;

pub use first_order::{FirstOrderDecay, FirstOrderDecayParameters};
pub use power_law_storage::{PowerLawStorage, PowerLawStorageParameters};
