//! Domain models shared by the engine, the scheduler and the API.

pub mod device;
pub mod geo;
pub mod method;
pub mod prayer;

pub use device::*;
pub use geo::GeoMoment;
pub use method::{CalculationMethod, FajrRule, IshaRule, MaghribRule, MethodInfo};
pub use prayer::*;
