pub mod facade;
pub mod sampler;
pub mod screen;

#[cfg(test)]
pub(crate) mod test_support;

pub use crate::domain::model::{
    Location, Posting, QueryPhase, ResultBundle, Soldier, SoldierId, Status, VisitedLocation,
};
pub use crate::domain::ports::{Collections, ConfigProvider, DataAccess};
pub use crate::utils::error::Result;
