pub mod catalog;
pub mod config;
pub mod effects;
pub mod flow;
pub mod reason;
pub mod store;
#[cfg(test)]
pub(crate) mod test_support;

pub use catalog::{ReasonCatalog, ReasonOption};
pub use effects::{CallbackEffects, FlowEffects};
pub use flow::{ModalPhase, UnenrollFlow};
pub use reason::{ReasonCapture, ReasonKey};
pub use store::{Enrollment, EnrollmentStore, StoreError, Unenrollment};
