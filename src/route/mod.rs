// SPDX-License-Identifier: MIT

//! Route consumers of compiled expressions: requirements, results and
//! sessions loaded from YAML

mod loader;
mod requirement;
mod result;
mod session;
mod types;

pub use loader::SessionLoader;
pub use requirement::Requirement;
pub use result::ResultAssignment;
pub use session::Session;
pub use types::{RequirementDef, ResultDef, SessionDef};
