// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod error;
pub mod filters;
pub mod history;
pub mod ids;
pub mod model;
pub mod paging;
pub mod session;
pub mod source;
pub mod state;
pub mod stats;

pub use error::*;
pub use filters::*;
pub use ids::*;
pub use model::*;
pub use paging::*;
pub use session::*;
pub use source::*;
pub use state::*;
pub use stats::*;
