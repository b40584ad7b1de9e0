pub mod configuration;
pub mod domains;
pub mod errors;
pub mod parameter;
pub mod run;

pub use configuration::*;
pub use domains::*;
pub use errors::*;
pub use parameter::*;
pub use run::*;
