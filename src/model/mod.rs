//! Script model: classified objects and assembled sections

mod builder;
mod elements;

pub use builder::{
    build_sections, AssembledScript, DROP_BANNER, FUNCTION_BANNER, PROCEDURE_BANNER,
};
pub use elements::*;
