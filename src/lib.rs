extern crate self as formbind;

pub mod contracts;
pub mod feedback;
pub mod form;
pub mod prelude;
