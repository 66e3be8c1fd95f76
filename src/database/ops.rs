//! Raw query functions, one submodule per table

pub mod lists;
