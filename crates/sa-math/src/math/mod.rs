//! Core math modules.

pub mod boundary;
pub mod growth;
pub mod sprt;
pub mod stable;
