pub mod check;
pub mod convert;
mod pipeline;
