#![warn(clippy::all)]
#![doc = include_str!("../README.md")]

// Modules that make up the filter-flow library.
mod args;
mod audit;
mod chain;
mod config;
mod dashboard;
mod dataset;
mod error;
mod export;
mod extension;
mod filter;
mod flow;
mod panel;
mod source;
mod traits;

// Publicly expose the contents of these modules.
pub use self::{
    // add to lib
    args::Arguments,
    audit::*,
    chain::*,
    config::*,
    dashboard::*,
    dataset::*,
    error::*,
    export::*,
    extension::*,
    filter::*,
    flow::*,
    panel::*,
    source::*,
    traits::*,
};
