#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

mod error;
mod io;
mod layout;
mod pipeline;
mod task;

pub mod adapter;

#[cfg(feature = "live")]
mod reload;
#[cfg(feature = "serve")]
mod serve;
#[cfg(feature = "live")]
mod watch;

pub use crate::error::*;
pub use crate::io::clean_output;
pub use crate::layout::Layout;
pub use crate::pipeline::{Pipeline, Step};
pub use crate::task::{Context, Mode, Signal, Task};
#[cfg(feature = "live")]
pub use crate::watch::watch;
