#![warn(non_snake_case)]

pub mod analysis;
pub mod config;
pub mod formula;
pub mod net;
pub mod options;
pub mod util;
