extern crate serde;
extern crate serde_json;

extern crate itertools;
#[macro_use]
extern crate lazy_static;
extern crate regex;
extern crate tracing;
extern crate tracing_subscriber;

pub mod config;
pub mod data_source;
pub mod errors;
pub mod file_utils;
pub mod graph_model;
pub mod layout;
pub mod logging;
pub mod viewer;

mod utils;
