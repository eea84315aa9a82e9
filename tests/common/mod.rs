#![allow(dead_code)]

pub mod store;
pub mod utils;
