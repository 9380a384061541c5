use std::error::Error;

pub mod backend;
pub mod cache;
pub mod config;
pub mod error;
pub mod highlight;
pub mod model;
pub mod render;
pub mod response;
pub mod state;
pub mod sync;
pub mod transport;
pub mod vault;

#[cfg(test)]
mod test_utils;

pub fn unpack_error(err: &(dyn Error)) -> String {
    let mut parts = Vec::new();
    parts.push(err.to_string());
    let mut current = err.source();
    while let Some(source) = current {
        parts.push(source.to_string());
        current = source.source();
    }
    parts.join(": ")
}
