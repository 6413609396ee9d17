use crate::cli::run;

pub mod cli;
mod config;
pub mod domain;
pub mod http;
pub mod pipeline;
pub mod render;
pub mod scrape;
pub mod search;
pub mod storage;
#[cfg(test)]
mod testing;

fn main() {
    if let Err(err) = run() {
        log::error!("{err:#}");
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}
