// src/lib.rs

//! coursescan: university course assessment scraper library

pub mod cache;
pub mod error;
pub mod fetch;
pub mod models;
pub mod pipeline;
pub mod scrapers;
pub mod utils;
