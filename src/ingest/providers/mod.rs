// src/ingest/providers/mod.rs
pub mod newsapi;
pub mod synthetic;
pub mod syndication;

/// Generic stock image used when a source carries no usable image.
pub const STOCK_IMAGE_URL: &str =
    "https://images.unsplash.com/photo-1522770179533-24471fcdba45?q=80&w=1000&auto=format&fit=crop";
