//! Streaming HTTP client for media transfers.
//!
//! This module downloads media files (video and thumbnail bytes) to a
//! caller-supplied path with streaming writes, so large files never sit in
//! memory. Destination selection and atomic replacement belong to the file
//! store; this layer only fills the scratch file it is pointed at.
//!
//! # Example
//!
//! ```no_run
//! use offtube::download::HttpClient;
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new();
//! let bytes = client
//!     .download_to_path("https://cdn.example.com/v.mp4", Path::new("./scratch/v.mp4.part"))
//!     .await?;
//! println!("Downloaded {bytes} bytes");
//! # Ok(())
//! # }
//! ```

mod client;
mod error;

pub use client::HttpClient;
pub use error::DownloadError;
