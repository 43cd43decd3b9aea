//! Fetching avatar images and writing them to disk.
//!
//! [`GravatarClient`] talks to the image service, [`store`] decides where
//! each image lands, and [`FetchOrchestrator`] runs one concurrent task per
//! committer and folds the outcomes into a [`FetchSummary`].

pub mod client;
pub mod fetcher;
pub mod store;

pub use client::{AvatarResponse, AvatarSource, GravatarClient};
pub use fetcher::{FetchOptions, FetchOrchestrator, FetchOutcome, FetchSummary};
pub use store::{avatar_path, prepare_output_dir, CollisionPolicy};
