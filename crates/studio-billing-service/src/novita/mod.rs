//! Novita provider API integration.
//!
//! The generation gateway forwards validated payloads here. Video features
//! use Novita's asynchronous task API (submit, then poll by task id);
//! text-to-image and face-merge are synchronous calls.

pub mod client;
pub mod types;

pub use client::{NovitaClient, NovitaError};
pub use types::{
    CreateTaskResponse, KlingVideoRequest, MergeFaceRequest, MergeFaceResponse, SeedreamExtra,
    SeedreamInput, SeedreamRequest, SeedreamResponse, TaskInfo, TaskResultResponse, TaskVideo,
};
