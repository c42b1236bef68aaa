//! Core services: identification, resolution, batching, processing

pub mod arr;
pub mod batcher;
pub mod ident;
pub mod pathcheck;
pub mod process;
pub mod provenance;
pub mod provider;
pub mod providers;
pub mod resolve;
pub mod sidecar;
pub mod tmdb;

pub use arr::{ArrClient, ArrFlavor};
pub use batcher::{BatcherStatus, WebhookBatcher};
pub use ident::MediaKind;
pub use pathcheck::{PathValidator, RejectReason};
pub use process::{BatchHandler, Processor, WebhookEvent};
pub use provenance::{DateRecord, Provenance, ProvenanceKind};
pub use provider::ReleaseInfoProvider;
pub use providers::{MovieProvider, SeriesProvider};
pub use resolve::{DateResolutionEngine, ResolutionConfig, ResolveContext};
pub use sidecar::SidecarStore;
pub use tmdb::TmdbClient;
