//! fall-sentinel
//!
//! Post-inference pipeline for pose-based fall detection: decode per-joint
//! heatmaps into point detections, group detections into per-person
//! skeletons, classify posture/motion into a fall verdict, and debounce
//! repeated alerts over time.
//!
//! # Architecture
//!
//! Data flows one frame at a time:
//!
//! ```text
//! source -> estimator -> decode -> cluster -> classify -> debounce
//!                                                           |
//!                               draw + notification commands
//! ```
//!
//! The pose estimator is an opaque collaborator behind [`pose::PoseEstimator`];
//! video capture sits behind [`ingest::FrameSource`]. Rendering and audio are
//! out of scope: the pipeline only emits [`pipeline::DrawCommand`] and
//! [`alert::NotificationCommand`] values for external consumers.
//!
//! # Module Structure
//!
//! - `heatmap`: tensor container and per-joint argmax decoding
//! - `cluster`: greedy seed-anchored person grouping
//! - `skeleton`: joint/bone tables and the fixed-size skeleton type
//! - `classify`: fall policies (stateless ratio, stateful temporal)
//! - `alert`: time-gated alert debouncing
//! - `pipeline` / `session`: per-frame composition and the capture loop
//! - `ingest` / `pose`: frame sources and estimator backends
//! - `config`: file + env + CLI layered configuration

pub mod alert;
pub mod classify;
pub mod cluster;
pub mod config;
pub mod frame;
pub mod heatmap;
pub mod ingest;
pub mod pipeline;
pub mod pose;
pub mod session;
pub mod skeleton;

pub use alert::{AlertDebouncer, NotificationCommand};
pub use classify::{build_policy, FallPolicy, RatioPolicy, TemporalPolicy, Verdict};
pub use cluster::cluster_persons;
pub use config::SentinelConfig;
pub use frame::Frame;
pub use heatmap::{decode, DecodedJoints, Heatmaps, JointDetection};
pub use ingest::{open_source, FrameSource, SourceStats, StubSource};
pub use pipeline::{DrawCommand, FallPipeline, FrameReport};
pub use pose::{build_estimator, PoseEstimator, StubEstimator};
pub use session::{DetectionSession, FrameSink, SessionStats};
pub use skeleton::{BodyPart, Point, Skeleton, BONES};
