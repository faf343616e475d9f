//! treemirror core - Domain types, ports and configuration
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain types** - `SyncAction`, `SyncEvent`, `ContentDigest`, `SyncRoots`
//! - **Port definitions** - Traits for adapters: `ILocalFileSystem`, `ISyncLog`
//! - **Configuration** - YAML-backed settings with validation and a builder
//!
//! # Architecture
//!
//! The domain module contains pure types with no I/O. Ports define the trait
//! interfaces that the sync engine depends on and that adapter crates
//! implement (`treemirror-sync` for the filesystem, `treemirror-audit` for
//! the action log).

pub mod config;
pub mod domain;
pub mod ports;
