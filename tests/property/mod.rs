// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests Module
//!
//! Generated configurations are declared and synthesized, then checked for
//! the structural properties of the topology.

mod synthesis;
mod value_objects;
