//! Core build pipeline for texforge.
//!
//! Two components, composed in dependency order:
//! - [`assembler`] — turns a paper directory into a composed LaTeX
//!   source (no filesystem writes, no subprocesses)
//! - [`pipeline`] — writes the composed source to the build output
//!   directory and drives the external toolchain through a multi-pass
//!   compilation protocol, via the [`engine`] invocation wrapper

pub mod assembler;
pub mod engine;
pub mod pipeline;
