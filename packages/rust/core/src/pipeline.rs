//! End-to-end paper build pipeline: assemble → write the build unit →
//! drive the external toolchain → verify the artifact.
//!
//! The compilation protocol is selected exactly once at build start
//! from bibliography presence. With a bibliography the orchestrator
//! runs the manual three-pass sequence with a resolution sub-pass in
//! between; without one it hands the whole job to the engine's own
//! multipass driver.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{info, instrument, warn};

use texforge_shared::{BIBLIOGRAPHY_FILE, BUILD_BASENAME, BUILD_DIR, Result, TexforgeError};

use crate::assembler;
use crate::engine::{self, ToolInvocation};

// ---------------------------------------------------------------------------
// Protocol selection
// ---------------------------------------------------------------------------

/// Compilation protocol, chosen once per build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildProtocol {
    /// Manual typeset → resolve → typeset → typeset sequence. Required
    /// when bibliographic data exists, because bibliography resolution
    /// depends on the auxiliary state of the first pass.
    Bibliography,
    /// Single call to the engine's multipass driver, which iterates
    /// internally until cross-references stabilize.
    EngineDriver,
}

impl BuildProtocol {
    /// Select the protocol for a paper directory from the sole
    /// condition: does bibliographic data exist?
    pub fn select(paper_dir: &Path) -> Self {
        if paper_dir.join(BIBLIOGRAPHY_FILE).exists() {
            Self::Bibliography
        } else {
            Self::EngineDriver
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration and results
// ---------------------------------------------------------------------------

/// Configuration for a single paper build.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// The paper directory (unit of work).
    pub paper_dir: PathBuf,
    /// Typesetting engine command.
    pub engine: String,
    /// Bibliography resolution command.
    pub bibliography_tool: String,
    /// Engine-owned multipass driver command.
    pub driver: String,
    /// Bounded wait per external invocation.
    pub timeout: Duration,
    /// Style-asset directory, passed per-invocation via `TEXINPUTS`.
    pub search_path: Option<PathBuf>,
    /// Strict policy: fail when no bibliographic data exists.
    pub require_bibliography: bool,
}

/// Result of a successful build.
#[derive(Debug)]
pub struct BuildReport {
    /// Path to the compiled artifact.
    pub artifact_path: PathBuf,
    /// Path to the composed source inside the build output directory.
    pub source_path: PathBuf,
    /// Number of fragments included.
    pub fragment_count: usize,
    /// Protocol that was run.
    pub protocol: BuildProtocol,
    /// Non-fatal problems surfaced alongside success.
    pub warnings: Vec<String>,
    /// Total elapsed time.
    pub elapsed: Duration,
}

/// Progress callback for reporting build phases.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
}

// ---------------------------------------------------------------------------
// Pipeline entry points
// ---------------------------------------------------------------------------

/// Run the full build pipeline.
///
/// 1. Precondition checks (paper directory, bibliography policy)
/// 2. Assemble the composed document
/// 3. Clear/create the build output directory and write the build unit
/// 4. Drive the selected compilation protocol
/// 5. Verify the artifact exists (exit codes alone are not trusted)
#[instrument(skip_all, fields(paper_dir = %config.paper_dir.display()))]
pub async fn build_paper(
    config: &BuildConfig,
    progress: &dyn ProgressReporter,
) -> Result<BuildReport> {
    let start = Instant::now();

    if !config.paper_dir.is_dir() {
        return Err(TexforgeError::validation(format!(
            "paper directory {} does not exist",
            config.paper_dir.display()
        )));
    }

    let protocol = BuildProtocol::select(&config.paper_dir);
    if config.require_bibliography && protocol == BuildProtocol::EngineDriver {
        return Err(TexforgeError::validation(format!(
            "{BIBLIOGRAPHY_FILE} is required by the build policy but was not found in {}",
            config.paper_dir.display()
        )));
    }

    info!(?protocol, "starting paper build");

    progress.phase("Assembling document");
    let metadata = assembler::load_metadata(&config.paper_dir)?;
    let fragments = assembler::discover_fragments(&config.paper_dir)?;
    if fragments.is_empty() {
        warn!("no fragments found; the composed document will be nearly empty");
    }
    let composed = assembler::compose(
        &metadata,
        &fragments,
        protocol == BuildProtocol::Bibliography,
    );

    progress.phase("Writing build unit");
    let build_dir = init_build_dir(&config.paper_dir)?;
    let source_path = build_dir.join(assembler::source_file_name());
    std::fs::write(&source_path, composed.render())
        .map_err(|e| TexforgeError::io(&source_path, e))?;

    let mut warnings = Vec::new();
    match protocol {
        BuildProtocol::Bibliography => {
            compile_with_bibliography(config, &build_dir, progress, &mut warnings).await?
        }
        BuildProtocol::EngineDriver => compile_with_driver(config, &build_dir, progress).await?,
    }

    progress.phase("Verifying artifact");
    let artifact_path = build_dir.join(format!("{BUILD_BASENAME}.pdf"));
    if !artifact_path.exists() {
        return Err(TexforgeError::ArtifactMissing {
            path: artifact_path,
        });
    }

    let elapsed = start.elapsed();
    info!(
        artifact = %artifact_path.display(),
        fragments = fragments.len(),
        warnings = warnings.len(),
        elapsed_ms = elapsed.as_millis(),
        "build complete"
    );

    Ok(BuildReport {
        artifact_path,
        source_path,
        fragment_count: fragments.len(),
        protocol,
        warnings,
        elapsed,
    })
}

/// Assemble and write the composed source without compiling.
///
/// Shares the build-output lifecycle with [`build_paper`] so the
/// written source is byte-identical to what a full build would consume.
#[instrument(skip_all, fields(paper_dir = %paper_dir.display()))]
pub fn assemble_only(paper_dir: &Path) -> Result<PathBuf> {
    if !paper_dir.is_dir() {
        return Err(TexforgeError::validation(format!(
            "paper directory {} does not exist",
            paper_dir.display()
        )));
    }

    let metadata = assembler::load_metadata(paper_dir)?;
    let fragments = assembler::discover_fragments(paper_dir)?;
    let composed = assembler::compose(&metadata, &fragments, assembler::has_bibliography(paper_dir));

    let build_dir = init_build_dir(paper_dir)?;
    let source_path = build_dir.join(assembler::source_file_name());
    std::fs::write(&source_path, composed.render())
        .map_err(|e| TexforgeError::io(&source_path, e))?;

    info!(source = %source_path.display(), fragments = fragments.len(), "source assembled");
    Ok(source_path)
}

// ---------------------------------------------------------------------------
// Compilation protocols
// ---------------------------------------------------------------------------

/// Manual three-pass protocol with bibliography resolution.
///
/// Typesetting passes are fatal on non-zero exit. The resolution
/// sub-pass is tolerated: bibliography tools commonly exit non-zero on
/// recoverable warnings while still producing usable output.
async fn compile_with_bibliography(
    config: &BuildConfig,
    build_dir: &Path,
    progress: &dyn ProgressReporter,
    warnings: &mut Vec<String>,
) -> Result<()> {
    progress.phase("Typesetting (pass 1/3)");
    run_typeset_pass(config, build_dir, "typeset pass 1/3").await?;

    progress.phase("Resolving bibliography");
    let invocation = ToolInvocation {
        program: config.bibliography_tool.clone(),
        args: vec![BUILD_BASENAME.to_string()],
        cwd: build_dir.to_path_buf(),
        search_path: config.search_path.clone(),
        timeout: config.timeout,
    };
    let output = engine::run_tool("bibliography resolution", &invocation).await?;
    if !output.success {
        warn!(
            code = ?output.code,
            "bibliography resolution reported errors, continuing"
        );
        warnings.push(format!(
            "bibliography resolution exited with status {}; output may have unresolved citations",
            output
                .code
                .map(|c| c.to_string())
                .unwrap_or_else(|| "unknown".into())
        ));
    }

    progress.phase("Typesetting (pass 2/3)");
    run_typeset_pass(config, build_dir, "typeset pass 2/3").await?;

    progress.phase("Typesetting (pass 3/3)");
    run_typeset_pass(config, build_dir, "typeset pass 3/3").await?;

    Ok(())
}

/// Bibliography-absent protocol: one call to the engine's own
/// multipass driver.
async fn compile_with_driver(
    config: &BuildConfig,
    build_dir: &Path,
    progress: &dyn ProgressReporter,
) -> Result<()> {
    progress.phase("Typesetting (multipass driver)");
    let invocation = ToolInvocation {
        program: config.driver.clone(),
        args: vec![
            "-pdf".to_string(),
            "-interaction=nonstopmode".to_string(),
            assembler::source_file_name(),
        ],
        cwd: build_dir.to_path_buf(),
        search_path: config.search_path.clone(),
        timeout: config.timeout,
    };
    let output = engine::run_tool("multipass driver", &invocation).await?;
    if !output.success {
        return Err(TexforgeError::Pass {
            pass: "multipass driver".to_string(),
            log_tail: engine::log_tail(&output.log).to_string(),
        });
    }
    Ok(())
}

/// One fatal typesetting pass.
async fn run_typeset_pass(config: &BuildConfig, build_dir: &Path, pass: &str) -> Result<()> {
    let invocation = ToolInvocation {
        program: config.engine.clone(),
        args: vec![
            "-interaction=nonstopmode".to_string(),
            assembler::source_file_name(),
        ],
        cwd: build_dir.to_path_buf(),
        search_path: config.search_path.clone(),
        timeout: config.timeout,
    };
    let output = engine::run_tool(pass, &invocation).await?;
    if !output.success {
        return Err(TexforgeError::Pass {
            pass: pass.to_string(),
            log_tail: engine::log_tail(&output.log).to_string(),
        });
    }
    Ok(())
}

/// Clear and recreate the build output directory. Stale auxiliary
/// state corrupts cross-reference resolution, so the directory is
/// never partially reused across builds.
fn init_build_dir(paper_dir: &Path) -> Result<PathBuf> {
    let build_dir = paper_dir.join(BUILD_DIR);
    if build_dir.exists() {
        std::fs::remove_dir_all(&build_dir).map_err(|e| TexforgeError::io(&build_dir, e))?;
    }
    std::fs::create_dir_all(&build_dir).map_err(|e| TexforgeError::io(&build_dir, e))?;
    Ok(build_dir)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
