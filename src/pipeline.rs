//! End-to-end table location.
//!
//! For each selected page: cut the page out, correct its rotation, render
//! it, run the detector and reconcile the boxes onto the page. Pages are
//! independent and fan out over rayon when enabled.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::Serialize;
use tempfile::TempDir;

use crate::error::{Error, Result};
use crate::geometry::PageFrame;
use crate::model::{Cell, CellGrid, Page, Rotation, TableRegion};
use crate::parser::{
    upright, CellExtractor, ContentOptions, Document, ErrorMode, LocateOptions,
};
use crate::raster::{rasterize, PageRenderer};
use crate::region::{reconcile, ReconcileOptions, RegionDetector};
use crate::style::{attach_styles, build_style_index, StyleIndex};

/// Directory holding per-page artifacts.
#[derive(Debug)]
pub struct Workspace {
    dir: PathBuf,
    // Removed on drop when the workspace owns a temporary directory
    _temp: Option<TempDir>,
}

impl Workspace {
    /// Create a temporary workspace, deleted when dropped.
    pub fn temporary() -> Result<Self> {
        let temp = tempfile::Builder::new().prefix("untable-").tempdir()?;
        Ok(Self {
            dir: temp.path().to_path_buf(),
            _temp: Some(temp),
        })
    }

    /// Use an existing directory, creating it if needed. Nothing is removed
    /// from it except per-page artifacts.
    pub fn at<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir, _temp: None })
    }

    /// Workspace directory.
    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Path of an artifact file.
    pub fn artifact(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }

    /// Path of the raster image of a page.
    pub fn page_image(&self, page: u32) -> PathBuf {
        self.artifact(&format!("page-{}.png", page))
    }
}

/// Deletes tracked files when dropped, unless told to keep them.
struct ArtifactGuard {
    paths: Vec<PathBuf>,
    keep: bool,
}

impl ArtifactGuard {
    fn new(keep: bool) -> Self {
        Self {
            paths: Vec::new(),
            keep,
        }
    }

    fn track(&mut self, path: PathBuf) {
        self.paths.push(path);
    }

    /// Stop tracking a file and remove it now.
    fn discard(&mut self, path: &Path) {
        self.paths.retain(|p| p != path);
        if let Err(e) = std::fs::remove_file(path) {
            log::debug!("Could not remove {}: {}", path.display(), e);
        }
    }

    /// Tracked files that will survive the guard.
    fn surviving(&self) -> Vec<PathBuf> {
        if self.keep {
            self.paths.clone()
        } else {
            Vec::new()
        }
    }
}

impl Drop for ArtifactGuard {
    fn drop(&mut self) {
        if self.keep {
            return;
        }
        for path in &self.paths {
            if let Err(e) = std::fs::remove_file(path) {
                log::debug!("Could not remove {}: {}", path.display(), e);
            }
        }
    }
}

/// Result of locating tables on one page.
#[derive(Debug, Clone, Serialize)]
pub struct LocatedPage {
    /// Page number (1-indexed)
    pub number: u32,
    /// The page as loaded after rotation correction
    pub page: Page,
    /// Rotation correction that was applied
    pub rotation: Rotation,
    /// Table regions in detector order
    pub regions: Vec<TableRegion>,
    /// Raster size the detector saw, in pixels
    pub image_size: (u32, u32),
    /// Artifact files left in the workspace
    pub artifacts: Vec<PathBuf>,
}

/// A table with its cells and their styles.
#[derive(Debug, Clone, Serialize)]
pub struct LocatedTable {
    /// Where the table is
    pub region: TableRegion,
    /// Cell texts
    pub grid: CellGrid,
    /// Cells with resolved styles, row-major
    pub cells: Vec<Vec<Cell>>,
}

/// Locates tables in documents with a renderer and a detector.
pub struct TableLocator {
    renderer: Box<dyn PageRenderer>,
    detector: Box<dyn RegionDetector>,
    options: LocateOptions,
    content: ContentOptions,
}

impl TableLocator {
    /// Create a locator with default options.
    pub fn new<R, D>(renderer: R, detector: D) -> Self
    where
        R: PageRenderer + 'static,
        D: RegionDetector + 'static,
    {
        Self {
            renderer: Box::new(renderer),
            detector: Box::new(detector),
            options: LocateOptions::default(),
            content: ContentOptions::default(),
        }
    }

    /// Set locating options.
    pub fn with_options(mut self, options: LocateOptions) -> Self {
        self.options = options;
        self
    }

    /// Set line grouping options.
    pub fn with_content_options(mut self, content: ContentOptions) -> Self {
        self.content = content;
        self
    }

    /// Current options.
    pub fn options(&self) -> &LocateOptions {
        &self.options
    }

    /// Locate tables on every selected page.
    ///
    /// Results are in page order. In lenient mode failing pages are logged
    /// and left out.
    pub fn locate_pages(
        &self,
        document: &Document,
        workspace: &Workspace,
    ) -> Result<Vec<LocatedPage>> {
        let numbers = self.options.pages.resolve(document.page_count())?;
        log::debug!(
            "Locating tables on {} of {} pages",
            numbers.len(),
            document.page_count()
        );

        let results: Vec<(u32, Result<LocatedPage>)> = if self.options.parallel {
            numbers
                .par_iter()
                .map(|&n| (n, self.locate_page(document, n, workspace)))
                .collect()
        } else {
            numbers
                .iter()
                .map(|&n| (n, self.locate_page(document, n, workspace)))
                .collect()
        };

        self.collect_pages(results)
    }

    /// Locate tables and return only the regions, in page order.
    pub fn locate_tables(
        &self,
        document: &Document,
        workspace: &Workspace,
    ) -> Result<Vec<TableRegion>> {
        Ok(self
            .locate_pages(document, workspace)?
            .into_iter()
            .flat_map(|p| p.regions)
            .collect())
    }

    /// Locate tables, extract their cells and attach cell styles.
    pub fn extract_tables(
        &self,
        document: &Document,
        workspace: &Workspace,
        extractor: &dyn CellExtractor,
    ) -> Result<Vec<LocatedTable>> {
        let mut tables = Vec::new();
        for located in self.locate_pages(document, workspace)? {
            if located.regions.is_empty() {
                continue;
            }
            match self.styled_tables(&located, extractor) {
                Ok(mut found) => tables.append(&mut found),
                Err(e) if self.options.error_mode == ErrorMode::Lenient => {
                    log::warn!("Skipping tables on page {}: {}", located.number, e);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(tables)
    }

    /// Locate tables on a single page.
    pub fn locate_page(
        &self,
        document: &Document,
        number: u32,
        workspace: &Workspace,
    ) -> Result<LocatedPage> {
        let mut guard = ArtifactGuard::new(self.options.keep_artifacts);

        let single = document.extract_page(number)?;
        let pdf_path = workspace.artifact(&single.file_name());
        single.save(&pdf_path)?;
        guard.track(pdf_path.clone());

        let (single, page) = upright(&single, &self.content)?;
        if single.rotation().is_rotated() {
            // Only the corrected copy is kept
            guard.discard(&pdf_path);
            let rotated_path = workspace.artifact(&single.file_name());
            single.save(&rotated_path)?;
            guard.track(rotated_path);
        }

        let image_path = self
            .options
            .save_images
            .then(|| workspace.page_image(number));
        let raster = rasterize(
            &single,
            self.options.dpi,
            self.renderer.as_ref(),
            image_path.as_deref(),
        )?;

        let detections = self.detector.detect(&raster)?;
        log::debug!("Page {}: {} raw detections", number, detections.len());

        let frame = PageFrame::new(page.width, page.height, raster.width(), raster.height());
        let regions = reconcile(
            &detections,
            frame,
            number,
            &ReconcileOptions::from(&self.options),
        );

        let mut artifacts = guard.surviving();
        artifacts.extend(image_path);

        Ok(LocatedPage {
            number,
            rotation: single.rotation(),
            regions,
            image_size: (raster.width(), raster.height()),
            artifacts,
            page,
        })
    }

    fn collect_pages(&self, results: Vec<(u32, Result<LocatedPage>)>) -> Result<Vec<LocatedPage>> {
        let mut pages = Vec::with_capacity(results.len());
        for (number, result) in results {
            match result {
                Ok(page) => pages.push(page),
                Err(e) if self.options.error_mode == ErrorMode::Lenient => {
                    log::warn!("Skipping page {}: {}", number, e);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(pages)
    }

    fn styled_tables(
        &self,
        located: &LocatedPage,
        extractor: &dyn CellExtractor,
    ) -> Result<Vec<LocatedTable>> {
        let index = match build_style_index(&located.page) {
            Ok(index) => index,
            Err(Error::NoDiscriminatingFonts { page }) => {
                log::warn!("Page {}: no text to match cell styles against", page);
                StyleIndex::new(page)
            }
            Err(e) => return Err(e),
        };
        located
            .regions
            .iter()
            .map(|region| {
                let grid = extractor
                    .extract_cells(&located.page, region)
                    .map_err(|e| match e {
                        Error::CellExtraction(_) => e,
                        other => Error::CellExtraction(other.to_string()),
                    })?;
                let cells = attach_styles(region, &grid, &index);
                Ok(LocatedTable {
                    region: region.clone(),
                    grid,
                    cells,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temporary_workspace_is_removed() {
        let path = {
            let workspace = Workspace::temporary().unwrap();
            assert!(workspace.path().is_dir());
            workspace.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn test_explicit_workspace_survives() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("nested").join("work");
        {
            let workspace = Workspace::at(&dir).unwrap();
            assert_eq!(workspace.page_image(3), dir.join("page-3.png"));
        }
        assert!(dir.is_dir());
    }

    #[test]
    fn test_artifact_guard() {
        let dir = tempfile::tempdir().unwrap();
        let scratch = dir.path().join("page-1.pdf");
        let kept = dir.path().join("page-2.pdf");
        std::fs::write(&scratch, b"x").unwrap();
        std::fs::write(&kept, b"x").unwrap();

        {
            let mut guard = ArtifactGuard::new(false);
            guard.track(scratch.clone());
            assert!(guard.surviving().is_empty());
        }
        {
            let mut guard = ArtifactGuard::new(true);
            guard.track(kept.clone());
            assert_eq!(guard.surviving(), vec![kept.clone()]);
        }

        assert!(!scratch.exists());
        assert!(kept.exists());
    }

    #[test]
    fn test_artifact_guard_discard() {
        let dir = tempfile::tempdir().unwrap();
        let original = dir.path().join("page-2.pdf");
        let rotated = dir.path().join("page-2-rotated.pdf");
        std::fs::write(&original, b"x").unwrap();
        std::fs::write(&rotated, b"x").unwrap();

        let mut guard = ArtifactGuard::new(true);
        guard.track(original.clone());
        guard.discard(&original);
        guard.track(rotated.clone());

        assert!(!original.exists());
        assert_eq!(guard.surviving(), vec![rotated]);
    }
}
