//! The staged loading pipeline and the catalog it produces
//!
//! A load walks fixed stages: fetch every sheet image listed in the
//! manifest, cut base sprites out of them, build one sprite entry per
//! row, then link forward references. Work happens in bounded steps
//! (one fetch, or one batch of rows) so a driver can interleave progress
//! reporting with anything else; `run` just loops `step` to completion.
//!
//! Only the record source failing is fatal. Missing sheets, malformed
//! rows, and dangling references become warnings and the load still
//! completes.

use std::collections::HashMap;

use serde_json::Value;
use thiserror::Error;

use crate::datasource::{DataSource, SourceError};
use crate::geometry::Rect;
use crate::models::{BaseSpriteRow, SpriteRow, TableEntry};
use crate::sheets::{Sheet, SheetSource, SheetStore};
use crate::slicer::BaseSpriteInfo;
use crate::sprites::{self, SpriteInfo, SpriteMap, Warning};
use crate::typedef::SpriteIdTransform;

/// Table holding the sliced-rectangle definitions.
pub const BASE_SPRITES_TABLE: &str = "BaseSprites";
/// Table holding the composite sprite definitions.
pub const SPRITES_TABLE: &str = "Sprites";
/// Rows processed per step when cutting and building.
pub const BATCH_SIZE: usize = 50;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Source(#[from] SourceError),
}

/// Where a load currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    LoadingImages,
    PreparingBaseSprites,
    BuildingSprites,
    LinkingSprites,
    Complete,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::LoadingImages => write!(f, "Loading images"),
            Stage::PreparingBaseSprites => write!(f, "Preparing base sprites"),
            Stage::BuildingSprites => write!(f, "Building sprites"),
            Stage::LinkingSprites => write!(f, "Linking sprites"),
            Stage::Complete => write!(f, "Complete"),
        }
    }
}

/// Progress snapshot after one step. `items_done` counts within the
/// current stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub stage: Stage,
    pub items_done: usize,
    pub done: bool,
}

/// Everything a finished load produced.
///
/// Owned by whoever drove the load; the session hands it over once
/// mutation stops, so readers never race a writer.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    sheets: SheetStore,
    base_sprites: HashMap<String, BaseSpriteInfo>,
    sprites: SpriteMap,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("no sheet loaded for file '{0}'")]
    UnknownSheet(String),
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_sheet(&mut self, file: impl Into<String>, img: image::RgbaImage) {
        self.sheets.insert(file, img);
    }

    pub fn sheet(&self, file: &str) -> Option<&Sheet> {
        self.sheets.get(file)
    }

    /// Sorted sheet keys.
    pub fn sheet_files(&self) -> Vec<&str> {
        self.sheets.files()
    }

    pub fn base_sprite(&self, id: &str) -> Option<&BaseSpriteInfo> {
        self.base_sprites.get(id)
    }

    /// Sorted base-sprite IDs.
    pub fn base_sprite_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.base_sprites.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn sprite(&self, id: &str) -> Option<&SpriteInfo> {
        self.sprites.get(id)
    }

    /// Sorted sprite IDs.
    pub fn sprite_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.sprites.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Look up the sprite behind a sprite-ID field value.
    ///
    /// The field's transform is applied first; when the transformed ID
    /// names nothing, the untransformed one is tried, since content
    /// predating the transform stores final IDs.
    pub fn sprite_for_field(
        &self,
        id: &str,
        transform: Option<&SpriteIdTransform>,
    ) -> Option<&SpriteInfo> {
        if let Some(t) = transform {
            if let Some(info) = self.sprites.get(&t.apply(id)) {
                return Some(info);
            }
        }
        self.sprites.get(id)
    }

    /// Create or re-cut one base sprite from its sheet, as the rectangle
    /// editor does after a change.
    pub fn put_base_sprite(
        &mut self,
        id: impl Into<String>,
        file: &str,
        rect: Rect,
    ) -> Result<(), CatalogError> {
        let sheet = self
            .sheets
            .get(file)
            .ok_or_else(|| CatalogError::UnknownSheet(file.to_string()))?;
        let info = BaseSpriteInfo::cut(sheet, rect, file);
        self.base_sprites.insert(id.into(), info);
        Ok(())
    }
}

/// One in-flight load over a record source and a sheet source.
pub struct LoadSession<'a> {
    source: &'a dyn DataSource,
    sheets: &'a dyn SheetSource,
    batch_size: usize,
    stage: Stage,
    items_done: usize,
    /// (content-file key, tilesheet name) fetch jobs
    sheet_jobs: Vec<(String, String)>,
    sheet_idx: usize,
    base_rows: Vec<Value>,
    base_idx: usize,
    sprite_rows: Vec<Value>,
    sprite_idx: usize,
    /// Sprite IDs in table order, for the link pass
    order: Vec<String>,
    catalog: Catalog,
    warnings: Vec<Warning>,
}

fn sheet_jobs(manifest: &[TableEntry]) -> Vec<(String, String)> {
    manifest
        .iter()
        .filter(|e| e.table_name == BASE_SPRITES_TABLE)
        .flat_map(|e| e.files.iter())
        .filter_map(|f| f.tilesheet.as_ref().map(|t| (f.file.clone(), t.clone())))
        .collect()
}

impl<'a> LoadSession<'a> {
    pub fn new(
        source: &'a dyn DataSource,
        sheets: &'a dyn SheetSource,
    ) -> Result<Self, LoadError> {
        let manifest = source.tables()?;
        Ok(Self {
            source,
            sheets,
            batch_size: BATCH_SIZE,
            stage: Stage::LoadingImages,
            items_done: 0,
            sheet_jobs: sheet_jobs(&manifest),
            sheet_idx: 0,
            base_rows: Vec::new(),
            base_idx: 0,
            sprite_rows: Vec::new(),
            sprite_idx: 0,
            order: Vec::new(),
            catalog: Catalog::new(),
            warnings: Vec::new(),
        })
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn progress(&self) -> Progress {
        Progress {
            stage: self.stage,
            items_done: self.items_done,
            done: self.stage == Stage::Complete,
        }
    }

    /// Run one bounded unit of work: a single sheet fetch, one batch of
    /// rows, or the whole link pass.
    pub fn step(&mut self) -> Result<Progress, LoadError> {
        match self.stage {
            Stage::LoadingImages => self.step_sheets()?,
            Stage::PreparingBaseSprites => self.step_bases()?,
            Stage::BuildingSprites => self.step_build(),
            Stage::LinkingSprites => self.step_link(),
            Stage::Complete => {}
        }
        Ok(self.progress())
    }

    /// Drive the session to completion, reporting after every step.
    pub fn run(
        mut self,
        mut report: impl FnMut(&Progress),
    ) -> Result<(Catalog, Vec<Warning>), LoadError> {
        loop {
            let progress = self.step()?;
            report(&progress);
            if progress.done {
                return Ok(self.finish());
            }
        }
    }

    /// Hand over whatever has been built so far plus all warnings.
    ///
    /// The eager pass and the link pass can hit the same missing
    /// reference; repeats are collapsed by message.
    pub fn finish(self) -> (Catalog, Vec<Warning>) {
        (self.catalog, sprites::dedup(self.warnings))
    }

    fn enter(&mut self, stage: Stage) {
        self.stage = stage;
        self.items_done = 0;
    }

    fn select_or_empty(&mut self, table: &str) -> Result<Vec<Value>, LoadError> {
        match self.source.select(table) {
            Ok(rows) => Ok(rows),
            Err(SourceError::UnknownTable(_)) => {
                self.warnings.push(Warning::new(format!(
                    "Table '{table}' is not listed in the manifest; skipping"
                )));
                Ok(Vec::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn step_sheets(&mut self) -> Result<(), LoadError> {
        if let Some((file, tilesheet)) = self.sheet_jobs.get(self.sheet_idx).cloned() {
            self.sheet_idx += 1;
            self.items_done += 1;
            match self.sheets.fetch(&tilesheet) {
                Ok(img) => self.catalog.sheets.insert(file, img),
                Err(e) => self.warnings.push(Warning::new(e.to_string())),
            }
        }
        if self.sheet_idx >= self.sheet_jobs.len() {
            self.base_rows = self.select_or_empty(BASE_SPRITES_TABLE)?;
            self.enter(Stage::PreparingBaseSprites);
        }
        Ok(())
    }

    fn step_bases(&mut self) -> Result<(), LoadError> {
        let end = (self.base_idx + self.batch_size).min(self.base_rows.len());
        while self.base_idx < end {
            let row = self.base_rows[self.base_idx].clone();
            self.base_idx += 1;
            self.items_done += 1;
            match serde_json::from_value::<BaseSpriteRow>(row) {
                Ok(base) => self.slice_base(base),
                Err(e) => self.warnings.push(Warning::new(format!(
                    "Skipping base sprite row {}: {}",
                    self.base_idx - 1,
                    e
                ))),
            }
        }
        if self.base_idx >= self.base_rows.len() {
            self.sprite_rows = self.select_or_empty(SPRITES_TABLE)?;
            self.enter(Stage::BuildingSprites);
        }
        Ok(())
    }

    fn slice_base(&mut self, row: BaseSpriteRow) {
        let file = match row.filename {
            Some(file) => file,
            None => {
                self.warnings.push(Warning::new(format!(
                    "Base sprite '{}' has no source file",
                    row.id
                )));
                return;
            }
        };
        let rect = match Rect::parse(&row.source_rectangle) {
            Ok(rect) => rect,
            Err(e) => {
                self.warnings.push(Warning::new(format!(
                    "Base sprite '{}': invalid rectangle: {}",
                    row.id, e
                )));
                return;
            }
        };
        match self.catalog.sheets.get(&file) {
            Some(sheet) => {
                let info = BaseSpriteInfo::cut(sheet, rect, &file);
                self.catalog.base_sprites.insert(row.id, info);
            }
            None => self.warnings.push(Warning::new(format!(
                "No sheet loaded for base sprite '{}' (file '{}')",
                row.id, file
            ))),
        }
    }

    fn step_build(&mut self) {
        let end = (self.sprite_idx + self.batch_size).min(self.sprite_rows.len());
        while self.sprite_idx < end {
            let row = self.sprite_rows[self.sprite_idx].clone();
            self.sprite_idx += 1;
            self.items_done += 1;
            match serde_json::from_value::<SpriteRow>(row) {
                Ok(sprite_row) => self.build_sprite_row(&sprite_row),
                Err(e) => self.warnings.push(Warning::new(format!(
                    "Skipping sprite row {}: {}",
                    self.sprite_idx - 1,
                    e
                ))),
            }
        }
        if self.sprite_idx >= self.sprite_rows.len() {
            self.enter(Stage::LinkingSprites);
        }
    }

    fn build_sprite_row(&mut self, row: &SpriteRow) {
        match sprites::build_sprite(row) {
            Ok((mut info, warnings)) => {
                self.warnings.extend(warnings);
                let (img, warnings) = sprites::representative_image(
                    &info,
                    &self.catalog.base_sprites,
                    &self.catalog.sprites,
                );
                self.warnings.extend(warnings);
                info.img = img;
                self.order.push(info.id.clone());
                self.catalog.sprites.insert(info.id.clone(), info);
            }
            Err(e) => self.warnings.push(Warning::new(format!(
                "Skipping sprite '{}': {}",
                row.id, e
            ))),
        }
    }

    fn step_link(&mut self) {
        let warnings = sprites::link_sprites(
            &mut self.catalog.sprites,
            &self.catalog.base_sprites,
            &self.order,
        );
        self.warnings.extend(warnings);
        self.enter(Stage::Complete);
    }
}
