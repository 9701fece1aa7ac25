//! Composite sprite resolution
//!
//! Sprite rows reference base sprites and each other by ID, in any table
//! order. Resolution is two-pass: pass 1 builds one typed entry per row
//! and eagerly picks a representative image where its inputs already
//! exist; pass 2 sweeps entries that still lack an image, recomputing
//! until a sweep resolves nothing new, so forward references settle
//! without recursion. References stay ID strings throughout and are
//! dereferenced against the maps at use, which makes the link pass
//! idempotent and safe on dangling IDs.
//!
//! Nothing here is fatal. Missing references come back as [`Warning`]s
//! and the affected entry simply keeps an empty image slot.

use std::collections::{HashMap, HashSet};

use image::{Rgba, RgbaImage};
use rand::seq::IteratorRandom;
use thiserror::Error;

use crate::geometry::{GeometryError, Offset};
use crate::models::{LayerEntry, MaterialEntry, RandomEntry, RotationEntry, SeasonEntry, SpriteRow};
use crate::slicer::BaseSpriteInfo;

/// Season placeholder meaning "no image in this season".
pub const EMPTY_BASE: &str = "empty";

/// A non-fatal problem hit during resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub message: String,
}

impl Warning {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A malformed row. The row is dropped; resolution continues.
#[derive(Debug, Error)]
pub enum SpriteRowError {
    #[error("invalid offset: {0}")]
    Offset(#[from] GeometryError),
}

/// A reference to a sliced base sprite or to another sprite entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpriteRef {
    Base(String),
    Sprite(String),
}

/// One layer of a combine stack.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub base: Option<String>,
    pub sprite: Option<String>,
    pub tint: Option<String>,
    pub offset: Option<Offset>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RotationSource {
    Base(String),
    Combine(Vec<Layer>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rotation {
    pub source: RotationSource,
    pub rotation: Option<String>,
    pub effect: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SeasonSource {
    Base(String),
    Rotations(Vec<Rotation>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Season {
    pub season: Option<String>,
    pub source: SeasonSource,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RandomChoice {
    pub source: SpriteRef,
    pub weight: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MaterialSource {
    Sprite(String),
    Base(String),
    Layers(Vec<Layer>),
    Rotations(Vec<Rotation>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MaterialChoice {
    pub material_type: String,
    pub source: MaterialSource,
}

/// The mutually-exclusive composition rules. When a row carries several
/// rule keys the first in this declaration order wins.
#[derive(Debug, Clone, PartialEq)]
pub enum SpriteRule {
    Rotations(Vec<Rotation>),
    Seasons(Vec<Season>),
    Combine(Vec<Layer>),
    Random(Vec<RandomChoice>),
    ByMaterial(Vec<MaterialChoice>),
    Frames(Vec<String>),
    Base(String),
}

/// One resolved sprite table entry.
#[derive(Debug, Clone)]
pub struct SpriteInfo {
    pub id: String,
    pub rule: SpriteRule,
    pub offset: Option<Offset>,
    pub tint: Option<String>,
    pub anim: bool,
    /// Representative image; stays `None` when nothing resolves
    pub img: Option<RgbaImage>,
    pub filename: Option<String>,
}

pub type BaseMap = HashMap<String, BaseSpriteInfo>;
pub type SpriteMap = HashMap<String, SpriteInfo>;

fn parse_offset(text: Option<&str>) -> Result<Option<Offset>, SpriteRowError> {
    match text {
        Some(t) => Ok(Some(Offset::parse(t)?)),
        None => Ok(None),
    }
}

fn build_layers(entries: &[LayerEntry]) -> Result<Vec<Layer>, SpriteRowError> {
    entries
        .iter()
        .map(|e| {
            Ok(Layer {
                base: e.base_sprite.clone(),
                sprite: e.sprite.clone(),
                tint: e.tint.clone(),
                offset: parse_offset(e.offset.as_deref())?,
            })
        })
        .collect()
}

fn build_rotations(parent: &str, entries: &[RotationEntry]) -> Result<Vec<Rotation>, SpriteRowError> {
    entries
        .iter()
        .map(|e| {
            let source = if let Some(base) = &e.base_sprite {
                RotationSource::Base(base.clone())
            } else if let Some(layers) = &e.combine {
                RotationSource::Combine(build_layers(layers)?)
            } else {
                // No explicit source reuses the parent row's own ID
                RotationSource::Base(parent.to_string())
            };
            Ok(Rotation {
                source,
                rotation: e.rotation.clone(),
                effect: e.effect.clone(),
            })
        })
        .collect()
}

fn build_seasons(
    parent: &str,
    entries: &[SeasonEntry],
    warnings: &mut Vec<Warning>,
) -> Result<Vec<Season>, SpriteRowError> {
    let mut seasons = Vec::new();
    for e in entries {
        let source = if let Some(base) = &e.base_sprite {
            SeasonSource::Base(base.clone())
        } else if let Some(rots) = &e.rotations {
            SeasonSource::Rotations(build_rotations(parent, rots)?)
        } else {
            warnings.push(Warning::new(format!(
                "Season entry of sprite '{parent}' names neither a base sprite nor rotations"
            )));
            continue;
        };
        seasons.push(Season {
            season: e.season.clone(),
            source,
        });
    }
    Ok(seasons)
}

fn build_random(parent: &str, entries: &[RandomEntry], warnings: &mut Vec<Warning>) -> Vec<RandomChoice> {
    let mut choices = Vec::new();
    for e in entries {
        let source = if let Some(base) = &e.base_sprite {
            SpriteRef::Base(base.clone())
        } else if let Some(sprite) = &e.sprite {
            SpriteRef::Sprite(sprite.clone())
        } else {
            warnings.push(Warning::new(format!(
                "Random entry of sprite '{parent}' names neither a base sprite nor a sprite"
            )));
            continue;
        };
        choices.push(RandomChoice {
            source,
            weight: e.weight.unwrap_or(1),
        });
    }
    choices
}

fn build_materials(
    parent: &str,
    entries: &[MaterialEntry],
    warnings: &mut Vec<Warning>,
) -> Result<Vec<MaterialChoice>, SpriteRowError> {
    let mut choices = Vec::new();
    for e in entries {
        let source = if let Some(sprite) = &e.sprite {
            MaterialSource::Sprite(sprite.clone())
        } else if let Some(base) = &e.base_sprite {
            MaterialSource::Base(base.clone())
        } else if let Some(layers) = &e.sprites {
            MaterialSource::Layers(build_layers(layers)?)
        } else if let Some(rots) = &e.rotations {
            MaterialSource::Rotations(build_rotations(parent, rots)?)
        } else {
            warnings.push(Warning::new(format!(
                "Material entry of sprite '{parent}' names no source"
            )));
            continue;
        };
        choices.push(MaterialChoice {
            material_type: e.material_type.clone().unwrap_or_default(),
            source,
        });
    }
    Ok(choices)
}

/// Build the typed entry for one row, without an image yet.
///
/// Fails only on a malformed offset string, which drops the whole row.
/// Gaps inside individual rule entries drop just that entry, with a
/// warning.
pub fn build_sprite(row: &SpriteRow) -> Result<(SpriteInfo, Vec<Warning>), SpriteRowError> {
    let mut warnings = Vec::new();
    let rule = if let Some(rots) = &row.rotations {
        SpriteRule::Rotations(build_rotations(&row.id, rots)?)
    } else if let Some(seasons) = &row.seasons {
        SpriteRule::Seasons(build_seasons(&row.id, seasons, &mut warnings)?)
    } else if let Some(layers) = &row.combine {
        SpriteRule::Combine(build_layers(layers)?)
    } else if let Some(random) = &row.random {
        SpriteRule::Random(build_random(&row.id, random, &mut warnings))
    } else if let Some(materials) = &row.by_material_types {
        SpriteRule::ByMaterial(build_materials(&row.id, materials, &mut warnings)?)
    } else if let Some(frames) = &row.frames {
        SpriteRule::Frames(frames.clone())
    } else {
        SpriteRule::Base(row.base_sprite.clone().unwrap_or_else(|| row.id.clone()))
    };
    let info = SpriteInfo {
        id: row.id.clone(),
        rule,
        offset: parse_offset(row.offset.as_deref())?,
        tint: row.tint.clone(),
        anim: row.anim.unwrap_or(false),
        img: None,
        filename: row.filename.clone(),
    };
    Ok((info, warnings))
}

fn collect_layer_refs<'a>(layers: &'a [Layer], out: &mut Vec<&'a str>) {
    for layer in layers {
        if let Some(id) = &layer.sprite {
            out.push(id);
        }
    }
}

fn collect_rotation_refs<'a>(rots: &'a [Rotation], out: &mut Vec<&'a str>) {
    for rot in rots {
        if let RotationSource::Combine(layers) = &rot.source {
            collect_layer_refs(layers, out);
        }
    }
}

/// Every sprite ID the rule references, in declaration order.
pub fn sprite_refs(rule: &SpriteRule) -> Vec<&str> {
    let mut out = Vec::new();
    match rule {
        SpriteRule::Rotations(rots) => collect_rotation_refs(rots, &mut out),
        SpriteRule::Seasons(seasons) => {
            for season in seasons {
                if let SeasonSource::Rotations(rots) = &season.source {
                    collect_rotation_refs(rots, &mut out);
                }
            }
        }
        SpriteRule::Combine(layers) => collect_layer_refs(layers, &mut out),
        SpriteRule::Random(choices) => {
            for choice in choices {
                if let SpriteRef::Sprite(id) = &choice.source {
                    out.push(id);
                }
            }
        }
        SpriteRule::ByMaterial(choices) => {
            for choice in choices {
                match &choice.source {
                    MaterialSource::Sprite(id) => out.push(id),
                    MaterialSource::Layers(layers) => collect_layer_refs(layers, &mut out),
                    MaterialSource::Rotations(rots) => collect_rotation_refs(rots, &mut out),
                    MaterialSource::Base(_) => {}
                }
            }
        }
        SpriteRule::Frames(_) | SpriteRule::Base(_) => {}
    }
    out
}

/// Sprite references of the rule that have no image yet.
pub fn unresolved_refs(rule: &SpriteRule, sprites: &SpriteMap) -> Vec<String> {
    sprite_refs(rule)
        .into_iter()
        .filter(|id| !sprites.get(*id).is_some_and(|s| s.img.is_some()))
        .map(str::to_string)
        .collect()
}

fn alpha_blend(dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
    let sa = src[3] as f32 / 255.0;
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a == 0.0 {
        return Rgba([0, 0, 0, 0]);
    }
    let blend = |s: u8, d: u8| -> u8 {
        let s = s as f32 / 255.0;
        let d = d as f32 / 255.0;
        (((s * sa + d * da * (1.0 - sa)) / out_a) * 255.0).round() as u8
    };
    Rgba([
        blend(src[0], dst[0]),
        blend(src[1], dst[1]),
        blend(src[2], dst[2]),
        (out_a * 255.0).round() as u8,
    ])
}

/// Draw `src` onto the canvas at a signed offset, clipping at the edges.
/// Later draws composite over earlier ones via the source's own alpha.
fn blit(canvas: &mut RgbaImage, src: &RgbaImage, offset: Offset) {
    let (cw, ch) = canvas.dimensions();
    for (sx, sy, pixel) in src.enumerate_pixels() {
        if pixel[3] == 0 {
            continue;
        }
        let dx = offset.x as i64 + sx as i64;
        let dy = offset.y as i64 + sy as i64;
        if dx < 0 || dy < 0 || dx >= cw as i64 || dy >= ch as i64 {
            continue;
        }
        let (dx, dy) = (dx as u32, dy as u32);
        if pixel[3] == 255 {
            canvas.put_pixel(dx, dy, *pixel);
        } else {
            let dst = *canvas.get_pixel(dx, dy);
            canvas.put_pixel(dx, dy, alpha_blend(dst, *pixel));
        }
    }
}

struct ResolvedLayer<'a> {
    img: &'a RgbaImage,
    offset: Offset,
}

fn resolve_layer<'a>(
    parent: &str,
    layer: &Layer,
    bases: &'a BaseMap,
    sprites: &'a SpriteMap,
    warnings: &mut Vec<Warning>,
) -> Option<ResolvedLayer<'a>> {
    if let Some(base) = &layer.base {
        return match bases.get(base) {
            Some(info) => Some(ResolvedLayer {
                img: &info.img,
                offset: layer.offset.unwrap_or(Offset::ZERO),
            }),
            None => {
                warnings.push(Warning::new(format!(
                    "Base sprite '{base}' not found for sprite '{parent}'"
                )));
                None
            }
        };
    }
    if let Some(id) = &layer.sprite {
        // Unresolved sprite layers are expected mid-load; the link pass
        // retries and reports what never settles.
        let info = sprites.get(id)?;
        let img = info.img.as_ref()?;
        let offset = layer.offset.or(info.offset).unwrap_or(Offset::ZERO);
        return Some(ResolvedLayer { img, offset });
    }
    warnings.push(Warning::new(format!(
        "Layer of sprite '{parent}' references nothing"
    )));
    None
}

fn composite_layers(
    parent: &str,
    layers: &[Layer],
    bases: &BaseMap,
    sprites: &SpriteMap,
    warnings: &mut Vec<Warning>,
) -> Option<RgbaImage> {
    let mut resolved = Vec::new();
    for layer in layers {
        if let Some(r) = resolve_layer(parent, layer, bases, sprites, warnings) {
            resolved.push(r);
        }
    }
    if resolved.is_empty() {
        return None;
    }
    let mut w = 0i64;
    let mut h = 0i64;
    for layer in &resolved {
        w = w.max(layer.img.width() as i64 + layer.offset.x as i64);
        h = h.max(layer.img.height() as i64 + layer.offset.y as i64);
    }
    if w <= 0 || h <= 0 {
        return None;
    }
    let mut canvas = RgbaImage::new(w as u32, h as u32);
    for layer in &resolved {
        blit(&mut canvas, layer.img, layer.offset);
    }
    Some(canvas)
}

fn base_image(parent: &str, id: &str, bases: &BaseMap, warnings: &mut Vec<Warning>) -> Option<RgbaImage> {
    match bases.get(id) {
        Some(info) => Some(info.img.clone()),
        None => {
            warnings.push(Warning::new(format!(
                "Base sprite '{id}' not found for sprite '{parent}'"
            )));
            None
        }
    }
}

fn rotation_image(
    parent: &str,
    rot: &Rotation,
    bases: &BaseMap,
    sprites: &SpriteMap,
    warnings: &mut Vec<Warning>,
) -> Option<RgbaImage> {
    match &rot.source {
        RotationSource::Base(id) => base_image(parent, id, bases, warnings),
        RotationSource::Combine(layers) => composite_layers(parent, layers, bases, sprites, warnings),
    }
}

fn ref_image(
    parent: &str,
    source: &SpriteRef,
    bases: &BaseMap,
    sprites: &SpriteMap,
    warnings: &mut Vec<Warning>,
) -> Option<RgbaImage> {
    match source {
        SpriteRef::Base(id) => base_image(parent, id, bases, warnings),
        SpriteRef::Sprite(id) => sprites.get(id).and_then(|s| s.img.clone()),
    }
}

/// Pick the display image for one entry from the current state of the
/// maps.
///
/// Deterministic except for `Random`, which draws uniformly among its
/// already-resolved choices. `None` means nothing resolved this time;
/// callers may retry once more references exist.
pub fn representative_image(
    info: &SpriteInfo,
    bases: &BaseMap,
    sprites: &SpriteMap,
) -> (Option<RgbaImage>, Vec<Warning>) {
    let mut warnings = Vec::new();
    let parent = info.id.as_str();
    let img = match &info.rule {
        SpriteRule::Base(id) => base_image(parent, id, bases, &mut warnings),
        SpriteRule::Rotations(rots) => rots
            .first()
            .and_then(|r| rotation_image(parent, r, bases, sprites, &mut warnings)),
        SpriteRule::Seasons(seasons) => seasons
            .iter()
            .find(|s| !matches!(&s.source, SeasonSource::Base(b) if b == EMPTY_BASE))
            .and_then(|s| match &s.source {
                SeasonSource::Base(id) => base_image(parent, id, bases, &mut warnings),
                SeasonSource::Rotations(rots) => rots
                    .first()
                    .and_then(|r| rotation_image(parent, r, bases, sprites, &mut warnings)),
            }),
        SpriteRule::Combine(layers) => {
            composite_layers(parent, layers, bases, sprites, &mut warnings)
        }
        SpriteRule::Random(choices) => choices
            .iter()
            .filter_map(|c| ref_image(parent, &c.source, bases, sprites, &mut warnings))
            .choose(&mut rand::thread_rng()),
        SpriteRule::ByMaterial(choices) => choices.first().and_then(|c| match &c.source {
            MaterialSource::Sprite(id) => sprites.get(id).and_then(|s| s.img.clone()),
            MaterialSource::Base(id) => base_image(parent, id, bases, &mut warnings),
            MaterialSource::Layers(layers) => {
                composite_layers(parent, layers, bases, sprites, &mut warnings)
            }
            MaterialSource::Rotations(rots) => rots
                .first()
                .and_then(|r| rotation_image(parent, r, bases, sprites, &mut warnings)),
        }),
        SpriteRule::Frames(frames) => frames
            .first()
            .and_then(|id| base_image(parent, id, bases, &mut warnings)),
    };
    (img, warnings)
}

pub(crate) fn dedup(warnings: Vec<Warning>) -> Vec<Warning> {
    let mut seen = HashSet::new();
    warnings
        .into_iter()
        .filter(|w| seen.insert(w.message.clone()))
        .collect()
}

/// The link pass: recompute images for entries that still lack one,
/// sweeping `order` (table order) until a sweep resolves nothing new.
///
/// Terminates on dangling references by construction: a sweep without
/// progress ends the loop, and whatever still points at nothing is
/// reported once.
pub fn link_sprites(sprites: &mut SpriteMap, bases: &BaseMap, order: &[String]) -> Vec<Warning> {
    let mut warnings = Vec::new();
    loop {
        let mut progress = false;
        for id in order {
            let computed = match sprites.get(id) {
                Some(info) if info.img.is_none() => {
                    let (img, w) = representative_image(info, bases, sprites);
                    warnings.extend(w);
                    img
                }
                _ => continue,
            };
            if let Some(img) = computed {
                if let Some(info) = sprites.get_mut(id) {
                    info.img = Some(img);
                    progress = true;
                }
            }
        }
        if !progress {
            break;
        }
    }
    for id in order {
        let Some(info) = sprites.get(id) else { continue };
        for missing in unresolved_refs(&info.rule, sprites) {
            warnings.push(Warning::new(format!(
                "Sprite '{missing}' referenced by '{id}' never resolved"
            )));
        }
    }
    dedup(warnings)
}

/// Build and link a whole table of rows against a base-sprite map.
pub fn resolve_sprites(rows: &[SpriteRow], bases: &BaseMap) -> (SpriteMap, Vec<Warning>) {
    let mut sprites = SpriteMap::new();
    let mut order = Vec::with_capacity(rows.len());
    let mut warnings = Vec::new();
    for row in rows {
        match build_sprite(row) {
            Ok((mut info, w)) => {
                warnings.extend(w);
                let (img, w) = representative_image(&info, bases, &sprites);
                warnings.extend(w);
                info.img = img;
                order.push(info.id.clone());
                sprites.insert(info.id.clone(), info);
            }
            Err(e) => {
                warnings.push(Warning::new(format!("Skipping sprite '{}': {}", row.id, e)));
            }
        }
    }
    warnings.extend(link_sprites(&mut sprites, bases, &order));
    (sprites, dedup(warnings))
}
