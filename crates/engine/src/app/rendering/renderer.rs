use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::ImageReader;
use pixels::{Error, Pixels, SurfaceTexture};
use tracing::warn;
use winit::window::Window;

use crate::app::{Camera3D, Entity, MoodBarVisual, RenderableKind, SceneWorld, Vec2};
use crate::asset_keys::validate_asset_key;

use super::transform::{projected_half_size_px, vignette_attenuation};
use super::{Viewport, PLACEHOLDER_HALF_SIZE_PX};

const CLEAR_COLOR: [u8; 4] = [18, 16, 22, 255];
const FLOOR_EDGE_COLOR: [u8; 4] = [92, 84, 70, 255];
const HOVER_HIGHLIGHT_COLOR: [u8; 4] = [255, 210, 70, 255];
const HOVER_HIGHLIGHT_PADDING_PX: i32 = 3;
const MOOD_BAR_MARGIN_PX: i32 = 16;
const MOOD_BAR_WIDTH_PX: i32 = 220;
const MOOD_BAR_HEIGHT_PX: i32 = 14;
const MOOD_BAR_BACKGROUND_COLOR: [u8; 4] = [40, 38, 44, 255];
const MOOD_BAR_FRAME_COLOR: [u8; 4] = [200, 196, 188, 255];

struct LoadedSprite {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

#[derive(Debug, Clone, Copy)]
struct ScreenQuad {
    points: [Vec2; 4],
}

pub struct Renderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    viewport: Viewport,
    asset_root: PathBuf,
    sprite_cache: HashMap<String, Option<LoadedSprite>>,
    warned_missing_sprite_keys: HashSet<String>,
    draw_order: Vec<usize>,
}

impl Renderer {
    pub fn new(window: Arc<Window>, asset_root: PathBuf) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(Arc::clone(&window), size.width, size.height)?;
        Ok(Self {
            window,
            pixels,
            viewport: Viewport {
                width: size.width,
                height: size.height,
            },
            asset_root,
            sprite_cache: HashMap::new(),
            warned_missing_sprite_keys: HashSet::new(),
            draw_order: Vec::new(),
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(Arc::clone(&self.window), width, height)?;
        self.viewport = Viewport { width, height };
        Ok(())
    }

    fn build_pixels(
        window: Arc<Window>,
        width: u32,
        height: u32,
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(width, height, window);
        Pixels::new(width, height, surface)
    }

    pub(crate) fn render_world(&mut self, world: &SceneWorld) -> Result<(), Error> {
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Ok(());
        }

        let viewport = self.viewport;
        let asset_root = self.asset_root.as_path();
        let sprite_cache = &mut self.sprite_cache;
        let warned_missing_sprite_keys = &mut self.warned_missing_sprite_keys;
        let draw_order = &mut self.draw_order;
        let frame = self.pixels.frame_mut();
        for chunk in frame.chunks_exact_mut(4) {
            chunk.copy_from_slice(&CLEAR_COLOR);
        }

        let camera = world.camera();
        collect_draw_order(world, camera, draw_order);
        let hovered = world.visual_state().hovered_entity;

        for &index in draw_order.iter() {
            let entity = &world.entities()[index];
            match &entity.renderable.kind {
                RenderableKind::Floor { width, depth } => {
                    if let Some(quad) = project_floor(camera, viewport, entity, *width, *depth) {
                        fill_convex_quad(frame, viewport, &quad, entity.renderable.tint);
                        outline_quad(frame, viewport, &quad, FLOOR_EDGE_COLOR);
                    }
                }
                RenderableKind::Placeholder => {
                    if let Some((cx, cy, half)) = entity_screen_box(camera, viewport, entity) {
                        draw_square(frame, viewport, cx, cy, half, entity.renderable.tint);
                    }
                }
                RenderableKind::Sprite(key) => {
                    let Some((cx, cy, half)) = entity_screen_box(camera, viewport, entity) else {
                        continue;
                    };
                    match resolve_cached_sprite(
                        sprite_cache,
                        warned_missing_sprite_keys,
                        asset_root,
                        key,
                    ) {
                        Some(sprite) => {
                            let scale = (half * 2) as f32 / sprite.width.max(sprite.height) as f32;
                            draw_sprite_centered_scaled(frame, viewport, cx, cy, sprite, scale);
                        }
                        None => draw_square(frame, viewport, cx, cy, half, entity.renderable.tint),
                    }
                }
            }

            if hovered == Some(entity.id) {
                if let Some((cx, cy, half)) = entity_screen_box(camera, viewport, entity) {
                    draw_square_outline(
                        frame,
                        viewport,
                        cx,
                        cy,
                        half + HOVER_HIGHLIGHT_PADDING_PX,
                        HOVER_HIGHLIGHT_COLOR,
                    );
                }
            }
        }

        apply_vignette(frame, viewport, world.post_fx().vignette_intensity);
        if let Some(mood_bar) = world.hud().mood_bar {
            draw_mood_bar(frame, viewport, mood_bar);
        }

        self.pixels.render()
    }
}

fn collect_draw_order(world: &SceneWorld, camera: &Camera3D, out: &mut Vec<usize>) {
    out.clear();
    out.extend(
        world
            .entities()
            .iter()
            .enumerate()
            .filter(|(_, entity)| entity.active && entity.visible)
            .map(|(index, _)| index),
    );
    // Floors first, then far to near.
    out.sort_by(|a, b| {
        let ea = &world.entities()[*a];
        let eb = &world.entities()[*b];
        let floor_a = matches!(ea.renderable.kind, RenderableKind::Floor { .. });
        let floor_b = matches!(eb.renderable.kind, RenderableKind::Floor { .. });
        floor_b.cmp(&floor_a).then_with(|| {
            camera
                .view_depth(eb.position)
                .total_cmp(&camera.view_depth(ea.position))
        })
    });
}

fn entity_screen_box(
    camera: &Camera3D,
    viewport: Viewport,
    entity: &Entity,
) -> Option<(i32, i32, i32)> {
    let screen = camera.world_to_screen(entity.position, viewport.size())?;
    let half = match entity.collider {
        Some(half_extents) => projected_half_size_px(
            camera,
            viewport,
            entity.position,
            half_extents.x.max(half_extents.z),
        ),
        None => PLACEHOLDER_HALF_SIZE_PX,
    };
    Some((screen.x.round() as i32, screen.y.round() as i32, half))
}

fn project_floor(
    camera: &Camera3D,
    viewport: Viewport,
    entity: &Entity,
    width: f32,
    depth: f32,
) -> Option<ScreenQuad> {
    let rect = crate::app::NavRect::from_center_size(entity.position, width, depth);
    let corners = rect.corners(entity.position.y);
    let mut points = [Vec2::default(); 4];
    for (slot, corner) in points.iter_mut().zip(corners) {
        *slot = camera.world_to_screen(corner, viewport.size())?;
    }
    Some(ScreenQuad { points })
}

fn fill_convex_quad(frame: &mut [u8], viewport: Viewport, quad: &ScreenQuad, color: [u8; 4]) {
    let min_y = quad
        .points
        .iter()
        .map(|p| p.y)
        .fold(f32::INFINITY, f32::min)
        .max(0.0)
        .floor() as i32;
    let max_y = quad
        .points
        .iter()
        .map(|p| p.y)
        .fold(f32::NEG_INFINITY, f32::max)
        .min(viewport.height as f32 - 1.0)
        .ceil() as i32;

    for y in min_y..=max_y {
        let scan_y = y as f32 + 0.5;
        let mut left = f32::INFINITY;
        let mut right = f32::NEG_INFINITY;
        for i in 0..4 {
            let a = quad.points[i];
            let b = quad.points[(i + 1) % 4];
            if (a.y <= scan_y && b.y > scan_y) || (b.y <= scan_y && a.y > scan_y) {
                let t = (scan_y - a.y) / (b.y - a.y);
                let x = a.x + (b.x - a.x) * t;
                left = left.min(x);
                right = right.max(x);
            }
        }
        if left > right {
            continue;
        }
        for x in (left.round() as i32)..=(right.round() as i32) {
            write_pixel_rgba_clipped(frame, viewport, x, y, color);
        }
    }
}

fn outline_quad(frame: &mut [u8], viewport: Viewport, quad: &ScreenQuad, color: [u8; 4]) {
    for i in 0..4 {
        let a = quad.points[i];
        let b = quad.points[(i + 1) % 4];
        draw_line(frame, viewport, a, b, color);
    }
}

fn draw_line(frame: &mut [u8], viewport: Viewport, a: Vec2, b: Vec2, color: [u8; 4]) {
    let (mut x0, mut y0) = (a.x.round() as i32, a.y.round() as i32);
    let (x1, y1) = (b.x.round() as i32, b.y.round() as i32);
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    loop {
        write_pixel_rgba_clipped(frame, viewport, x0, y0, color);
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

fn apply_vignette(frame: &mut [u8], viewport: Viewport, intensity: f32) {
    if intensity.is_nan() || intensity <= 0.0 {
        return;
    }
    let width = viewport.width as usize;
    for (index, pixel) in frame.chunks_exact_mut(4).enumerate() {
        let x = (index % width) as u32;
        let y = (index / width) as u32;
        let factor = vignette_attenuation(x, y, viewport, intensity);
        for channel in &mut pixel[..3] {
            *channel = (*channel as f32 * factor).round() as u8;
        }
    }
}

fn draw_mood_bar(frame: &mut [u8], viewport: Viewport, mood_bar: MoodBarVisual) {
    let left = MOOD_BAR_MARGIN_PX;
    let bottom = viewport.height as i32 - MOOD_BAR_MARGIN_PX;
    let top = bottom - MOOD_BAR_HEIGHT_PX;
    let fill = if mood_bar.fill.is_finite() {
        mood_bar.fill.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let fill_right = left + (MOOD_BAR_WIDTH_PX as f32 * fill).round() as i32;

    for y in top..bottom {
        for x in left..left + MOOD_BAR_WIDTH_PX {
            let color = if x < fill_right {
                mood_bar.color
            } else {
                MOOD_BAR_BACKGROUND_COLOR
            };
            write_pixel_rgba_clipped(frame, viewport, x, y, color);
        }
    }
    for x in left - 1..=left + MOOD_BAR_WIDTH_PX {
        write_pixel_rgba_clipped(frame, viewport, x, top - 1, MOOD_BAR_FRAME_COLOR);
        write_pixel_rgba_clipped(frame, viewport, x, bottom, MOOD_BAR_FRAME_COLOR);
    }
    for y in top - 1..=bottom {
        write_pixel_rgba_clipped(frame, viewport, left - 1, y, MOOD_BAR_FRAME_COLOR);
        write_pixel_rgba_clipped(frame, viewport, left + MOOD_BAR_WIDTH_PX, y, MOOD_BAR_FRAME_COLOR);
    }
}

fn resolve_cached_sprite<'a>(
    cache: &'a mut HashMap<String, Option<LoadedSprite>>,
    warned_missing_sprite_keys: &mut HashSet<String>,
    asset_root: &Path,
    key: &str,
) -> Option<&'a LoadedSprite> {
    if !cache.contains_key(key) {
        let sprite = match resolve_sprite_image_path(asset_root, key) {
            Ok(path) => match load_sprite_rgba(&path) {
                Ok(sprite) => Some(sprite),
                Err(reason) => {
                    warn_sprite_load_once(
                        warned_missing_sprite_keys,
                        key,
                        Some(path.as_path()),
                        reason.as_str(),
                    );
                    None
                }
            },
            Err(reason) => {
                warn_sprite_load_once(warned_missing_sprite_keys, key, None, reason.as_str());
                None
            }
        };
        cache.insert(key.to_string(), sprite);
    }
    cache.get(key).and_then(Option::as_ref)
}

fn resolve_sprite_image_path(asset_root: &Path, key: &str) -> Result<PathBuf, String> {
    validate_asset_key(key).map_err(|error| format!("invalid_key:{error}"))?;
    Ok(asset_root
        .join("base")
        .join("sprites")
        .join(format!("{key}.png")))
}

fn load_sprite_rgba(path: &Path) -> Result<LoadedSprite, String> {
    let reader = ImageReader::open(path).map_err(|error| format!("file_open_failed:{error}"))?;
    let decoded = reader
        .decode()
        .map_err(|error| format!("decode_failed:{error}"))?;
    let image = decoded.to_rgba8();
    Ok(LoadedSprite {
        width: image.width(),
        height: image.height(),
        rgba: image.into_raw(),
    })
}

fn warn_sprite_load_once(
    warned_keys: &mut HashSet<String>,
    key: &str,
    resolved_path: Option<&Path>,
    reason: &str,
) {
    if !warned_keys.insert(key.to_string()) {
        return;
    }
    let path_display = resolved_path
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "<unresolved>".to_string());
    warn!(
        sprite_key = key,
        path = %path_display,
        reason = reason,
        "renderer_sprite_load_failed_using_placeholder"
    );
}

fn write_pixel_rgba_clipped(frame: &mut [u8], viewport: Viewport, x: i32, y: i32, color: [u8; 4]) {
    if x < 0 || y < 0 || x >= viewport.width as i32 || y >= viewport.height as i32 {
        return;
    }
    let offset = (y as usize * viewport.width as usize + x as usize) * 4;
    if let Some(pixel) = frame.get_mut(offset..offset + 4) {
        pixel.copy_from_slice(&color);
    }
}

fn draw_square(
    frame: &mut [u8],
    viewport: Viewport,
    cx: i32,
    cy: i32,
    half_size: i32,
    color: [u8; 4],
) {
    for y in (cy - half_size)..=(cy + half_size) {
        for x in (cx - half_size)..=(cx + half_size) {
            write_pixel_rgba_clipped(frame, viewport, x, y, color);
        }
    }
}

fn draw_square_outline(
    frame: &mut [u8],
    viewport: Viewport,
    cx: i32,
    cy: i32,
    half_size: i32,
    color: [u8; 4],
) {
    let left = cx - half_size;
    let right = cx + half_size;
    let top = cy - half_size;
    let bottom = cy + half_size;

    for x in left..=right {
        write_pixel_rgba_clipped(frame, viewport, x, top, color);
        write_pixel_rgba_clipped(frame, viewport, x, bottom, color);
    }
    for y in top..=bottom {
        write_pixel_rgba_clipped(frame, viewport, left, y, color);
        write_pixel_rgba_clipped(frame, viewport, right, y, color);
    }
}

fn draw_sprite_centered_scaled(
    frame: &mut [u8],
    viewport: Viewport,
    center_x: i32,
    center_y: i32,
    sprite: &LoadedSprite,
    scale: f32,
) {
    if sprite.width == 0 || sprite.height == 0 {
        return;
    }
    if sprite.rgba.len() < sprite.width as usize * sprite.height as usize * 4 {
        return;
    }
    let scale = if scale.is_finite() && scale > 0.0 {
        scale
    } else {
        1.0
    };
    let inv_scale = scale.recip();
    let scaled_w = (sprite.width as f32 * scale).round().max(1.0) as i32;
    let scaled_h = (sprite.height as f32 * scale).round().max(1.0) as i32;
    let left = center_x - scaled_w / 2;
    let top = center_y - scaled_h / 2;

    for dy in 0..scaled_h {
        let src_y = ((dy as f32 * inv_scale).floor() as u32).min(sprite.height - 1) as usize;
        for dx in 0..scaled_w {
            let src_x = ((dx as f32 * inv_scale).floor() as u32).min(sprite.width - 1) as usize;
            let src = (src_y * sprite.width as usize + src_x) * 4;
            let alpha = sprite.rgba[src + 3];
            if alpha == 0 {
                continue;
            }
            let color = [
                sprite.rgba[src],
                sprite.rgba[src + 1],
                sprite.rgba[src + 2],
                alpha,
            ];
            write_pixel_rgba_clipped(frame, viewport, left + dx, top + dy, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{RenderableDesc, Vec3};

    const VIEWPORT: Viewport = Viewport {
        width: 64,
        height: 32,
    };

    fn blank_frame() -> Vec<u8> {
        vec![0; VIEWPORT.width as usize * VIEWPORT.height as usize * 4]
    }

    fn pixel(frame: &[u8], x: usize, y: usize) -> [u8; 4] {
        let offset = (y * VIEWPORT.width as usize + x) * 4;
        [
            frame[offset],
            frame[offset + 1],
            frame[offset + 2],
            frame[offset + 3],
        ]
    }

    #[test]
    fn clipped_writes_ignore_out_of_bounds() {
        let mut frame = blank_frame();
        write_pixel_rgba_clipped(&mut frame, VIEWPORT, -1, 0, [255; 4]);
        write_pixel_rgba_clipped(&mut frame, VIEWPORT, 64, 0, [255; 4]);
        write_pixel_rgba_clipped(&mut frame, VIEWPORT, 0, 32, [255; 4]);
        assert!(frame.iter().all(|byte| *byte == 0));
    }

    #[test]
    fn convex_quad_fill_covers_interior() {
        let mut frame = blank_frame();
        let quad = ScreenQuad {
            points: [
                Vec2 { x: 10.0, y: 5.0 },
                Vec2 { x: 30.0, y: 5.0 },
                Vec2 { x: 30.0, y: 20.0 },
                Vec2 { x: 10.0, y: 20.0 },
            ],
        };
        fill_convex_quad(&mut frame, VIEWPORT, &quad, [9, 8, 7, 255]);
        assert_eq!(pixel(&frame, 20, 12), [9, 8, 7, 255]);
        assert_eq!(pixel(&frame, 40, 12), [0, 0, 0, 0]);
    }

    #[test]
    fn mood_bar_fill_is_proportional() {
        let viewport = Viewport {
            width: 300,
            height: 60,
        };
        let mut frame = vec![0; 300 * 60 * 4];
        draw_mood_bar(
            &mut frame,
            viewport,
            MoodBarVisual {
                color: [10, 200, 10, 255],
                fill: 0.5,
            },
        );
        let row = 60 - MOOD_BAR_MARGIN_PX - 2;
        let at = |x: i32| {
            let offset = (row as usize * 300 + x as usize) * 4;
            [frame[offset], frame[offset + 1], frame[offset + 2]]
        };
        assert_eq!(at(MOOD_BAR_MARGIN_PX + 10), [10, 200, 10]);
        assert_eq!(
            at(MOOD_BAR_MARGIN_PX + MOOD_BAR_WIDTH_PX - 10),
            [40, 38, 44]
        );
    }

    #[test]
    fn draw_order_skips_inactive_and_puts_floors_first() {
        let mut world = SceneWorld::default();
        let prop = world.spawn(
            Vec3::new(0.0, 0.5, 0.0),
            RenderableDesc::placeholder("prop", [1, 2, 3, 255]),
        );
        let floor = world.spawn(
            Vec3::ZERO,
            RenderableDesc {
                kind: RenderableKind::Floor {
                    width: 4.0,
                    depth: 4.0,
                },
                tint: [4, 5, 6, 255],
                debug_name: "floor".to_string(),
            },
        );
        let hidden = world.spawn(Vec3::ZERO, RenderableDesc::placeholder("hidden", [0; 4]));
        world.apply_pending();
        world.set_entity_active(hidden, false);

        let mut order = Vec::new();
        collect_draw_order(&world, world.camera(), &mut order);
        let ids = order
            .iter()
            .map(|index| world.entities()[*index].id)
            .collect::<Vec<_>>();
        assert_eq!(ids, vec![floor, prop]);
    }
}
