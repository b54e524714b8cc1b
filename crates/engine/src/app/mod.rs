mod camera;
mod input;
mod loop_runner;
mod math;
mod rendering;
mod scene;
mod tween;

pub use camera::{Camera3D, CAMERA_EYE_OFFSET_DEFAULT, CAMERA_FOV_DEFAULT_RADIANS};
pub use input::{InputEvent, InputQueue, InputSnapshot};
pub use loop_runner::{run_app, AppError, LoopConfig};
pub use math::{Aabb, NavRect, Plane, Ray, Vec2, Vec3};
pub use rendering::{
    projected_half_size_px, vignette_attenuation, Renderer, Viewport, PLACEHOLDER_HALF_SIZE_PX,
};
pub use scene::{
    Entity, EntityId, HudState, MoodBarVisual, PostFx, RaycastHit, RenderableDesc,
    RenderableKind, Scene, SceneQuery, SceneVisualState, SceneWorld,
};
pub use tween::{Ease, Lerp, LoopMode, Tween};
