mod renderer;
mod transform;

pub use renderer::Renderer;
pub use transform::{projected_half_size_px, vignette_attenuation, Viewport};

pub const PLACEHOLDER_HALF_SIZE_PX: i32 = 5;
