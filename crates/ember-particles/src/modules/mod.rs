//! Independently enable-able behavior modules.
//!
//! Each module is plain data plus evaluation; none of them hold simulation
//! state. The particle system consults them when it allocates a particle and
//! when it estimates bounds.

mod color;
mod emission;
mod rotation;
mod size;
mod texture_sheet;
mod velocity;

pub use color::ColorOverLifetime;
pub use emission::{Burst, Emission};
pub use rotation::{AngularVelocity, RotationOverLifetime};
pub use size::{SizeCurve, SizeOverLifetime};
pub use texture_sheet::{SheetAnimation, TextureSheetAnimation};
pub use velocity::VelocityOverLifetime;

use crate::shape::ShapeModule;
use ember_core::Result;

/// The full module set of one particle system
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParticleModules {
    pub emission: Emission,
    pub shape: ShapeModule,
    pub velocity_over_lifetime: VelocityOverLifetime,
    pub color_over_lifetime: ColorOverLifetime,
    pub size_over_lifetime: SizeOverLifetime,
    pub rotation_over_lifetime: RotationOverLifetime,
    pub texture_sheet_animation: TextureSheetAnimation,
}

impl ParticleModules {
    /// Reject curve modes a module cannot evaluate
    pub fn validate(&self) -> Result<()> {
        if self.texture_sheet_animation.enabled {
            self.texture_sheet_animation.validate()?;
        }
        Ok(())
    }
}
