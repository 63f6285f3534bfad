//! Drawing geometry into a render target.

use crate::error::GraphicsError;
use crate::framebuffer::RenderTarget;
use crate::geometry::BoundGeometry;
use crate::program::{Program, Uniforms};

/// Draw `geometry` with `program` into `target`.
///
/// Binding state is device-global, so the target, viewport, program,
/// uniforms and attribute bindings are all re-asserted before the draw.
///
/// # Errors
///
/// [`GraphicsError::InvalidState`] for an incomplete target or a disposed
/// resource, [`GraphicsError::InvalidArgument`] for uniform values that do
/// not fit the program.
pub fn render_geometry<T: RenderTarget + ?Sized>(
    target: &T,
    program: &Program,
    uniforms: &Uniforms<'_>,
    geometry: &BoundGeometry,
) -> Result<(), GraphicsError> {
    let range = geometry.draw_range()?;
    target.bind()?;
    program.set_uniforms(uniforms)?;
    geometry.bind(program)?;
    target.device().backend().draw(geometry.topology(), range);
    Ok(())
}
