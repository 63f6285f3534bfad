//! Geometry uploaded to device buffers.

use std::sync::Arc;

use lumen_core::mesh::{Geometry, PrimitiveTopology};

use crate::backend::DrawRange;
use crate::device::GraphicsDevice;
use crate::error::GraphicsError;
use crate::program::Program;
use crate::resources::{AttributeBinding, Buffer, Disposable};
use crate::types::{BufferTarget, BufferUsageHint, ComponentType};

/// One attribute stream of a [`BoundGeometry`].
#[derive(Debug)]
struct AttributeStream {
    name: String,
    buffer: Buffer,
    components: u32,
}

/// A [`Geometry`] whose attributes and indices live in device buffers.
///
/// # Example
///
/// ```
/// use lumen_graphics::mesh::generators;
/// use lumen_graphics::{BoundGeometry, BufferUsageHint, Disposable, GraphicsDevice};
///
/// let device = GraphicsDevice::dummy();
/// let mut quad = BoundGeometry::upload(
///     &device,
///     &generators::pass_geometry(),
///     BufferUsageHint::StaticDraw,
/// )?;
/// assert_eq!(quad.element_count(), 6);
/// quad.dispose();
/// # Ok::<(), lumen_graphics::GraphicsError>(())
/// ```
pub struct BoundGeometry {
    device: Arc<GraphicsDevice>,
    streams: Vec<AttributeStream>,
    indices: Option<Buffer>,
    topology: PrimitiveTopology,
    vertex_count: u32,
    element_count: u32,
    disposed: bool,
    label: Option<String>,
}

impl BoundGeometry {
    /// Validate `geometry` and upload every attribute and the index list.
    ///
    /// # Errors
    ///
    /// [`GraphicsError::Geometry`] for inconsistent geometry,
    /// [`GraphicsError::InvalidArgument`] for empty geometry. Buffers
    /// created before a failure are released.
    pub fn upload(
        device: &Arc<GraphicsDevice>,
        geometry: &Geometry,
        usage: BufferUsageHint,
    ) -> Result<Self, GraphicsError> {
        geometry.validate()?;
        if geometry.vertex_count() == 0 {
            return Err(GraphicsError::InvalidArgument(
                "geometry has no vertices".to_string(),
            ));
        }

        let mut streams: Vec<AttributeStream> = Vec::new();

        for (name, data) in geometry.attributes() {
            match Buffer::from_slice(device, BufferTarget::Array, data.values(), usage) {
                Ok(buffer) => streams.push(AttributeStream {
                    name: name.to_string(),
                    buffer: buffer.with_label(name),
                    components: data.components(),
                }),
                Err(err) => {
                    release_streams(&mut streams);
                    return Err(err);
                }
            }
        }

        let indices = match geometry.indices() {
            Some(indices) if !indices.is_empty() => {
                match Buffer::from_slice(device, BufferTarget::ElementArray, indices, usage) {
                    Ok(buffer) => Some(buffer),
                    Err(err) => {
                        release_streams(&mut streams);
                        return Err(err);
                    }
                }
            }
            _ => None,
        };

        log::trace!(
            "BoundGeometry: uploaded {:?}, {} vertices, {} attributes, indexed={}",
            geometry.label(),
            geometry.vertex_count(),
            streams.len(),
            indices.is_some()
        );

        Ok(Self {
            device: Arc::clone(device),
            streams,
            indices,
            topology: geometry.topology(),
            vertex_count: geometry.vertex_count() as u32,
            element_count: geometry.element_count() as u32,
            disposed: false,
            label: geometry.label().map(str::to_string),
        })
    }

    /// Bind every attribute stream the program reads.
    ///
    /// Streams for attributes the program does not have are skipped.
    ///
    /// # Errors
    ///
    /// [`GraphicsError::InvalidState`] after disposal of the geometry or
    /// the program.
    pub fn bind(&self, program: &Program) -> Result<(), GraphicsError> {
        self.check_live()?;
        for stream in &self.streams {
            let attribute = match program.attribute(stream.name.as_str()) {
                Ok(attribute) => attribute,
                Err(GraphicsError::NotFound { .. }) => {
                    log::trace!("BoundGeometry: program does not read {}", stream.name);
                    continue;
                }
                Err(err) => return Err(err),
            };
            let binding =
                AttributeBinding::new(&stream.buffer, stream.components, ComponentType::Float);
            program.bind_attribute(attribute, &binding)?;
        }
        Ok(())
    }

    /// The range a draw of this geometry consumes.
    ///
    /// # Errors
    ///
    /// [`GraphicsError::InvalidState`] after disposal.
    pub fn draw_range(&self) -> Result<DrawRange, GraphicsError> {
        self.check_live()?;
        Ok(match &self.indices {
            Some(indices) => DrawRange::Indexed {
                buffer: indices.handle()?,
                count: self.element_count,
                offset: 0,
            },
            None => DrawRange::Arrays {
                first: 0,
                count: self.vertex_count,
            },
        })
    }

    fn check_live(&self) -> Result<(), GraphicsError> {
        if self.disposed {
            Err(GraphicsError::disposed("geometry"))
        } else {
            Ok(())
        }
    }

    pub fn topology(&self) -> PrimitiveTopology {
        self.topology
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// Indices when indexed, vertices otherwise.
    pub fn element_count(&self) -> u32 {
        self.element_count
    }

    /// Uploaded attribute names, in name order.
    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.streams.iter().map(|s| s.name.as_str())
    }

    pub fn is_indexed(&self) -> bool {
        self.indices.is_some()
    }

    /// Get the parent device.
    pub fn device(&self) -> &Arc<GraphicsDevice> {
        &self.device
    }
}

fn release_streams(streams: &mut [AttributeStream]) {
    for stream in streams {
        stream.buffer.dispose();
    }
}

impl Disposable for BoundGeometry {
    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        release_streams(&mut self.streams);
        if let Some(indices) = &mut self.indices {
            indices.dispose();
        }
        self.disposed = true;
        log::trace!("BoundGeometry: released {:?}", self.label);
    }

    fn is_disposed(&self) -> bool {
        self.disposed
    }
}

impl std::fmt::Debug for BoundGeometry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundGeometry")
            .field("attributes", &self.attribute_names().collect::<Vec<_>>())
            .field("topology", &self.topology)
            .field("vertex_count", &self.vertex_count)
            .field("indexed", &self.indices.is_some())
            .field("label", &self.label)
            .finish()
    }
}
