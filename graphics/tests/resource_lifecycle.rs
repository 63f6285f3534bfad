//! Device integration tests for resource lifecycles.
//!
//! These tests drive buffers, textures, programs and framebuffers through
//! their full lifecycle against the dummy device and check the device's
//! live resource accounting at every step.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test --test resource_lifecycle
//! ```

mod common;

use rstest::rstest;

use common::{Backend, TestContext};
use lumen_graphics::backend::UniformData;
use lumen_graphics::mesh::generators;
use lumen_graphics::texture::Image;
use lumen_graphics::{
    render_geometry, AttachmentPoint, AttachmentTarget, BoundGeometry, Buffer, BufferTarget,
    BufferUsageHint, Disposable, Framebuffer, FramebufferState, GraphicsError, ImageTarget,
    RenderTarget, Uniforms,
};

// ============================================================================
// Buffer Tests
// ============================================================================

#[rstest]
#[case::dummy(Backend::Dummy)]
#[case::dummy_minimal(Backend::DummyMinimal)]
fn test_buffer_upload_and_update(#[case] backend: Backend) {
    let Some(ctx) = TestContext::new(backend) else {
        eprintln!("Backend {:?} not available, skipping", backend);
        return;
    };

    let values = [1.0f32, 2.0, 3.0, 4.0];
    let mut buffer = Buffer::from_slice(
        &ctx.device,
        BufferTarget::Array,
        &values,
        BufferUsageHint::DynamicDraw,
    )
    .unwrap();
    assert_eq!(buffer.size(), 16);
    assert_eq!(ctx.device.buffer_count(), 1);

    buffer.update(&[0u8; 8]).unwrap();
    assert_eq!(buffer.size(), 8);
    let contents = ctx.dummy.buffer_contents(buffer.handle().unwrap()).unwrap();
    assert_eq!(contents, vec![0u8; 8]);

    assert!(matches!(
        buffer.update(&[]),
        Err(GraphicsError::InvalidArgument(_))
    ));

    buffer.dispose();
    buffer.dispose();
    assert_eq!(ctx.device.buffer_count(), 0);
    assert!(matches!(buffer.handle(), Err(GraphicsError::InvalidState(_))));
}

// ============================================================================
// Program Tests
// ============================================================================

#[rstest]
#[case::dummy(Backend::Dummy)]
#[case::dummy_minimal(Backend::DummyMinimal)]
fn test_program_lookup_misses(#[case] backend: Backend) {
    let Some(ctx) = TestContext::new(backend) else {
        eprintln!("Backend {:?} not available, skipping", backend);
        return;
    };

    let mut program = ctx.create_uv_program();
    assert!(program.attribute("position").is_ok());
    assert!(program.uniform("tint").is_ok());

    let err = program.attribute("nonexistent").unwrap_err();
    assert!(matches!(err, GraphicsError::NotFound { kind: "attribute", .. }));

    let first = program.attributes().to_vec();
    program.dispose();
    program.dispose();
    assert_eq!(program.attributes(), first.as_slice());
    assert!(matches!(
        program.attribute("position"),
        Err(GraphicsError::InvalidState(_))
    ));
    assert_eq!(ctx.device.program_count(), 0);
}

#[rstest]
#[case::dummy(Backend::Dummy)]
#[case::dummy_minimal(Backend::DummyMinimal)]
fn test_textured_draw(#[case] backend: Backend) {
    let Some(ctx) = TestContext::new(backend) else {
        eprintln!("Backend {:?} not available, skipping", backend);
        return;
    };

    let mut program = ctx.create_uv_program();
    let mut quad = BoundGeometry::upload(
        &ctx.device,
        &generators::pass_geometry(),
        BufferUsageHint::StaticDraw,
    )
    .unwrap();
    let mut map = ctx.create_render_target(4, 4);
    map.reupload_image(&Image::filled(4, 4, &[255, 0, 0, 255])).unwrap();
    let mut color = ctx.create_render_target(16, 16);
    let mut framebuffer = Framebuffer::new(&ctx.device).unwrap();
    framebuffer
        .attach(
            AttachmentPoint::COLOR0,
            AttachmentTarget::texture(&color, ImageTarget::Texture2D, 0).unwrap(),
        )
        .unwrap();

    let uniforms = Uniforms::new()
        .with("map", &map)
        .with("tint", [1.0f32, 1.0, 1.0, 0.5]);
    render_geometry(&framebuffer, &program, &uniforms, &quad).unwrap();

    let handle = program.handle().unwrap();
    assert_eq!(
        ctx.dummy.uniform_value(handle, "tint"),
        Some(UniformData::Vec4([1.0, 1.0, 1.0, 0.5]))
    );
    assert_eq!(ctx.dummy.bound_texture(0), map.handle().ok());
    assert!(ctx
        .dummy
        .is_populated(color.handle().unwrap(), ImageTarget::Texture2D, 0));

    framebuffer.dispose();
    color.dispose();
    map.dispose();
    quad.dispose();
    program.dispose();
    assert_eq!(ctx.device.live_resource_count(), 0);
    assert_eq!(ctx.dummy.live_object_count(), 0);
}

// ============================================================================
// Framebuffer Tests
// ============================================================================

#[rstest]
#[case::dummy(Backend::Dummy)]
#[case::dummy_minimal(Backend::DummyMinimal)]
fn test_mismatched_depth_attachment(#[case] backend: Backend) {
    let Some(ctx) = TestContext::new(backend) else {
        eprintln!("Backend {:?} not available, skipping", backend);
        return;
    };

    let mut color = ctx.create_render_target(256, 256);
    let mut depth = ctx.create_depth_buffer(128, 128);
    let mut framebuffer = Framebuffer::new(&ctx.device).unwrap();
    assert_eq!(framebuffer.state(), FramebufferState::Unattached);

    framebuffer
        .attach(
            AttachmentPoint::COLOR0,
            AttachmentTarget::texture(&color, ImageTarget::Texture2D, 0).unwrap(),
        )
        .unwrap();
    assert_eq!(framebuffer.state(), FramebufferState::Attached);

    let result = framebuffer.attach(
        AttachmentPoint::Depth,
        AttachmentTarget::renderbuffer(&depth).unwrap(),
    );
    assert!(matches!(result, Err(GraphicsError::IncompatibleAttachment(_))));
    assert!(framebuffer.attachment(AttachmentPoint::Depth).is_none());
    assert!(framebuffer.is_complete());
    assert_eq!(framebuffer.size(), (256, 256));

    framebuffer.dispose();
    assert_eq!(framebuffer.state(), FramebufferState::Disposed);
    assert!(framebuffer.bind().is_err());
    depth.dispose();
    color.dispose();
    assert_eq!(ctx.device.live_resource_count(), 0);
}

#[rstest]
#[case::dummy(Backend::Dummy)]
#[case::dummy_minimal(Backend::DummyMinimal)]
fn test_color_slot_limit(#[case] backend: Backend) {
    let Some(ctx) = TestContext::new(backend) else {
        eprintln!("Backend {:?} not available, skipping", backend);
        return;
    };

    let max = ctx.device.capabilities().max_color_attachments;
    let mut color = ctx.create_render_target(8, 8);
    let mut framebuffer = Framebuffer::new(&ctx.device).unwrap();

    let past_limit = framebuffer.attach(
        AttachmentPoint::Color(max),
        AttachmentTarget::texture(&color, ImageTarget::Texture2D, 0).unwrap(),
    );
    assert!(matches!(
        past_limit,
        Err(GraphicsError::IncompatibleAttachment(_))
    ));
    assert_eq!(framebuffer.state(), FramebufferState::Unattached);

    framebuffer.dispose();
    color.dispose();
}
