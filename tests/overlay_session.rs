use rasterprep::{
    BlendMode, ColorBoost, CompositeOptions, DisplayMapping, GestureKind, GestureSession, Point,
    RasterBuffer, Size, Transform, TransformHistory, Vec2, composite,
};

const SKIN: [u8; 4] = [224, 172, 105, 255];

fn dark_square() -> RasterBuffer {
    RasterBuffer::filled(100, 100, [0, 0, 0, 255]).unwrap()
}

#[test]
fn history_undo_twice_redo_twice_returns_to_last_commit() {
    let t = |x: f64| Transform {
        x,
        ..Transform::default()
    };
    let mut h = TransformHistory::new(t(0.0));
    h.push(t(10.0));
    h.push(t(20.0));

    h.undo();
    h.undo();
    h.redo();
    h.redo();
    assert_eq!(h.cursor(), 2);
    assert_eq!(*h.current(), t(20.0));
}

#[test]
fn dragged_overlay_lands_at_scaled_native_position() {
    // 400x300 background shown at half size inside a 200x150 container.
    let background = RasterBuffer::filled(400, 300, SKIN).unwrap();
    let mapping = DisplayMapping::from_display(
        Vec2::ZERO,
        Size::new(200.0, 150.0),
        background.size(),
    )
    .unwrap();

    let mut session = GestureSession::default();
    let placed = session.place(Size::new(200.0, 150.0), Size::new(100.0, 100.0), 50.0);
    assert_eq!((placed.x, placed.y, placed.width), (75.0, 50.0, 50.0));

    session.begin(GestureKind::Move, Point::new(100.0, 75.0));
    session.update(Point::new(110.0, 75.0));
    session.end();
    assert_eq!(session.transform().x, 85.0);

    let opts = CompositeOptions::default();
    let out = composite(
        background.clone(),
        &dark_square(),
        session.transform(),
        &mapping,
        &opts,
    )
    .unwrap();
    assert_eq!(out.dimensions(), (400, 300));
    // native rect is x 170..270, y 100..200
    assert_eq!(out.pixel(220, 150), [0, 0, 0, 255]);
    assert_eq!(out.pixel(171, 101), [0, 0, 0, 255]);
    assert_eq!(out.pixel(168, 150), SKIN);
    assert_eq!(out.pixel(220, 202), SKIN);

    let undone = session.undo().unwrap();
    assert_eq!(undone.x, 75.0);
    let out = composite(background, &dark_square(), &undone, &mapping, &opts).unwrap();
    assert_eq!(out.pixel(155, 150), [0, 0, 0, 255]);
    assert_eq!(out.pixel(260, 150), SKIN);
}

#[test]
fn white_overlay_background_vanishes_under_multiply() {
    let background = RasterBuffer::from_fn(64, 64, |x, y| {
        [(x * 4) as u8, (y * 4) as u8, 128, 255]
    })
    .unwrap();
    // White card with a black dot in the middle.
    let overlay = RasterBuffer::from_fn(32, 32, |x, y| {
        if (14..18).contains(&x) && (14..18).contains(&y) {
            [0, 0, 0, 255]
        } else {
            [255, 255, 255, 255]
        }
    })
    .unwrap();
    let transform = Transform {
        x: 16.0,
        y: 16.0,
        width: 32.0,
        height: 32.0,
        rotation_degrees: 0.0,
    };

    let out = composite(
        background.clone(),
        &overlay,
        &transform,
        &DisplayMapping::default(),
        &CompositeOptions::default(),
    )
    .unwrap();
    assert_eq!(out.pixel(20, 20), background.pixel(20, 20));
    assert_eq!(out.pixel(32, 32), [0, 0, 0, 255]);

    let normal = CompositeOptions {
        blend: BlendMode::Normal,
        boost: ColorBoost::IDENTITY,
    };
    let out = composite(
        background.clone(),
        &overlay,
        &transform,
        &DisplayMapping::default(),
        &normal,
    )
    .unwrap();
    assert_eq!(out.pixel(20, 20), [255, 255, 255, 255]);
}

#[test]
fn rotation_about_scaled_center_has_no_offset() {
    let background = RasterBuffer::filled(300, 300, [255, 255, 255, 255]).unwrap();
    let overlay = RasterBuffer::filled(10, 10, [0, 0, 0, 255]).unwrap();
    let mapping = DisplayMapping {
        offset_x: 10.0,
        offset_y: 10.0,
        scale_x: 3.0,
        scale_y: 3.0,
    };
    // Native rect: (20-10)*3 = 30 .. 30+60 = 90 on both axes, centre (60, 60).
    let t = Transform {
        x: 20.0,
        y: 20.0,
        width: 20.0,
        height: 20.0,
        rotation_degrees: 90.0,
    };
    let out = composite(
        background,
        &overlay,
        &t,
        &mapping,
        &CompositeOptions::default(),
    )
    .unwrap();

    // A square rotated by 90 degrees about its own centre covers the same pixels.
    assert_eq!(out.pixel(31, 31), [0, 0, 0, 255]);
    assert_eq!(out.pixel(88, 88), [0, 0, 0, 255]);
    assert_eq!(out.pixel(28, 60), [255, 255, 255, 255]);
    assert_eq!(out.pixel(91, 60), [255, 255, 255, 255]);
}

#[test]
fn zero_width_overlay_is_a_no_op() {
    let background = RasterBuffer::filled(20, 20, SKIN).unwrap();
    let t = Transform {
        width: 0.0,
        rotation_degrees: 45.0,
        ..Transform::default()
    };
    let out = composite(
        background.clone(),
        &dark_square(),
        &t,
        &DisplayMapping::default(),
        &CompositeOptions::default(),
    )
    .unwrap();
    assert_eq!(out, background);
}
