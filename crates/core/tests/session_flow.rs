use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::{DynamicImage, Rgba, RgbaImage};
use inpaint_mask_core::geometry::ContainerSize;
use inpaint_mask_core::{AppError, BrushConfig, EditorSession, InpaintParams, StrokeScript};

const SCRIPT: &str = r#"{
    "canvas": { "left": 100, "top": 40 },
    "strokes": [
        {
            "polarity": "add",
            "diameter": 40,
            "points": [{ "x": 150, "y": 90 }, { "x": 350, "y": 90 }]
        },
        {
            "polarity": "erase",
            "diameter": 20,
            "points": [{ "x": 250, "y": 90 }]
        }
    ]
}"#;

fn photo() -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_fn(1600, 900, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, 90, 255])
    }))
}

fn painted_session() -> EditorSession {
    let mut session = EditorSession::new(ContainerSize::new(800.0, 800.0), BrushConfig::default());
    session.load_image(photo());
    let script = StrokeScript::from_json(SCRIPT).unwrap();
    assert!(session.replay(&script) > 1);
    session
}

#[test]
fn test_replay_exports_full_resolution_mask() {
    let session = painted_session();
    assert_eq!(session.scale_context().unwrap().working, (800, 450));

    let mask = session.export_mask().unwrap();
    assert_eq!(mask.dimensions(), (1600, 900));

    // Canvas (50, 50) is painted; original pixels are twice as far out.
    assert_eq!(mask.value_at(100, 100), Some(0));
    assert_eq!(mask.value_at(500, 100), Some(0));
    // Erased hole around canvas (150, 50).
    assert_eq!(mask.value_at(300, 100), Some(255));
    // Untouched corner.
    assert_eq!(mask.value_at(1500, 800), Some(255));
}

#[test]
fn test_render_shows_selection_without_touching_it() {
    let session = painted_session();
    let version = session.selection_version();

    let view = session.render().unwrap();
    assert_eq!(view.dimensions(), (800, 450));
    assert_eq!(session.selection_version(), version);

    let untouched = session.render().unwrap();
    assert_eq!(view, untouched);
}

#[test]
fn test_request_carries_image_and_mask() {
    let session = painted_session();
    let params = InpaintParams {
        seed: 1234,
        ..InpaintParams::default()
    };
    let request = session.build_request("a wooden bench", params).unwrap();

    let mask_png = BASE64.decode(&request.mask).unwrap();
    let mask = image::load_from_memory(&mask_png).unwrap().to_rgba8();
    assert_eq!(mask.dimensions(), (1600, 900));
    assert_eq!(mask.get_pixel(100, 100)[3], 0);

    let image_png = BASE64.decode(&request.image).unwrap();
    let image = image::load_from_memory(&image_png).unwrap();
    assert_eq!((image.width(), image.height()), (1600, 900));

    let json: serde_json::Value = serde_json::from_str(&request.to_json().unwrap()).unwrap();
    assert_eq!(json["x"], "a wooden bench");
    assert_eq!(json["seed"], 1234);
}

#[test]
fn test_erasing_everything_blocks_export() {
    let mut session = painted_session();
    let wipe = StrokeScript::from_json(
        r#"{ "strokes": [{ "polarity": "subtract", "diameter": 100,
             "points": [{ "x": 0, "y": 40 }, { "x": 400, "y": 40 }] }] }"#,
    )
    .unwrap();
    session.replay(&wipe);

    assert!(!session.has_selection());
    assert!(matches!(session.export_mask(), Err(AppError::EmptySelection)));
}

#[tokio::test]
async fn test_async_export_matches_blocking_export() {
    let session = painted_session();
    let blocking = session.export_mask().unwrap();
    let background = session.export_mask_async().await.unwrap();
    assert_eq!(blocking, background);
}
