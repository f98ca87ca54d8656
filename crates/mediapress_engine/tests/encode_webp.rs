use std::sync::Mutex;

use image::{GenericImageView, ImageFormat, Rgb, RgbImage};
use mediapress_engine::{
    ConversionError, Encoder, EngineEvent, ProgressSink, SourceFile, WebpEncoder,
};

struct CollectingSink(Mutex<Vec<EngineEvent>>);

impl CollectingSink {
    fn new() -> Self {
        Self(Mutex::new(Vec::new()))
    }

    fn percents(&self) -> Vec<u8> {
        self.0
            .lock()
            .unwrap()
            .iter()
            .filter_map(|event| match event {
                EngineEvent::Progress(progress) => Some(progress.percent),
                _ => None,
            })
            .collect()
    }
}

impl ProgressSink for CollectingSink {
    fn emit(&self, event: EngineEvent) {
        self.0.lock().unwrap().push(event);
    }
}

fn sample_png(dir: &std::path::Path, name: &str, width: u32, height: u32) -> SourceFile {
    let mut img = RgbImage::new(width, height);
    for (x, _y, pixel) in img.enumerate_pixels_mut() {
        *pixel = Rgb([(x % 256) as u8, 64, 200]);
    }
    let path = dir.join(name);
    img.save_with_format(&path, ImageFormat::Png).unwrap();
    SourceFile {
        name: name.to_string(),
        path,
    }
}

#[tokio::test]
async fn png_is_reencoded_to_webp_with_dimensions_preserved() {
    let temp = tempfile::TempDir::new().unwrap();
    let source = sample_png(temp.path(), "photo.png", 7, 5);
    let sink = CollectingSink::new();

    let artifact = WebpEncoder::new()
        .encode(1, &source, "photo.webp", &sink)
        .await
        .unwrap();

    assert_eq!(artifact.output_name, "photo.webp");
    assert_eq!(artifact.mime, "image/webp");
    assert_eq!(
        image::guess_format(&artifact.bytes).unwrap(),
        ImageFormat::WebP
    );

    // No implicit resampling.
    let decoded = image::load_from_memory(&artifact.bytes).unwrap();
    assert_eq!(decoded.dimensions(), (7, 5));

    // Progress never reaches 100 before completion and never decreases.
    let percents = sink.percents();
    assert!(!percents.is_empty());
    assert!(percents.windows(2).all(|pair| pair[0] <= pair[1]));
    assert!(percents.iter().all(|percent| *percent < 100));
}

#[tokio::test]
async fn corrupt_input_fails_with_a_decode_error() {
    let temp = tempfile::TempDir::new().unwrap();
    let path = temp.path().join("corrupt.jpg");
    std::fs::write(&path, b"definitely not a jpeg").unwrap();
    let source = SourceFile {
        name: "corrupt.jpg".to_string(),
        path,
    };
    let sink = CollectingSink::new();

    let result = WebpEncoder::new()
        .encode(1, &source, "corrupt.webp", &sink)
        .await;
    assert!(matches!(result, Err(ConversionError::Decode(_))));
}

#[tokio::test]
async fn missing_input_fails_as_unreadable() {
    let source = SourceFile {
        name: "gone.png".to_string(),
        path: std::path::PathBuf::from("/definitely/not/here/gone.png"),
    };
    let sink = CollectingSink::new();

    let result = WebpEncoder::new().encode(1, &source, "gone.webp", &sink).await;
    assert!(matches!(result, Err(ConversionError::Unreadable(_))));
}

#[test]
fn webp_capability_is_always_available() {
    assert!(WebpEncoder::new().verify().is_ok());
}
