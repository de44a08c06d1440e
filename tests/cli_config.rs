//! Configuration files and PNG persistence around the engine.

use adaptive_steg::steganography::rgb_pixels;
use adaptive_steg::{CarrierChannel, EmbeddingConfiguration, SteganographyEngine};
use image::{ImageBuffer, ImageFormat, Rgb, RgbImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs;
use tempfile::TempDir;

fn noise(seed: u64, width: u32, height: u32) -> RgbImage {
    let mut random = StdRng::seed_from_u64(seed);
    ImageBuffer::from_fn(width, height, |_, _| Rgb(random.gen::<[u8; 3]>()))
}

#[test]
fn configured_engine_roundtrips_through_png() {
    let tmp = TempDir::new().unwrap();
    let config_path = tmp.path().join("steg.toml");
    fs::write(&config_path, "block_size = 3\ncarrier_channel = \"green\"\n").unwrap();

    let configuration = EmbeddingConfiguration::load(&config_path).unwrap();
    assert_eq!(configuration.carrier_channel, CarrierChannel::Green);
    let engine = SteganographyEngine::with_configuration(configuration).unwrap();

    let cover = noise(11, 48, 40);
    let result = engine.hide_text_in_rgb_image(&cover, "saved as png").unwrap();

    let stego_path = tmp.path().join("stego.png");
    result
        .stego_image
        .save_with_format(&stego_path, ImageFormat::Png)
        .unwrap();
    let reloaded = rgb_pixels(image::open(&stego_path).unwrap()).unwrap();

    assert_eq!(reloaded, result.stego_image);
    let report = engine.extract_text_from_rgb_image(&reloaded).unwrap();
    assert_eq!(report.secret_text, "saved as png");
}

#[test]
fn mismatched_configuration_does_not_read_payload() {
    let configuration = EmbeddingConfiguration::from_toml_str("carrier_channel = \"red\"").unwrap();
    let red_engine = SteganographyEngine::with_configuration(configuration).unwrap();
    let blue_engine = SteganographyEngine::new();

    let cover = noise(12, 40, 40);
    let stego = red_engine
        .hide_text_in_rgb_image(&cover, "red only")
        .unwrap()
        .stego_image;

    assert!(blue_engine.extract_text_from_rgb_image(&stego).is_err());
    assert_eq!(
        red_engine.extract_text_from_rgb_image(&stego).unwrap().secret_text,
        "red only"
    );
}

#[test]
fn metrics_serialize_to_json() {
    let engine = SteganographyEngine::new();
    let cover = noise(13, 16, 16);
    let result = engine.hide_text_in_rgb_image(&cover, "json").unwrap();

    let value = serde_json::to_value(&result.metrics).unwrap();
    assert_eq!(value["payload_bits"], 72);
    assert_eq!(value["width"], 16);
    assert!(value["psnr"].is_number());

    let analysis =
        serde_json::to_value(engine.analyze_capacity(&result.stego_image).unwrap()).unwrap();
    assert_eq!(analysis["total_blocks"], 64);
}
