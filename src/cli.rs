use crate::config::{stock_config_toml, EmbeddingConfiguration};
use crate::steganography::{rgb_pixels, SteganographyEngine};
use crate::visualize::{complexity_heatmap, embedding_mask};
use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb, RgbImage};
use rand::Rng;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Command-line interface for the adaptive steganography tool
#[derive(Parser)]
#[command(name = "adaptive-steg")]
#[command(about = "Hide text in images with Sobel-guided adaptive LSB embedding")]
#[command(version)]
pub struct CommandLineInterface {
    /// Increase log verbosity (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// TOML configuration file; embedding and extraction must use the same one
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Convert non-RGB inputs (grayscale, alpha, 16-bit) to 8-bit RGB instead of rejecting them
    #[arg(long, global = true)]
    pub convert: bool,

    #[command(subcommand)]
    pub command: SteganographyCommand,
}

/// Available steganography commands
#[derive(Subcommand)]
pub enum SteganographyCommand {
    /// Hide a text message in an image
    Hide {
        #[arg(short, long, help = "Path to the cover image")]
        input: PathBuf,

        #[arg(short, long, help = "Output path for the stego image (always written as PNG)")]
        output: PathBuf,

        #[arg(short, long, help = "Secret message to hide in the image")]
        message: String,

        #[arg(long, help = "Print metrics as JSON")]
        json: bool,
    },

    /// Extract a hidden message from a stego image
    Extract {
        #[arg(short, long, help = "Path to the stego image")]
        input: PathBuf,

        #[arg(long, help = "Print the extraction report as JSON")]
        json: bool,
    },

    /// Report embedding capacity and optionally render diagnostics
    Analyze {
        #[arg(short, long, help = "Path to the image to analyze")]
        input: PathBuf,

        #[arg(long, help = "Write the complexity heat map to this PNG")]
        heatmap: Option<PathBuf>,

        #[arg(long, help = "Write the 1-bit/2-bit embedding mask to this PNG")]
        mask: Option<PathBuf>,

        #[arg(long, help = "Print the analysis as JSON")]
        json: bool,
    },

    /// Generate a test image, hide a message and read it back
    Demo {
        #[arg(short, long, default_value = ".", help = "Directory for the demo files")]
        output_dir: PathBuf,
    },

    /// Print the stock configuration file
    Config,
}

impl CommandLineInterface {
    /// Installs the global tracing subscriber on stderr
    pub fn init_logging(&self) {
        let default_level = match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        };
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Command-line interface handler
pub struct CommandLineHandler {
    steganography_engine: SteganographyEngine,
}

impl CommandLineHandler {
    /// Creates a handler from an optional configuration file
    pub fn new(config_path: Option<&Path>) -> Result<Self> {
        let configuration = match config_path {
            Some(path) => EmbeddingConfiguration::load(path)
                .with_context(|| format!("loading configuration from {}", path.display()))?,
            None => EmbeddingConfiguration::default(),
        };
        Ok(Self {
            steganography_engine: SteganographyEngine::with_configuration(configuration)?,
        })
    }

    /// Processes the command-line interface and executes the appropriate command
    pub fn process_command(&self, cli: CommandLineInterface) -> Result<()> {
        let convert = cli.convert;
        match cli.command {
            SteganographyCommand::Hide {
                input,
                output,
                message,
                json,
            } => self.handle_hide_command(&input, &output, &message, convert, json),

            SteganographyCommand::Extract { input, json } => {
                self.handle_extract_command(&input, convert, json)
            }

            SteganographyCommand::Analyze {
                input,
                heatmap,
                mask,
                json,
            } => self.handle_analyze_command(&input, heatmap.as_deref(), mask.as_deref(), convert, json),

            SteganographyCommand::Demo { output_dir } => self.handle_demo_command(&output_dir),

            SteganographyCommand::Config => {
                print!("{}", stock_config_toml());
                Ok(())
            }
        }
    }

    /// Handles the hide command to embed a message in an image
    fn handle_hide_command(
        &self,
        input_path: &Path,
        output_path: &Path,
        secret_message: &str,
        convert: bool,
        json: bool,
    ) -> Result<()> {
        let cover_image = load_rgb_image(input_path, convert)?;
        info!(
            width = cover_image.width(),
            height = cover_image.height(),
            "loaded cover image"
        );

        let result = self
            .steganography_engine
            .hide_text_in_rgb_image(&cover_image, secret_message)?;

        let output_file_path = png_output_path(output_path);
        save_png(&result.stego_image, &output_file_path)?;

        if json {
            print_json(&result.metrics)?;
        } else {
            let metrics = &result.metrics;
            println!("Stego image saved to: {}", output_file_path.display());
            println!(
                "Payload: {} bits of {} available ({:.2}% used)",
                metrics.payload_bits, metrics.capacity_bits, metrics.utilization
            );
            println!(
                "Pixels: {} at 1 bit, {} at 2 bits (threshold {:.2})",
                metrics.one_bit_pixels, metrics.two_bit_pixels, metrics.complexity_threshold
            );
            println!("PSNR: {}", format_psnr(metrics.psnr));
            println!("SSIM: {:.4}", metrics.ssim);
        }

        Ok(())
    }

    /// Handles the extract command to retrieve a message from a stego image
    fn handle_extract_command(&self, input_path: &Path, convert: bool, json: bool) -> Result<()> {
        let stego_image = load_rgb_image(input_path, convert)?;
        let report = self
            .steganography_engine
            .extract_text_from_rgb_image(&stego_image)?;

        if json {
            print_json(&report)?;
        } else {
            println!("{}", report.secret_text);
        }
        Ok(())
    }

    fn handle_analyze_command(
        &self,
        input_path: &Path,
        heatmap_path: Option<&Path>,
        mask_path: Option<&Path>,
        convert: bool,
        json: bool,
    ) -> Result<()> {
        let rgb_image = load_rgb_image(input_path, convert)?;
        let analysis = self.steganography_engine.analyze_capacity(&rgb_image)?;

        if let Some(path) = heatmap_path {
            let complexity_map = self.steganography_engine.complexity_map(&rgb_image)?;
            save_png(&complexity_heatmap(&complexity_map), path)?;
        }
        if let Some(path) = mask_path {
            let plan = self.steganography_engine.plan(&rgb_image)?;
            save_png(
                &embedding_mask(&plan, rgb_image.width(), rgb_image.height()),
                path,
            )?;
        }

        if json {
            print_json(&analysis)?;
        } else {
            println!(
                "Capacity: {} bits ({} bytes), longest message {} bytes",
                analysis.total_capacity_bits,
                analysis.total_capacity_bytes,
                analysis.max_message_bytes
            );
            println!("Average bits per pixel: {:.4}", analysis.average_bits_per_pixel);
            println!(
                "Blocks: {} total, {} high complexity ({:.2}%), {} low complexity ({:.2}%)",
                analysis.total_blocks,
                analysis.high_complexity_blocks,
                analysis.high_complexity_percentage,
                analysis.low_complexity_blocks,
                analysis.low_complexity_percentage
            );
            println!("Complexity threshold: {:.2}", analysis.complexity_threshold);
            println!(
                "Capacity share: {:.2}% from 1-bit blocks, {:.2}% from 2-bit blocks",
                analysis.one_bit_share, analysis.two_bit_share
            );
        }
        Ok(())
    }

    /// Handles the demo command to create a demonstration
    fn handle_demo_command(&self, output_dir: &Path) -> Result<()> {
        std::fs::create_dir_all(output_dir)
            .with_context(|| format!("creating {}", output_dir.display()))?;

        let cover_path = output_dir.join("demo_cover.png");
        let stego_path = output_dir.join("demo_stego.png");
        let demo_message = "Secret message hidden with adaptive LSB steganography!";

        save_png(&create_demonstration_image(), &cover_path)?;
        let cover_image = load_rgb_image(&cover_path, false)?;

        let result = self
            .steganography_engine
            .hide_text_in_rgb_image(&cover_image, demo_message)?;
        save_png(&result.stego_image, &stego_path)?;

        let reloaded = load_rgb_image(&stego_path, false)?;
        let report = self
            .steganography_engine
            .extract_text_from_rgb_image(&reloaded)?;

        println!("\n=== DEMONSTRATION RESULTS ===");
        println!("Original message: \"{}\"", demo_message);
        println!("Recovered message: \"{}\"", report.secret_text);
        println!("Success: {}", demo_message == report.secret_text);
        println!("PSNR: {}", format_psnr(result.metrics.psnr));
        println!("SSIM: {:.4}", result.metrics.ssim);

        println!("\n=== FILES CREATED ===");
        println!("{} - cover image", cover_path.display());
        println!("{} - image with hidden message", stego_path.display());

        Ok(())
    }
}

/// Loads an image file as 8-bit RGB
fn load_rgb_image(path: &Path, convert: bool) -> Result<RgbImage> {
    let dynamic_image =
        image::open(path).with_context(|| format!("opening image {}", path.display()))?;

    if convert {
        if !matches!(dynamic_image, DynamicImage::ImageRgb8(_)) {
            warn!(
                color = ?dynamic_image.color(),
                path = %path.display(),
                "converting image to 8-bit RGB"
            );
        }
        return Ok(dynamic_image.into_rgb8());
    }

    rgb_pixels(dynamic_image).with_context(|| format!("reading pixels of {}", path.display()))
}

/// Lossy formats would destroy the payload, so every output is PNG
fn png_output_path(output_path: &Path) -> PathBuf {
    let is_png = output_path
        .extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| extension.eq_ignore_ascii_case("png"));
    if is_png {
        output_path.to_path_buf()
    } else {
        let png_path = output_path.with_extension("png");
        warn!(
            requested = %output_path.display(),
            written = %png_path.display(),
            "stego output must be lossless, writing PNG"
        );
        png_path
    }
}

fn save_png(rgb_image: &RgbImage, path: &Path) -> Result<()> {
    rgb_image
        .save_with_format(path, ImageFormat::Png)
        .with_context(|| format!("writing {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn format_psnr(psnr: f64) -> String {
    if psnr.is_infinite() {
        "inf (images identical)".to_string()
    } else {
        format!("{:.2} dB", psnr)
    }
}

/// Gradient with a noisy band so both bit depths appear in the plan
fn create_demonstration_image() -> RgbImage {
    const IMAGE_WIDTH: u32 = 256;
    const IMAGE_HEIGHT: u32 = 256;

    let mut random = rand::thread_rng();
    ImageBuffer::from_fn(IMAGE_WIDTH, IMAGE_HEIGHT, |x, y| {
        let red_component = (x * 255 / IMAGE_WIDTH) as u8;
        let green_component = (y * 255 / IMAGE_HEIGHT) as u8;
        let blue_component = ((x + y) * 255 / (IMAGE_WIDTH + IMAGE_HEIGHT)) as u8;
        if (IMAGE_HEIGHT / 3..2 * IMAGE_HEIGHT / 3).contains(&y) {
            Rgb([
                red_component.wrapping_add(random.gen_range(0..64)),
                green_component.wrapping_add(random.gen_range(0..64)),
                blue_component,
            ])
        } else {
            Rgb([red_component, green_component, blue_component])
        }
    })
}
