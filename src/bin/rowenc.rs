//! rowenc CLI - streaming image encoder
//!
//! Reads a PNG or PPM/PGM image and writes it back out as PNG, JPEG, BMP,
//! TGA or Radiance HDR.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, ValueEnum};

use rowenc::compress::CompressionLevel;
use rowenc::jpeg::{JpegOptions, Subsampling};
use rowenc::png::{FilterStrategy, PngOptions};
use rowenc::tga::TgaOptions;
use rowenc::{ColorType, EncodeContext, ImageRef};

/// Streaming image encoder.
///
/// Supports PNG, PPM and PGM input.
#[derive(Parser, Debug)]
#[command(name = "rowenc")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input image file (PNG, PPM, or PGM)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output file path (format detected from extension)
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Output format (overrides extension detection)
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// JPEG quality (1-100, higher = better quality)
    #[arg(short, long, default_value = "90", value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: u8,

    /// JPEG chroma subsampling
    #[arg(long, value_enum, default_value = "s444")]
    subsampling: SubsamplingArg,

    /// PNG compression level
    #[arg(short = 'c', long, value_enum, default_value = "optimal")]
    compression: CompressionArg,

    /// PNG filter: -1 for adaptive, 0-4 to force None/Sub/Up/Average/Paeth
    #[arg(long, default_value = "-1", allow_hyphen_values = true, value_parser = clap::value_parser!(i32).range(-1..=4))]
    filter: i32,

    /// Write PNG rows bottom-up
    #[arg(long)]
    flip: bool,

    /// Write TGA without run-length encoding
    #[arg(long)]
    no_rle: bool,

    /// Show verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// PNG format (lossless)
    Png,
    /// JPEG format (lossy)
    Jpeg,
    /// Windows bitmap
    Bmp,
    /// Targa
    Tga,
    /// Radiance RGBE
    Hdr,
}

impl OutputFormat {
    fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "png" => Some(OutputFormat::Png),
            "jpg" | "jpeg" => Some(OutputFormat::Jpeg),
            "bmp" => Some(OutputFormat::Bmp),
            "tga" => Some(OutputFormat::Tga),
            "hdr" => Some(OutputFormat::Hdr),
            _ => None,
        }
    }

    fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Bmp => "bmp",
            OutputFormat::Tga => "tga",
            OutputFormat::Hdr => "hdr",
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SubsamplingArg {
    /// 4:4:4 - No subsampling (best quality)
    S444,
    /// 4:2:0 - 2x2 chroma downsample (smaller file)
    S420,
}

impl From<SubsamplingArg> for Subsampling {
    fn from(arg: SubsamplingArg) -> Self {
        match arg {
            SubsamplingArg::S444 => Subsampling::S444,
            SubsamplingArg::S420 => Subsampling::S420,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CompressionArg {
    /// Stored blocks only
    None,
    /// Fastest DEFLATE
    Fastest,
    /// Default DEFLATE effort
    Optimal,
    /// Slowest, smallest output
    Smallest,
}

impl From<CompressionArg> for CompressionLevel {
    fn from(arg: CompressionArg) -> Self {
        match arg {
            CompressionArg::None => CompressionLevel::None,
            CompressionArg::Fastest => CompressionLevel::Fastest,
            CompressionArg::Optimal => CompressionLevel::Optimal,
            CompressionArg::Smallest => CompressionLevel::SmallestSize,
        }
    }
}

/// Decoded image data.
struct DecodedImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    color_type: ColorType,
    input_format: &'static str,
}

/// Detect input format from file header bytes.
fn detect_format(path: &Path) -> Result<&'static str, Box<dyn std::error::Error>> {
    let mut file = File::open(path)?;
    let mut header = [0u8; 8];
    file.read_exact(&mut header)?;

    // PNG: 89 50 4E 47 0D 0A 1A 0A
    if header.starts_with(&rowenc::png::PNG_SIGNATURE) {
        return Ok("png");
    }

    // PPM: P6
    if header.starts_with(b"P6") {
        return Ok("ppm");
    }

    // PGM: P5
    if header.starts_with(b"P5") {
        return Ok("pgm");
    }

    Err("Unknown image format. Supported: PNG, PPM (P6), PGM (P5)".into())
}

/// Decode a PNG file.
fn decode_png(path: &Path) -> Result<DecodedImage, Box<dyn std::error::Error>> {
    let file = File::open(path)?;
    let mut decoder = png::Decoder::new(BufReader::new(file));
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
    let mut reader = decoder.read_info()?;

    let mut pixels = vec![0u8; reader.output_buffer_size()];
    let info = reader.next_frame(&mut pixels)?;
    pixels.truncate(info.buffer_size());

    let color_type = match info.color_type {
        png::ColorType::Grayscale => ColorType::Gray,
        png::ColorType::GrayscaleAlpha => ColorType::GrayAlpha,
        png::ColorType::Rgb => ColorType::Rgb,
        png::ColorType::Rgba => ColorType::Rgba,
        png::ColorType::Indexed => {
            return Err("Indexed PNG not supported. Convert to RGB first.".into())
        }
    };

    Ok(DecodedImage {
        width: info.width,
        height: info.height,
        pixels,
        color_type,
        input_format: "PNG",
    })
}

/// Decode a PPM (P6) or PGM (P5) file.
fn decode_pnm(path: &Path) -> Result<DecodedImage, Box<dyn std::error::Error>> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);

    let mut magic = String::new();
    read_token(&mut reader, &mut magic)?;

    let (color_type, input_format) = match magic.as_str() {
        "P5" => (ColorType::Gray, "PGM"),
        "P6" => (ColorType::Rgb, "PPM"),
        _ => {
            return Err(format!("Unsupported format '{magic}'. Expected P5 (PGM) or P6 (PPM)").into())
        }
    };

    let mut token = String::new();

    read_token(&mut reader, &mut token)?;
    let width: u32 = token.parse()?;

    read_token(&mut reader, &mut token)?;
    let height: u32 = token.parse()?;

    read_token(&mut reader, &mut token)?;
    let max_val: u32 = token.parse()?;

    if max_val != 255 {
        return Err(format!("Unsupported max value {max_val}. Only 8-bit (255) supported").into());
    }

    let expected_size = width as usize * height as usize * color_type.components();
    let mut pixels = vec![0u8; expected_size];
    reader.read_exact(&mut pixels)?;

    Ok(DecodedImage {
        width,
        height,
        pixels,
        color_type,
        input_format,
    })
}

/// Read next whitespace-delimited token, skipping comments.
fn read_token<R: BufRead>(reader: &mut R, token: &mut String) -> std::io::Result<()> {
    token.clear();
    let mut in_comment = false;

    loop {
        let mut byte = [0u8; 1];
        if reader.read(&mut byte)? == 0 {
            break;
        }

        let ch = byte[0] as char;

        if in_comment {
            if ch == '\n' {
                in_comment = false;
            }
            continue;
        }

        if ch == '#' {
            in_comment = true;
            continue;
        }

        if ch.is_ascii_whitespace() {
            if !token.is_empty() {
                break;
            }
            continue;
        }

        token.push(ch);
    }

    Ok(())
}

/// Load and decode an image file.
fn load_image(path: &Path) -> Result<DecodedImage, Box<dyn std::error::Error>> {
    match detect_format(path)? {
        "png" => decode_png(path),
        _ => decode_pnm(path),
    }
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let start = Instant::now();
    let img = load_image(&args.input)?;
    let load_time = start.elapsed();

    if args.verbose {
        eprintln!("Loaded: {:?}", args.input);
        eprintln!("  Input format: {}", img.input_format);
        eprintln!("  Dimensions: {}x{}", img.width, img.height);
        eprintln!("  Color type: {:?}", img.color_type);
        eprintln!("  Load time: {load_time:.2?}");
    }

    let format = args
        .format
        .or_else(|| args.output.as_deref().and_then(OutputFormat::from_extension))
        .unwrap_or(OutputFormat::Png);

    let output_path = args.output.clone().unwrap_or_else(|| {
        let mut path = args.input.clone();
        path.set_extension(format!("out.{}", format.extension()));
        path
    });

    let image = ImageRef::new(&img.pixels, img.width, img.height, img.color_type)?;

    let verbose = args.verbose;
    let mut report = |fraction: f32| {
        if verbose {
            eprint!("\r  Progress: {:5.1}%", fraction * 100.0);
        }
    };
    let mut ctx = EncodeContext::new().with_progress(&mut report);

    let encode_start = Instant::now();
    let mut writer = BufWriter::new(File::create(&output_path)?);
    match format {
        OutputFormat::Png => {
            let options = PngOptions {
                compression: args.compression.into(),
                filter_strategy: FilterStrategy::from_override(args.filter),
                flip_vertically: args.flip,
                ..PngOptions::default()
            };
            rowenc::png::write_image_with_context(&image, &mut writer, &options, &mut ctx)?;
        }
        OutputFormat::Jpeg => {
            let options = JpegOptions {
                quality: args.quality,
                subsampling: args.subsampling.into(),
                ..JpegOptions::default()
            };
            rowenc::jpeg::write_image_with_context(&image, &mut writer, &options, &mut ctx)?;
        }
        OutputFormat::Bmp => {
            rowenc::bmp::write_image_with_context(&image, &mut writer, &mut ctx)?;
        }
        OutputFormat::Tga => {
            let options = TgaOptions { rle: !args.no_rle };
            rowenc::tga::write_image_with_context(&image, &mut writer, &options, &mut ctx)?;
        }
        OutputFormat::Hdr => {
            rowenc::hdr::write_image_with_context(&image, &mut writer, &mut ctx)?;
        }
    }
    writer.flush()?;
    drop(ctx);
    let encode_time = encode_start.elapsed();

    let input_size = fs::metadata(&args.input)?.len();
    let output_size = fs::metadata(&output_path)?.len();
    let ratio = if input_size > 0 {
        (output_size as f64 / input_size as f64) * 100.0
    } else {
        0.0
    };

    if args.verbose {
        eprintln!();
        eprintln!("Output: {output_path:?}");
        eprintln!("  Format: {format:?}");
        match format {
            OutputFormat::Png => {
                eprintln!("  Compression: {:?}", args.compression);
                eprintln!("  Filter: {}", args.filter);
            }
            OutputFormat::Jpeg => {
                eprintln!("  Quality: {}", args.quality);
                eprintln!("  Subsampling: {:?}", args.subsampling);
            }
            OutputFormat::Tga => eprintln!("  RLE: {}", !args.no_rle),
            OutputFormat::Bmp | OutputFormat::Hdr => {}
        }
        eprintln!("  Encode time: {encode_time:.2?}");
        eprintln!(
            "  Size: {} -> {} ({:.1}%)",
            format_size(input_size),
            format_size(output_size),
            ratio
        );
    } else {
        println!(
            "{} -> {} ({:.1}%)",
            format_size(input_size),
            format_size(output_size),
            ratio
        );
    }

    Ok(())
}

fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}
