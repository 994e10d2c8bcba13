use bufferlib::{ByteBuffer, HexWriteOptions};
use std::env;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process;
use tracing::debug;
use tracing_subscriber::EnvFilter;

type CliResult<T = ()> = Result<T, Box<dyn Error>>;

const DEFAULT_FILL: u8 = 0xFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ImageKind {
    Bin,
    Hex,
}

impl ImageKind {
    /// `None` for anything but a `.bin` or `.hex` extension (any case)
    fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?;
        if ext.eq_ignore_ascii_case("hex") {
            Some(Self::Hex)
        } else if ext.eq_ignore_ascii_case("bin") {
            Some(Self::Bin)
        } else {
            None
        }
    }

    fn load(self, path: &Path, fill: u8) -> CliResult<(ByteBuffer, usize)> {
        match self {
            Self::Hex => {
                let (data, mask) = ByteBuffer::from_intel_hex_file(path, fill)?;
                let written = mask.iter().filter(|&&b| b != 0x00).count();
                Ok((data, written))
            }
            Self::Bin => {
                let data = ByteBuffer::from_binary_file(path, fill)?;
                let written = data.len();
                Ok((data, written))
            }
        }
    }
}

fn print_usage() {
    let version = env!("CARGO_PKG_VERSION");

    println!("bufcli v{version}: byte image inspection and conversion");
    println!("\nUsage:");
    println!("  bufcli info <input> [--fill <val>]");
    println!("  bufcli convert <input> <output> [options]");
    println!("\nOptions (values are hex, 0x prefix optional):");
    println!("  --fill <val>          Byte used for gaps in the image (default: 0xFF)");
    println!("  --line-length <val>   Data bytes per record when writing HEX (default: 0x10)");
    println!("  --compress            Skip runs of fill bytes when writing HEX from BIN");
    println!("\nExamples:");
    println!("  bufcli info firmware.hex");
    println!("  bufcli convert firmware.hex firmware.bin --fill 0x00");
    println!("  bufcli convert firmware.bin firmware.hex --line-length 0x20 --compress");
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args: Vec<String> = env::args().skip(1).collect();

    let outcome = match args.first().map(String::as_str) {
        Some("help" | "-h" | "--help") => {
            print_usage();
            Ok(())
        }
        Some("info") => run_info(&args[1..]),
        Some("convert") => run_convert(&args[1..]),
        _ => {
            print_usage();
            process::exit(1);
        }
    };

    if let Err(e) = outcome {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run_info(args: &[String]) -> CliResult {
    let input = existing_file(args.first().ok_or("Missing input file path")?)?;
    let fill = byte_option(args, "--fill")?.unwrap_or(DEFAULT_FILL);

    let kind = ImageKind::from_path(&input)
        .ok_or_else(|| format!("File type not supported: {}", input.display()))?;
    let (data, written) = kind.load(&input, fill)?;

    println!("File Path:   {}", input.display());
    println!("Image Size:  {} bytes", group_thousands(data.len()));
    println!("Written:     {} bytes", group_thousands(written));
    println!("Capacity:    {} bytes", group_thousands(data.capacity()));
    Ok(())
}

fn run_convert(args: &[String]) -> CliResult {
    let input = existing_file(args.first().ok_or("Missing input path")?)?;
    let output = PathBuf::from(args.get(1).ok_or("Missing output path")?);

    let (Some(in_kind), Some(out_kind)) =
        (ImageKind::from_path(&input), ImageKind::from_path(&output))
    else {
        return Err("Input or output files are of unsupported type".into());
    };
    if in_kind == out_kind {
        return Err("Cannot convert between the same file type".into());
    }

    let fill = byte_option(args, "--fill")?.unwrap_or(DEFAULT_FILL);
    let line_length = byte_option(args, "--line-length")?;
    let compress = args.iter().any(|arg| arg == "--compress");
    if out_kind != ImageKind::Hex && (line_length.is_some() || compress) {
        return Err(
            "Options '--line-length' and '--compress' are only supported for BIN to HEX conversion"
                .into(),
        );
    }

    let (data, _) = in_kind.load(&input, fill)?;
    match out_kind {
        ImageKind::Bin => data.write_binary_file(&output, 0, data.len())?,
        ImageKind::Hex => {
            let mut options = HexWriteOptions::new();
            options.set_compress(compress);
            if let Some(line_length) = line_length {
                options.set_line_length(line_length)?;
            }
            data.write_intel_hex_file(&output, None, &options)?;
        }
    }

    println!("Converted {} -> {}", input.display(), output.display());
    Ok(())
}

/// Value of `flag` read as a hex byte, if the flag is present.
fn byte_option(args: &[String], flag: &str) -> CliResult<Option<u8>> {
    let Some(pos) = args.iter().position(|arg| arg == flag) else {
        return Ok(None);
    };
    let raw = args.get(pos + 1).map_or("", String::as_str);
    let digits = raw.trim();
    let digits = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
        .unwrap_or(digits);

    let name = flag.trim_start_matches('-').replace('-', " ");
    let value =
        u8::from_str_radix(digits, 16).map_err(|_| format!("Invalid {name}: {raw:?}"))?;
    debug!("{} = 0x{:02X}", flag, value);
    Ok(Some(value))
}

fn existing_file(path: &str) -> CliResult<PathBuf> {
    let path = Path::new(path);
    if !path.exists() {
        return Err(format!("File not found: {}", path.display()).into());
    }
    if !path.is_file() {
        return Err(format!("Not a regular file: {}", path.display()).into());
    }
    Ok(std::fs::canonicalize(path)?)
}

fn group_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
