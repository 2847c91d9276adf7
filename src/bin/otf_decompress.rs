// CLI tool to convert WOFF/WOFF2 fonts back to sfnt (TTF/OTF)
use std::env;

use otf_rs::{FontFormat, decompress_woff, decompress_woff2, detect_format};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 3 {
        eprintln!("Usage: {} <input.[woff|woff2]> <output.[ttf|otf]>", args[0]);
        eprintln!();
        eprintln!("Decompress a WOFF or WOFF2 font into an sfnt file.");
        std::process::exit(1);
    }

    let input = std::fs::read(&args[1])?;
    let sfnt = match detect_format(&input) {
        FontFormat::Woff => decompress_woff(&input)?,
        FontFormat::Woff2 => decompress_woff2(&input)?,
        other => {
            eprintln!("{}: not a WOFF/WOFF2 file (detected {other:?})", args[1]);
            std::process::exit(1);
        }
    };

    std::fs::write(&args[2], &sfnt)?;
    println!("Wrote {} bytes to {}", sfnt.len(), args[2]);

    Ok(())
}
