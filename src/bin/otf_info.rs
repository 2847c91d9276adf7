// CLI tool to inspect TrueType/OpenType/WOFF font files
use std::env;
use std::path::Path;

use otf_rs::{Font, TableRegistry, detect_format};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <font.[ttf|otf|woff|woff2]>", args[0]);
        eprintln!();
        eprintln!("Display information about a font file.");
        std::process::exit(1);
    }

    let font_path = &args[1];
    let bytes = std::fs::read(font_path)?;
    let format = detect_format(&bytes);
    let font = Font::from_data(bytes)?;

    println!("Font: {}", Path::new(font_path).display());
    println!();

    println!("Basic Information:");
    println!("  Container: {format:?}");
    println!("  SFNT Version: {:#x}", font.sfnt_version);
    println!("  Number of tables: {}", font.num_tables);
    println!();

    if let Ok(name) = font.font_name() {
        println!("Font Name: {name}");
    }
    if let Ok(family) = font.family_name() {
        println!("Family Name: {family}");
    }
    println!();

    if let Ok(units_per_em) = font.units_per_em() {
        println!("  Units per EM: {units_per_em}");
    }
    if let Ok(num_glyphs) = font.num_glyphs() {
        println!("  Number of glyphs: {num_glyphs}");
    }
    if let Ok(is_bold) = font.is_bold() {
        println!("  Bold: {is_bold}");
    }
    if let Ok(is_italic) = font.is_italic() {
        println!("  Italic: {is_italic}");
    }
    println!();

    let registry = TableRegistry::new(font.clone());
    if let Ok(axes) = registry.variation_axes() {
        if !axes.is_empty() {
            println!("Variation Axes:");
            for axis in axes {
                println!(
                    "  {} min {} default {} max {}",
                    axis.tag_string(),
                    axis.min_value,
                    axis.default_value,
                    axis.max_value
                );
            }
            println!();
        }
    }

    println!("Tables:");
    for table in font.list_tables() {
        println!("  {table}");
    }

    Ok(())
}
