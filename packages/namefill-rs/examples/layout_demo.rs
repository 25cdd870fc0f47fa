use anyhow::Result;
use namefill_rs::prelude::*;

fn main() -> Result<()> {
    // Words as tesseract would report them on a 200 dpi US Letter scan
    let words = vec![
        Word::new("Registration", BoundingBox::new(620.0, 120.0, 900.0, 160.0), 96.0),
        Word::new("Form", BoundingBox::new(920.0, 120.0, 1040.0, 160.0), 95.0),
        Word::new("Full", BoundingBox::new(100.0, 300.0, 170.0, 330.0), 91.0),
        Word::new("Name:", BoundingBox::new(180.0, 302.0, 280.0, 330.0), 88.0),
        Word::new("__________________", BoundingBox::new(290.0, 305.0, 900.0, 332.0), 60.0),
        Word::new("Date:", BoundingBox::new(100.0, 400.0, 180.0, 428.0), 93.0),
    ];
    let image = ImageSize {
        width: 1700,
        height: 2200,
    };
    let page = PageSize {
        width: 612.0,
        height: 792.0,
    };
    let config = LocatorConfig::default();

    println!("Lines:");
    for line in group_lines(&words, config.line_tolerance_px) {
        println!("  [{}] {}", line.key, line.joined_text);
    }
    println!();

    let detected = detect_region(&words, image, page, &config);
    let point = resolve(detected, &[] as &[&str], page, config.start_font_size, &config);
    println!(
        "Region: {} (confidence {:.1}) at ({:.1}, {:.1}) {:.1}x{:.1}",
        point.region.strategy,
        point.region.confidence,
        point.region.x,
        point.region.y,
        point.region.width,
        point.region.height
    );

    for name in ["Jane Doe", "Maximiliana Alexandra Konstantinopoulou-Vandenberghe"] {
        let instruction = fit_text(
            point.x,
            point.y,
            name,
            page.width,
            &FitLimits::from(&config),
            &Helvetica,
        )?;
        println!(
            "  {:?}: size {} width {:.1}{}",
            instruction.text,
            instruction.font_size,
            instruction.width,
            if instruction.overflows { " (overflows)" } else { "" }
        );
    }

    Ok(())
}
