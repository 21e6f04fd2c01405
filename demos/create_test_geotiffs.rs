//! Creates sample GSW and GWP GeoTIFF stacks plus a coordinate table.
//!
//! Both stacks cover a 1x1 degree window at 0.01 degree resolution. Pixel
//! values follow the categorical codes of each product.

use std::fs::{self, File};
use std::path::Path;
use tiff::encoder::{colortype, TiffEncoder};
use tiff::tags::Tag;

const SIZE: u32 = 100;
const ORIGIN: (f64, f64) = (10.0, 50.0);
const PIXEL: f64 = 0.01;

fn write_geotiff(path: &Path, data: &[u8]) -> Result<(), Box<dyn std::error::Error>> {
    let mut tiff = TiffEncoder::new(File::create(path)?)?;
    let mut image = tiff.new_image::<colortype::Gray8>(SIZE, SIZE)?;
    image
        .encoder()
        .write_tag(Tag::Unknown(33550), &[PIXEL, PIXEL, 0.0][..])?;
    image.encoder().write_tag(
        Tag::Unknown(33922),
        &[0.0, 0.0, 0.0, ORIGIN.0, ORIGIN.1, 0.0][..],
    )?;
    image.write_data(data)?;
    Ok(())
}

fn pattern(seed: usize, codes: &[u8]) -> Vec<u8> {
    (0..(SIZE * SIZE) as usize)
        .map(|i| codes[(i / 7 + seed * 3 + i % 11) % codes.len()])
        .collect()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let gsw_dir = Path::new("test_gsw");
    let gwp_dir = Path::new("test_gwp");
    fs::create_dir_all(gsw_dir)?;
    fs::create_dir_all(gwp_dir)?;

    println!("🔨 Creating GSW stack in {}", gsw_dir.display());
    for year in 2015..2020 {
        // two tiles per year share the date label
        for tile in ["a", "b"] {
            let path = gsw_dir.join(format!("{year}-{tile}.tif"));
            write_geotiff(&path, &pattern(year as usize, &[0, 1, 1, 2]))?;
        }
    }

    println!("🔨 Creating GWP stack in {}", gwp_dir.display());
    for day in 1..=10 {
        let path = gwp_dir.join(format!("GWP.202001{day:02}.tif"));
        write_geotiff(&path, &pattern(day, &[0, 1, 255]))?;
    }

    fs::write(
        "test_raster_arcs.csv",
        "Arc_ID;longitude;latitude\n\
         1;10.105;49.905\n\
         1;10.115;49.905\n\
         2;10.505;49.505\n\
         3;12.000;48.000\n",
    )?;

    println!("✅ Successfully created 10 GSW and 10 GWP rasters");
    println!("\n🧪 Try the extraction with:");
    println!("   cargo run -- gsw --tif-dir test_gsw -c test_raster_arcs.csv");
    println!("   cargo run -- gwp --tif-dir test_gwp -c test_raster_arcs.csv --output-dir gwp_out");

    Ok(())
}
