//! Benchmark of raster stack extraction with one thread versus all cores.
//!
//! A temporary stack of GeoTIFF files is written, then sampled at a set of
//! Arc_ID coordinates inside dedicated Rayon pools of different sizes.

use arc_extract::coordinates::{ArcId, CoordinateRecord};
use arc_extract::raster_stack::{extract_stack, list_rasters, DatePattern};
use std::fs::File;
use std::path::Path;
use std::time::Instant;
use tiff::encoder::{colortype, TiffEncoder};
use tiff::tags::Tag;

const SIZE: u32 = 1000;

fn write_raster(path: &Path, seed: u32) -> Result<(), Box<dyn std::error::Error>> {
    let data: Vec<u8> = (0..SIZE * SIZE).map(|i| ((i / 13 + seed) % 3) as u8).collect();
    let mut tiff = TiffEncoder::new(File::create(path)?)?;
    let mut image = tiff.new_image::<colortype::Gray8>(SIZE, SIZE)?;
    image
        .encoder()
        .write_tag(Tag::Unknown(33550), &[0.001_f64, 0.001, 0.0][..])?;
    image
        .encoder()
        .write_tag(Tag::Unknown(33922), &[0.0_f64, 0.0, 0.0, 0.0, 1.0, 0.0][..])?;
    image.write_data(&data)?;
    Ok(())
}

fn time_extraction(threads: usize, files: &[std::path::PathBuf], coords: &[CoordinateRecord]) -> f64 {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .expect("Failed to build thread pool");
    let start = Instant::now();
    let samples = pool.install(|| extract_stack(files, DatePattern::PrefixBeforeDash, coords));
    let duration = start.elapsed().as_secs_f64();
    println!("   Sampled {} files", samples.len());
    duration
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("🔬 arc_extract Raster Stack Benchmark");
    println!("======================================\n");

    let available_threads = num_cpus::get();
    println!("System has {} logical CPU cores available\n", available_threads);

    let dir = tempfile::tempdir()?;
    for day in 0..24 {
        write_raster(&dir.path().join(format!("2020{day:02}-stack.tif")), day)?;
    }
    let files = list_rasters(dir.path())?;

    let coords: Vec<CoordinateRecord> = (0..500)
        .map(|i| CoordinateRecord {
            arc_id: ArcId(i / 5),
            longitude: (i as f64 * 0.0017) % 1.0,
            latitude: (i as f64 * 0.0031) % 1.0,
        })
        .collect();

    println!("🐌 Sequential processing:");
    let seq_time = time_extraction(1, &files, &coords);
    println!("   ⏱️  Duration: {:.3} seconds\n", seq_time);

    println!("⚡ Parallel processing ({} threads):", available_threads);
    let par_time = time_extraction(available_threads, &files, &coords);
    println!("   ⏱️  Duration: {:.3} seconds", par_time);

    let speedup = seq_time / par_time;
    if speedup > 1.0 {
        println!("✅ Parallel processing is {:.2}x faster!", speedup);
    } else {
        println!("⚠️  Sequential was faster for this stack size");
    }

    Ok(())
}
