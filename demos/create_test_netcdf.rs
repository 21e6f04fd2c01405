//! Creates a sample GIEMS-2 style NetCDF file and a matching coordinate table.
//!
//! The cube holds a monthly `Fw` variable on a coarse global grid with a few
//! masked cells, so every branch of the mean extraction can be tried out.

use ndarray::{Array1, Array3};
use netcdf::create;
use std::fs;
use std::path::Path;

const FILL: f32 = -9999.0;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let output_path = Path::new("test_giems2.nc");
    let coord_path = Path::new("test_arcs.csv");

    println!("🔨 Creating test NetCDF file: {}", output_path.display());

    // Remove existing file if it exists
    if output_path.exists() {
        fs::remove_file(output_path)?
    }

    let mut file = create(output_path)?;

    file.add_attribute("title", "Test inundation fraction")?;
    file.add_attribute("created_by", "create_test_netcdf.rs")?;

    file.add_dimension("time", 24)?; // two years of monthly steps
    file.add_dimension("latitude", 18)?;
    file.add_dimension("longitude", 36)?;

    {
        let mut time_var = file.add_variable::<f64>("time", &["time"])?;
        time_var.put_attribute("units", "months since 1993-01-01")?;
        time_var.put_attribute("calendar", "standard")?;
        let time_data = Array1::from_iter((0..24).map(f64::from));
        time_var.put(time_data.view(), ..)?;
    }

    {
        let mut lat_var = file.add_variable::<f32>("latitude", &["latitude"])?;
        lat_var.put_attribute("units", "degrees_north")?;
        let lat_data = Array1::from_iter((0..18).map(|i| 85.0 - i as f32 * 10.0));
        lat_var.put(lat_data.view(), ..)?;
    }

    {
        let mut lon_var = file.add_variable::<f32>("longitude", &["longitude"])?;
        lon_var.put_attribute("units", "degrees_east")?;
        let lon_data = Array1::from_iter((0..36).map(|i| -175.0 + i as f32 * 10.0));
        lon_var.put(lon_data.view(), ..)?;
    }

    {
        let mut fw_var = file.add_variable::<f32>("Fw", &["time", "latitude", "longitude"])?;
        fw_var.put_attribute("long_name", "inundated fraction")?;
        fw_var.put_attribute("_FillValue", FILL)?;

        let data = Array3::from_shape_fn((24, 18, 36), |(t, i, j)| {
            // open ocean rows stay masked
            if i < 2 || i > 15 {
                return FILL;
            }
            let season = (t as f32 * std::f32::consts::PI / 6.0).sin() * 0.05;
            let base = ((i * 36 + j) % 17) as f32 / 100.0;
            (base + season).max(0.0)
        });
        fw_var.put(data.view(), ..)?;
    }

    fs::write(
        coord_path,
        "Arc_ID;longitude;latitude\n\
         101;12.3;45.6\n\
         101;13.1;44.9\n\
         202;-60.2;-3.4\n\
         303;100.0;88.0\n",
    )?;

    println!("✅ Successfully created test NetCDF file with:");
    println!("   📏 Dimensions: time(24), latitude(18), longitude(36)");
    println!("   📈 Variables: time, latitude, longitude, Fw");
    println!("✅ Coordinate table written to {}", coord_path.display());
    println!("\n🧪 Try the extraction with:");
    println!(
        "   cargo run -- giems2 -f {} -c {} -o giems2_arcs.csv",
        output_path.display(),
        coord_path.display()
    );

    Ok(())
}
