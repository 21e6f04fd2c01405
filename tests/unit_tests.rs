//! Unit tests for arc_extract modules
//!
//! These tests cover the building blocks shared by every dataset pipeline.

use arc_extract::{
    aggregation::{format_value, nanmean_series, round_to, CategoricalRule, Cell},
    config::{GridArgs, JobSpec, RunFile},
    coordinates::{arc_order, group_by_arc, load_coordinates, ArcId, CoordinateRecord},
    errors::ExtractError,
    grid::{nearest_index, normalize_longitude},
    parallel::ParallelConfig,
    pipelines::{Dataset, GridOutput, Job},
    raster_stack::{pool_by_label, DatePattern, RasterSamples},
    table::WideTable,
    time_axis::{decode_cf_times, label_format, monthly_axis, DateWindow, TimeAxisSpec},
};
use chrono::{NaiveDate, NaiveDateTime};
use ndarray::arr1;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

fn datetime(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, 0, 0)
        .unwrap()
}

#[test]
fn test_error_types() {
    let var_err = ExtractError::VariableNotFound {
        var: "Fw".to_string(),
    };
    assert!(format!("{}", var_err).contains("Variable 'Fw' not found"));

    let dim_err = ExtractError::DimensionNotFound {
        var: "Fw".to_string(),
        dim: "latitude".to_string(),
    };
    assert!(format!("{}", dim_err).contains("Dimension 'latitude' not found in variable 'Fw'"));

    let generic_err = ExtractError::from("Test error");
    assert_eq!(format!("{}", generic_err), "Test error");

    let time_err = ExtractError::InvalidTimeUnits {
        units: "fortnights".to_string(),
        message: "bad".to_string(),
    };
    assert!(format!("{}", time_err).contains("'fortnights'"));
}

#[test]
fn test_parallel_config() {
    let default_config = ParallelConfig::default();
    assert!(default_config.num_threads.is_none());

    let config_4 = ParallelConfig::with_threads(4);
    assert_eq!(config_4.num_threads, Some(4));

    let all_cores_config = ParallelConfig::all_cores();
    assert!(all_cores_config.num_threads.unwrap() > 0);

    assert!(default_config.current_threads() > 0);
}

#[test]
fn test_load_coordinates_skips_bad_rows() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let path = temp_dir.path().join("arcs.csv");
    fs::write(
        &path,
        "Arc_ID;longitude;latitude\n63662.0;10.5;50.1\nabc;1;2\n63662;10.6;50.2\n7.5;1;1\n101;-3.25;40\n",
    )
    .unwrap();

    let records = load_coordinates(&path).expect("Failed to load coordinates");
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].arc_id, ArcId(63662));
    assert_eq!(records[0].longitude, 10.5);
    assert_eq!(records[2].arc_id, ArcId(101));
    assert_eq!(records[2].latitude, 40.0);

    let groups = group_by_arc(&records);
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].arc_id, ArcId(63662));
    assert_eq!(groups[0].points.len(), 2);
    assert_eq!(arc_order(&records), vec![ArcId(63662), ArcId(101)]);
}

#[test]
fn test_load_coordinates_column_order_and_missing_column() {
    let temp_dir = tempdir().expect("Failed to create temp dir");

    let reordered = temp_dir.path().join("reordered.csv");
    fs::write(&reordered, "latitude;name;Arc_ID;longitude\n12.0;river;5;13.0\n").unwrap();
    let records = load_coordinates(&reordered).unwrap();
    assert_eq!(
        records,
        vec![CoordinateRecord {
            arc_id: ArcId(5),
            longitude: 13.0,
            latitude: 12.0
        }]
    );

    let broken = temp_dir.path().join("broken.csv");
    fs::write(&broken, "Arc_ID;lon;lat\n1;2;3\n").unwrap();
    match load_coordinates(&broken) {
        Err(ExtractError::Generic(msg)) => assert!(msg.contains("longitude")),
        other => panic!("Expected Generic error, got {:?}", other),
    }

    assert!(load_coordinates(&temp_dir.path().join("absent.csv")).is_err());
}

#[test]
fn test_arc_id_from_float() {
    assert_eq!(ArcId::from_f64(63662.0), Some(ArcId(63662)));
    assert_eq!(ArcId::from_f64(-4.0), Some(ArcId(-4)));
    assert_eq!(ArcId::from_f64(1.5), None);
    assert_eq!(ArcId::from_f64(f64::NAN), None);
    assert_eq!(ArcId(42).to_string(), "42");
}

#[test]
fn test_flag_count_rule() {
    let rule = CategoricalRule::FlagCount {
        flag: 2.0,
        background: vec![0.0, 1.0],
    };
    assert_eq!(rule.apply(&[0.0, 0.0, 1.0]), Cell::Count(0));
    assert_eq!(rule.apply(&[0.0, 2.0, 2.0]), Cell::Count(2));
    assert_eq!(rule.apply(&[]), Cell::NotAvailable);
    assert_eq!(rule.apply(&[0.0, 255.0]), Cell::NotAvailable);
    assert_eq!(rule.apply(&[2.0, 255.0]), Cell::Count(1));
    assert_eq!(Cell::NotAvailable.to_string(), "na");
}

#[test]
fn test_percentage_rule() {
    let rule = CategoricalRule::Percentage {
        target: 0.0,
        valid: vec![0.0, 1.0, 2.0],
        decimals: 1,
    };
    assert_eq!(rule.apply(&[0.0, 1.0, 2.0]), Cell::Value(33.3));
    assert_eq!(rule.apply(&[0.0, 0.0, 2.0, 9.0]).to_string(), "66.7");
    assert_eq!(rule.apply(&[0.0]).to_string(), "100.0");
    assert_eq!(rule.apply(&[9.0]), Cell::NotAvailable);
    assert_eq!(rule.apply(&[]), Cell::NotAvailable);
}

#[test]
fn test_valid_sum_and_count_rules() {
    let sum = CategoricalRule::ValidSum {
        valid: vec![0.0, 1.0],
    };
    let zeros = CategoricalRule::ValidCount {
        target: 0.0,
        valid: vec![0.0, 1.0],
    };
    let values = [1.0, 1.0, 0.0, 255.0];
    assert_eq!(sum.apply(&values), Cell::Count(2));
    assert_eq!(zeros.apply(&values), Cell::Count(1));
    assert_eq!(sum.apply(&[255.0]), Cell::NotAvailable);
    assert_eq!(zeros.apply(&[]), Cell::NotAvailable);
}

#[test]
fn test_nanmean_series() {
    let a = arr1(&[1.0_f32, f32::NAN, f32::NAN]);
    let b = arr1(&[3.0_f32, 4.0, f32::NAN]);
    let means = nanmean_series(&[a.view(), b.view()]);
    assert_eq!(means[0], 2.0);
    assert_eq!(means[1], 4.0);
    assert!(means[2].is_nan());

    assert_eq!(nanmean_series(&[]).len(), 0);
}

#[test]
fn test_value_formatting() {
    assert_eq!(format_value(1.0), "1.0");
    assert_eq!(format_value(0.1235), "0.1235");
    assert_eq!(format_value(66.7), "66.7");
    assert_eq!(format_value(f32::NAN), "");
    assert_eq!(Cell::Count(3).to_string(), "3");
    assert_eq!(Cell::Missing.to_string(), "");
    assert_eq!(round_to(0.123_456, 4), 0.1235);
    assert_eq!(round_to(66.666_666, 1), 66.7);
}

#[test]
fn test_table_merge_disjoint_ranges() {
    let first = WideTable::from_series(
        ArcId(1),
        vec![(1, Cell::Value(1.0)), (2, Cell::Value(2.0))],
    );
    let second = WideTable::from_series(ArcId(2), vec![(3, Cell::Count(3)), (4, Cell::NotAvailable)]);

    let merged = first.merge_outer(second);
    assert_eq!(merged.columns(), &[ArcId(1), ArcId(2)]);
    assert_eq!(merged.keys().copied().collect::<Vec<_>>(), vec![1, 2, 3, 4]);
    assert_eq!(merged.get(&3, ArcId(1)), Cell::Missing);
    assert_eq!(merged.get(&1, ArcId(2)), Cell::Missing);
    assert_eq!(merged.get(&4, ArcId(2)), Cell::NotAvailable);
    assert_eq!(merged.row_count(), 4);
    assert!(merged.get(&3, ArcId(1)).is_missing());
    assert!(Cell::Value(f32::NAN).is_missing());
    assert!(!Cell::NotAvailable.is_missing());
    assert!(!Cell::Count(0).is_missing());

    let mut out = Vec::new();
    merged.write_csv(&mut out, |k| k.to_string()).unwrap();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "Date;1;2\n1;1.0;\n2;2.0;\n3;;3\n4;;na\n"
    );
}

#[test]
fn test_table_rows_sorted_and_header_only() {
    let mut table = WideTable::new();
    table.insert("2020".to_string(), ArcId(7), Cell::Count(1));
    table.insert("2019".to_string(), ArcId(7), Cell::Count(0));
    let mut out = Vec::new();
    table.write_csv(&mut out, String::clone).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "Date;7\n2019;0\n2020;1\n");

    let empty: WideTable<String> = WideTable::with_columns(vec![ArcId(1), ArcId(2)]);
    assert!(empty.is_empty());
    let mut out = Vec::new();
    empty.write_csv(&mut out, String::clone).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "Date;1;2\n");
}

#[test]
fn test_decode_cf_times() {
    let times = decode_cf_times(&[0.0, 1.5, 31.0], "days since 2000-01-01 00:00:00").unwrap();
    assert_eq!(times[0], datetime(2000, 1, 1, 0));
    assert_eq!(times[1], datetime(2000, 1, 2, 12));
    assert_eq!(times[2], datetime(2000, 2, 1, 0));

    let hours = decode_cf_times(&[6.0], "Hours since 1990-1-1T00:00:00Z").unwrap();
    assert_eq!(hours[0], datetime(1990, 1, 1, 6));

    let months = decode_cf_times(&[0.0, 13.0], "months since 1901-01-01").unwrap();
    assert_eq!(months[1], datetime(1902, 2, 1, 0));

    assert!(decode_cf_times(&[0.5], "months since 1901-01-01").is_err());
    assert!(decode_cf_times(&[0.0], "fortnights since 1901-01-01").is_err());
    assert!(decode_cf_times(&[0.0], "days").is_err());
    assert!(decode_cf_times(&[f64::NAN], "days since 2000-01-01").is_err());
}

#[test]
fn test_monthly_axis_and_window() {
    let axis = monthly_axis(1901, 1, 3).unwrap();
    assert_eq!(axis[0], datetime(1901, 1, 1, 0));
    assert_eq!(axis[2], datetime(1901, 3, 1, 0));
    assert!(monthly_axis(1901, 13, 1).is_err());

    let window = DateWindow::new(NaiveDate::from_ymd_opt(1901, 2, 1), NaiveDate::from_ymd_opt(1901, 2, 28));
    let kept: Vec<_> = axis.iter().filter(|t| window.contains(t)).collect();
    assert_eq!(kept, vec![&datetime(1901, 2, 1, 0)]);
    assert!(DateWindow::default().is_unbounded());
}

#[test]
fn test_label_format() {
    assert_eq!(label_format(&[datetime(2000, 1, 1, 0)]), "%Y-%m-%d");
    assert_eq!(
        label_format(&[datetime(2000, 1, 1, 0), datetime(2000, 1, 1, 12)]),
        "%Y-%m-%d %H:%M:%S"
    );
}

#[test]
fn test_nearest_index() {
    let axis = [10.0, 11.0, 12.0, f64::NAN];
    assert_eq!(nearest_index(&axis, 11.2), Some(1));
    assert_eq!(nearest_index(&axis, 10.5), Some(0));
    assert_eq!(nearest_index(&axis, 99.0), Some(2));
    assert_eq!(nearest_index(&axis, f64::NAN), None);
    assert_eq!(nearest_index(&[], 1.0), None);

    let descending = [12.0, 11.0, 10.0];
    assert_eq!(nearest_index(&descending, 10.2), Some(2));
}

#[test]
fn test_normalize_longitude() {
    let wrapped = [0.0, 90.0, 180.0, 270.0, 359.5];
    assert_eq!(normalize_longitude(&wrapped, -10.0), 350.0);
    assert_eq!(normalize_longitude(&wrapped, 10.0), 10.0);
    let signed = [-180.0, 0.0, 179.5];
    assert_eq!(normalize_longitude(&signed, -10.0), -10.0);
}

#[test]
fn test_date_patterns() {
    assert_eq!(DatePattern::PrefixBeforeDash.label("2020-01-tile.tif"), Some("2020".to_string()));
    assert_eq!(DatePattern::PrefixBeforeDash.label("2020_01.tif"), Some("2020_01.tif".to_string()));
    assert_eq!(DatePattern::PrefixBeforeDash.label("-x.tif"), None);

    assert_eq!(
        DatePattern::CompactDate.label("GWP.20200131.v2.tif"),
        Some("2020-01-31".to_string())
    );
    assert_eq!(DatePattern::CompactDate.label("GWP.20201332.tif"), None);
    assert_eq!(DatePattern::CompactDate.label("GWP.20201332.20200105.tif"), None);
    assert_eq!(DatePattern::CompactDate.label("GWP_20200131.tif"), None);
}

#[test]
fn test_pool_by_label_merges_tiles() {
    let tile = |label: &str, arc: i64, values: Vec<f64>| RasterSamples {
        label: label.to_string(),
        values: HashMap::from([(ArcId(arc), values)]),
    };
    let pooled = pool_by_label(vec![
        tile("2020", 1, vec![2.0]),
        tile("2019", 1, vec![0.0]),
        tile("2020", 1, vec![2.0, 1.0]),
        tile("2020", 2, vec![0.0]),
    ]);

    assert_eq!(pooled.keys().cloned().collect::<Vec<_>>(), vec!["2019", "2020"]);
    assert_eq!(pooled["2020"][&ArcId(1)], vec![2.0, 2.0, 1.0]);
    assert_eq!(pooled["2020"][&ArcId(2)], vec![0.0]);
    assert!(!pooled["2019"].contains_key(&ArcId(2)));
}

#[test]
fn test_run_file_parsing() {
    let run = RunFile::parse(
        r#"{
            "threads": 2,
            "jobs": [
                { "dataset": "giems2", "file": "g.nc", "coordinates": "arcs.csv", "output": "out.csv" },
                { "dataset": "gsw", "tif_dir": "gsw", "coordinates": "arcs.csv" },
                { "dataset": "gwp", "tif_dir": "gwp", "coordinates": "arcs.csv", "output_dir": "out" }
            ]
        }"#,
    )
    .unwrap();
    assert_eq!(run.threads, Some(2));
    assert_eq!(run.jobs.len(), 3);
    assert_eq!(run.jobs[0].dataset(), Dataset::Giems2);

    match run.jobs[1].clone() {
        JobSpec::Gsw(args) => {
            assert_eq!(args.output, PathBuf::from("GSW_water_values.csv"));
            assert_eq!(args.no_observation_output, PathBuf::from("GSW_no_observation.csv"));
        }
        other => panic!("Expected GSW job, got {:?}", other),
    }

    match run.jobs[2].clone().into_job() {
        Job::Raster(job) => {
            assert_eq!(job.pattern, DatePattern::CompactDate);
            assert_eq!(job.outputs[0].1, PathBuf::from("out/GWP_water_values.csv"));
            assert_eq!(job.outputs[1].1, PathBuf::from("out/GWP_no_water_values.csv"));
        }
        other => panic!("Expected raster job, got {:?}", other),
    }

    assert!(matches!(
        RunFile::parse(r#"{ "jobs": [ { "dataset": "modis" } ] }"#),
        Err(ExtractError::ConfigError(_))
    ));
}

fn grid_args(output: &str) -> GridArgs {
    GridArgs {
        file: PathBuf::from("data.nc"),
        coordinates: PathBuf::from("arcs.csv"),
        output: PathBuf::from(output),
        variables: Vec::new(),
        lat_name: None,
        lon_name: None,
        time_name: None,
        round: None,
        start: None,
        end: None,
    }
}

#[test]
fn test_dataset_defaults() {
    let giems2 = grid_args("giems2.csv").into_job(Dataset::Giems2);
    assert_eq!(giems2.variables, vec!["Fw"]);
    assert_eq!(giems2.names.lat, "latitude");
    assert_eq!(giems2.round, Some(4));
    assert_eq!(giems2.output, GridOutput::File(PathBuf::from("giems2.csv")));

    let wad2m = grid_args("wad2m.csv").into_job(Dataset::Wad2m);
    assert_eq!(wad2m.names.lon, "lon");
    assert_eq!(wad2m.round, None);
    assert_eq!(wad2m.time_axis, TimeAxisSpec::Cf);

    let watergap = grid_args("out").into_job(Dataset::WaterGap);
    assert_eq!(watergap.variables, vec!["locwet_extent", "glowet_extent"]);
    assert_eq!(watergap.time_axis, TimeAxisSpec::MonthlyFrom { year: 1901, month: 1 });
    assert_eq!(
        watergap.output.path_for("locwet_extent"),
        PathBuf::from("out/locwet_extent_2003-2019.csv")
    );

    let mut custom = grid_args("custom");
    custom.variables = vec!["glowet_extent".to_string()];
    custom.start = NaiveDate::from_ymd_opt(2010, 1, 1);
    let custom = custom.into_job(Dataset::WaterGap);
    assert_eq!(
        custom.output.path_for("glowet_extent"),
        PathBuf::from("custom/glowet_extent_2010-2019.csv")
    );
    assert_eq!(custom.window.start, NaiveDate::from_ymd_opt(2010, 1, 1));
    assert_eq!(custom.window.end, NaiveDate::from_ymd_opt(2019, 12, 31));
}

#[test]
fn test_watergap_single_variable_writes_into_directory() {
    let run = RunFile::parse(
        r#"{ "jobs": [ { "dataset": "watergap", "file": "wg.nc", "coordinates": "arcs.csv",
                         "output": "outdir", "variables": ["locwet_extent"] } ] }"#,
    )
    .unwrap();

    match run.jobs[0].clone().into_job() {
        Job::Grid(job) => {
            assert_eq!(job.variables, vec!["locwet_extent"]);
            assert_eq!(
                job.output,
                GridOutput::PerVariable {
                    dir: PathBuf::from("outdir"),
                    suffix: "_2003-2019.csv".to_string(),
                }
            );
            assert_eq!(
                job.output.path_for("locwet_extent"),
                PathBuf::from("outdir/locwet_extent_2003-2019.csv")
            );
        }
        other => panic!("Expected grid job, got {:?}", other),
    }

    // single-variable products keep a plain output file
    let mut wad2m = grid_args("wad2m.csv");
    wad2m.variables = vec!["Fw".to_string()];
    assert_eq!(
        wad2m.into_job(Dataset::Wad2m).output,
        GridOutput::File(PathBuf::from("wad2m.csv"))
    );
}

#[test]
fn test_rounding_ties_to_even() {
    assert_eq!(round_to(6.25, 1), 6.2);
    assert_eq!(round_to(6.75, 1), 6.8);
    assert_eq!(round_to(0.03125, 4), 0.0312);
    assert_eq!(round_to(-2.5, 0), -2.0);
    assert_eq!(round_to(3.5, 0), 4.0);

    // one unobserved pixel out of sixteen
    let share = CategoricalRule::Percentage {
        target: 0.0,
        valid: vec![0.0, 1.0, 2.0],
        decimals: 1,
    };
    let mut pixels = vec![1.0; 15];
    pixels.push(0.0);
    assert_eq!(share.apply(&pixels).to_string(), "6.2");
}
