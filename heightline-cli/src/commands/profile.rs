use anyhow::{Context, Result};
use heightline::{HeightLimits, HeightRequest, HeightResponse};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use super::{parse_shape, read_shape_file, ServiceOptions, ShapeArgs};

/// Shapes at least this long get a spinner while sampling.
const SPINNER_THRESHOLD: usize = 10_000;

/// How the profile is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    GeoJson,
}

impl OutputFormat {
    pub fn from_flags(json: bool, geojson: bool) -> Self {
        match (json, geojson) {
            (true, _) => OutputFormat::Json,
            (false, true) => OutputFormat::GeoJson,
            (false, false) => OutputFormat::Table,
        }
    }
}

pub struct ProfileOptions {
    pub resample: Option<f64>,
    pub range: bool,
    pub precision: u8,
    pub id: Option<String>,
    pub format: OutputFormat,
    pub no_track: bool,
}

pub fn run(
    service: ServiceOptions,
    limits: HeightLimits,
    shape: ShapeArgs,
    options: ProfileOptions,
) -> Result<()> {
    let service = service.build()?;
    let request = build_request(shape, &options)?;

    // Resampling can grow small shapes, so estimate from either signal
    let spinner = (request.shape.len() >= SPINNER_THRESHOLD || request.resample_distance.is_some())
        .then(|| -> Result<ProgressBar> {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?,
            );
            pb.set_message("Sampling elevations");
            pb.enable_steady_tick(Duration::from_millis(100));
            Ok(pb)
        })
        .transpose()?;

    let result = heightline::height(request, &service, &limits);

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    let response = result.context("Failed to compute elevation profile")?;

    match options.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&response)?),
        OutputFormat::GeoJson => {
            let geometry = heightline::geojson::profile_to_geometry(&response);
            println!("{}", serde_json::to_string_pretty(&geometry)?);
        }
        OutputFormat::Table => print!("{}", render_table(&response, options.precision)),
    }

    Ok(())
}

fn build_request(args: ShapeArgs, options: &ProfileOptions) -> Result<HeightRequest> {
    let shape = match (&args.shape, &args.input) {
        (Some(value), _) => parse_shape(value)?,
        (None, Some(input)) => read_shape_file(input, &args.lat_col, &args.lon_col)?,
        (None, None) => Vec::new(),
    };

    Ok(HeightRequest {
        id: options.id.clone(),
        shape,
        encoded_polyline: args.encoded,
        resample_distance: options.resample,
        range: options.range,
        height_precision: options.precision,
        do_not_track: options.no_track,
    })
}

/// One line per sample: lat, lon, [range,] height. Missing heights print as `void`.
fn render_table(response: &HeightResponse, precision: u8) -> String {
    let precision = usize::from(precision.min(heightline::height::MAX_HEIGHT_PRECISION));
    let fmt_height = |h: Option<f64>| match h {
        Some(h) => format!("{:.*}", precision, h),
        None => "void".to_string(),
    };

    let mut out = String::new();
    match (&response.range_height, &response.height) {
        (Some(pairs), _) => {
            out.push_str("lat\tlon\trange_m\theight_m\n");
            for (p, pair) in response.shape.iter().zip(pairs) {
                out.push_str(&format!(
                    "{:.6}\t{:.6}\t{:.0}\t{}\n",
                    p.lat,
                    p.lon,
                    pair.0,
                    fmt_height(pair.1)
                ));
            }
        }
        (None, Some(heights)) => {
            out.push_str("lat\tlon\theight_m\n");
            for (p, h) in response.shape.iter().zip(heights) {
                out.push_str(&format!("{:.6}\t{:.6}\t{}\n", p.lat, p.lon, fmt_height(*h)));
            }
        }
        (None, None) => {}
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use heightline::{assemble, Point, NO_DATA_VALUE};

    fn args(shape: &str) -> ShapeArgs {
        ShapeArgs {
            shape: Some(shape.to_string()),
            encoded: None,
            input: None,
            lat_col: "lat".to_string(),
            lon_col: "lon".to_string(),
        }
    }

    fn options() -> ProfileOptions {
        ProfileOptions {
            resample: Some(30.0),
            range: true,
            precision: 1,
            id: Some("trail".to_string()),
            format: OutputFormat::Table,
            no_track: true,
        }
    }

    #[test]
    fn test_build_request() {
        let request = build_request(args("35.5,138.5;35.6,138.6"), &options()).unwrap();
        assert_eq!(request.shape.len(), 2);
        assert_eq!(request.id.as_deref(), Some("trail"));
        assert_eq!(request.resample_distance, Some(30.0));
        assert!(request.range);
        assert!(request.do_not_track);
        assert!(request.encoded_polyline.is_none());
    }

    #[test]
    fn test_build_request_encoded() {
        let shape = ShapeArgs {
            shape: None,
            encoded: Some("_izlhA~rlgdF".to_string()),
            ..args("")
        };
        let request = build_request(shape, &options()).unwrap();
        assert!(request.shape.is_empty());
        assert_eq!(request.encoded_polyline.as_deref(), Some("_izlhA~rlgdF"));
    }

    #[test]
    fn test_output_format_flags() {
        assert_eq!(OutputFormat::from_flags(false, false), OutputFormat::Table);
        assert_eq!(OutputFormat::from_flags(true, false), OutputFormat::Json);
        assert_eq!(OutputFormat::from_flags(false, true), OutputFormat::GeoJson);
    }

    #[test]
    fn test_render_table() {
        let path = vec![Point::new(138.5, 35.5), Point::new(138.6, 35.5)];
        let response = assemble(None, path.clone(), None, vec![512.34, NO_DATA_VALUE], None, 1);
        let table = render_table(&response, 1);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "lat\tlon\theight_m");
        assert_eq!(lines[1], "35.500000\t138.500000\t512.3");
        assert_eq!(lines[2], "35.500000\t138.600000\tvoid");

        let response = assemble(None, path, None, vec![1.0, 2.0], Some(vec![0.0, 9050.4]), 0);
        let table = render_table(&response, 0);
        assert!(table.starts_with("lat\tlon\trange_m\theight_m\n"));
        assert!(table.contains("\t9050\t2\n"));
    }
}
