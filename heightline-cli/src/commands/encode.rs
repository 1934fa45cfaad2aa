use anyhow::{Context, Result};
use heightline::{polyline, shape};

use super::{parse_shape, read_shape_file, ShapeArgs};

pub fn run(args: ShapeArgs) -> Result<()> {
    let path = if let Some(encoded) = &args.encoded {
        shape::from_encoded(encoded)
    } else {
        let raw = match (&args.shape, &args.input) {
            (Some(value), _) => parse_shape(value)?,
            (None, Some(input)) => read_shape_file(input, &args.lat_col, &args.lon_col)?,
            (None, None) => Vec::new(),
        };
        shape::normalize(&raw)
    }
    .context("Invalid shape")?;

    println!("{}", polyline::encode(&path));
    Ok(())
}
