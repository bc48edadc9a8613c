//! Geographic <-> planar coordinate transforms.

use proj4rs::{proj::Proj as Proj4, transform::transform};
use tracing::debug;

use crate::error::{BoundaryError, Result};

/// Source geographic CRS for lon/lat input (NAD83, EPSG:4269)
const GEOGRAPHIC_PROJ4: &str = "+proj=longlat +datum=NAD83 +no_defs";

/// Default planar CRS: US National Atlas Equal Area, meters
pub const DEFAULT_PLANAR_EPSG: u32 = 2163;

/// PROJ.4 definition for the planar systems the resolver can work in.
pub fn planar_proj4(epsg: u32) -> Result<&'static str> {
    match epsg {
        // Clarke 1866 authalic sphere. The near-zero flattening keeps proj4rs
        // on its ellipsoidal laea path; its pure-sphere path is off in northing.
        2163 => Ok("+proj=laea +lat_0=45 +lon_0=-100 +x_0=0 +y_0=0 +a=6370997 +rf=1e12 +units=m +no_defs"),
        5070 => Ok("+proj=aea +lat_0=23 +lon_0=-96 +lat_1=29.5 +lat_2=45.5 +x_0=0 +y_0=0 +datum=NAD83 +units=m +no_defs"),
        3857 => Ok("+proj=merc +a=6378137 +b=6378137 +lat_ts=0 +lon_0=0 +x_0=0 +y_0=0 +k=1 +units=m +no_defs"),
        other => Err(BoundaryError::UnsupportedCrs(other)),
    }
}

/// Converts lon/lat degrees to the planar CRS the region layers are stored in.
pub struct Projector {
    epsg: u32,
    geographic: Proj4,
    planar: Proj4,
}

impl Projector {
    pub fn new(epsg: u32) -> Result<Self> {
        let geographic = Proj4::from_proj_string(GEOGRAPHIC_PROJ4)
            .map_err(|e| BoundaryError::Projection(format!("{GEOGRAPHIC_PROJ4}: {e}")))?;
        let proj_string = planar_proj4(epsg)?;
        let planar = Proj4::from_proj_string(proj_string)
            .map_err(|e| BoundaryError::Projection(format!("{proj_string}: {e}")))?;

        debug!("Projector ready for EPSG:{}", epsg);
        Ok(Self {
            epsg,
            geographic,
            planar,
        })
    }

    pub fn epsg(&self) -> u32 {
        self.epsg
    }

    /// Project (lon, lat) in degrees to planar (x, y) in meters.
    pub fn to_planar(&self, lon: f64, lat: f64) -> Result<(f64, f64)> {
        if !lon.is_finite() || !lat.is_finite() || lat.abs() > 90.0 || lon.abs() > 180.0 {
            return Err(BoundaryError::InvalidParameter(format!(
                "coordinates out of range: lat={lat}, lon={lon}"
            )));
        }
        let mut point = (lon.to_radians(), lat.to_radians(), 0.0);
        transform(&self.geographic, &self.planar, &mut point)
            .map_err(|e| BoundaryError::Projection(e.to_string()))?;
        Ok((point.0, point.1))
    }

    /// Inverse of [`Projector::to_planar`], returning (lon, lat) in degrees.
    pub fn to_geographic(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        let mut point = (x, y, 0.0);
        transform(&self.planar, &self.geographic, &mut point)
            .map_err(|e| BoundaryError::Projection(e.to_string()))?;
        Ok((point.0.to_degrees(), point.1.to_degrees()))
    }
}
