//! Geo filter builder: one typed geo predicate to one backend clause.

use serde_json::{json, Value};

use crate::clause::Clause;
use crate::error::DataError;
use crate::models::GeoParams;

/// Field every geo clause is issued against.
const GEO_FIELD: &str = "location";

/// Relation assumed for circle queries when none is supplied.
const DEFAULT_RELATION: &str = "within";

/// Builds the geo-shape clause for `params`.
///
/// Exactly one of four mutually exclusive shapes is selected by which
/// parameters are present: circle (`lon`+`lat`+`radius`), polygon or
/// linestring, or bbox. Anything else fails with
/// [`DataError::MissingGeoParameters`]. The relation is carried verbatim —
/// relation-vocabulary validation belongs to the API layer.
pub fn build_geo_clause(params: &GeoParams) -> Result<Clause, DataError> {
    if let (Some(lon), Some(lat), Some(radius)) = (params.lon, params.lat, params.radius) {
        let relation = params.relation.as_deref().unwrap_or(DEFAULT_RELATION);
        let shape = json!({
            "type": "Circle",
            "coordinates": [lon, lat],
            "radius": format!("{}m", radius),
        });
        return Ok(geo_shape_clause(shape, relation));
    }

    let geometry = params.geometry.as_deref().unwrap_or_default();
    let has_shape_params =
        params.relation.is_some() && params.coordinates.is_some() && params.geoproperty.is_some();

    if geometry.eq_ignore_ascii_case("polygon") || geometry.eq_ignore_ascii_case("linestring") {
        if !has_shape_params {
            return Err(DataError::MissingGeoParameters);
        }
        let coordinates = params.coordinates.as_ref().unwrap();
        if geometry.eq_ignore_ascii_case("polygon") && !ring_closes(coordinates) {
            return Err(DataError::CoordinateMismatch);
        }
        let shape = json!({ "type": geometry, "coordinates": coordinates });
        return Ok(geo_shape_clause(shape, params.relation.as_deref().unwrap()));
    }

    if geometry.eq_ignore_ascii_case("bbox") {
        if !has_shape_params {
            return Err(DataError::MissingGeoParameters);
        }
        let shape = json!({
            "type": "envelope",
            "coordinates": params.coordinates.as_ref().unwrap(),
        });
        return Ok(geo_shape_clause(shape, params.relation.as_deref().unwrap()));
    }

    Err(DataError::MissingGeoParameters)
}

fn geo_shape_clause(shape: Value, relation: &str) -> Clause {
    Clause::equivalent(json!({
        "geo_shape": {
            GEO_FIELD: {
                "shape": shape,
                "relation": relation,
            }
        }
    }))
}

/// True when the outer ring's first and last coordinate pairs are exactly
/// equal on both axes.
fn ring_closes(coordinates: &Value) -> bool {
    let Some(ring) = coordinates.get(0).and_then(Value::as_array) else {
        return false;
    };
    let (Some(first), Some(last)) = (ring.first(), ring.last()) else {
        return false;
    };
    let axis = |pair: &Value, i: usize| pair.get(i).and_then(Value::as_f64);
    match (axis(first, 0), axis(last, 0), axis(first, 1), axis(last, 1)) {
        (Some(fx), Some(lx), Some(fy), Some(ly)) => fx == lx && fy == ly,
        _ => false,
    }
}
