//! Sensor extraction
//!
//! A sensor is the projection of a flow solution onto the physical quantity
//! (or pair of quantities) that drives the error estimate.

use std::fmt;
use std::str::FromStr;

use log::debug;

use crate::DataError;
use crate::mesh::{FieldData, MeshData};

/// Physical quantity used as the adaptation sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorKind {
    Mach,
    Pressure,
    MachPressure,
}

impl SensorKind {
    /// (source column tag, output column tag) pairs, in output order
    fn columns(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::Mach => &[("Mach", "Mach")],
            Self::Pressure => &[("Pressure", "Pres")],
            Self::MachPressure => &[("Mach", "Mach"), ("Pressure", "Pres")],
        }
    }
}

impl FromStr for SensorKind {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "MACH" => Ok(Self::Mach),
            "PRES" => Ok(Self::Pressure),
            "MACH_PRES" => Ok(Self::MachPressure),
            _ => Err(DataError::UnknownSensor { name: s.to_string() }),
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Mach => "MACH",
            Self::Pressure => "PRES",
            Self::MachPressure => "MACH_PRES",
        };
        write!(f, "{}", name)
    }
}

/// Project the field of `solution` onto the columns of `kind`
///
/// The result keeps the dimension, vertices and markers of the source and
/// carries no elements.
pub fn create_sensor(solution: &MeshData, kind: SensorKind) -> Result<MeshData, DataError> {
    debug!("create_sensor: kind={} rows={}", kind, solution.field.len());
    let field = &solution.field;

    let mut indices = Vec::new();
    let mut tags = Vec::new();
    for (source, header) in kind.columns() {
        let index = field.column_index(source).ok_or_else(|| DataError::MissingTag {
            tag: source.to_string(),
            available: field.tags().to_vec(),
        })?;
        indices.push(index);
        tags.push(header.to_string());
    }

    let rows = field
        .rows()
        .iter()
        .map(|row| indices.iter().map(|&i| row[i]).collect())
        .collect();

    Ok(MeshData {
        dimension: solution.dimension,
        vertices: solution.vertices.clone(),
        triangles: Vec::new(),
        tetrahedra: Vec::new(),
        edges: Vec::new(),
        markers: solution.markers.clone(),
        field: FieldData::new(tags, rows)?,
    })
}

/// Same as [`create_sensor`], with the kind given by name
pub fn create_sensor_named(solution: &MeshData, name: &str) -> Result<MeshData, DataError> {
    create_sensor(solution, name.parse()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::RawMesh;

    fn solution() -> MeshData {
        MeshData::from_raw(RawMesh {
            vertices: vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            triangles: vec![1, 2, 3, 0],
            solution: vec![1.2, 101325.0, 0.8, 1.1, 99000.0, 0.9, 1.0, 98000.0, 1.3],
            solution_tags: vec!["Density".to_string(), "Pressure".to_string(), "Mach".to_string()],
            markers: vec!["2".to_string()],
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_mach_sensor_is_exact_column() {
        let source = solution();
        let sensor = create_sensor(&source, SensorKind::Mach).unwrap();

        assert_eq!(sensor.field.tags(), &["Mach".to_string()]);
        assert_eq!(sensor.field.width(), 1);
        assert_eq!(sensor.field.column(0), Some(vec![0.8, 0.9, 1.3]));
        assert_eq!(sensor.field.column(0), source.field.column(2));
        assert!(sensor.triangles.is_empty());
    }

    #[test]
    fn test_mach_pres_sensor_keeps_order() {
        let sensor = create_sensor(&solution(), SensorKind::MachPressure).unwrap();

        assert_eq!(sensor.field.tags(), &["Mach".to_string(), "Pres".to_string()]);
        assert_eq!(sensor.field.rows()[0], vec![0.8, 101325.0]);
    }

    #[test]
    fn test_unknown_sensor_name() {
        let err = create_sensor_named(&solution(), "VORTICITY").unwrap_err();
        assert!(matches!(err, DataError::UnknownSensor { ref name } if name == "VORTICITY"));
    }

    #[test]
    fn test_missing_source_column() {
        let mut source = solution();
        source.field = FieldData::new(vec!["Density".to_string()], vec![vec![1.0], vec![2.0], vec![3.0]]).unwrap();

        let err = create_sensor(&source, SensorKind::Pressure).unwrap_err();
        assert!(matches!(err, DataError::MissingTag { ref tag, .. } if tag == "Pressure"));
    }

    #[test]
    fn test_kind_parse_and_display() {
        for name in ["MACH", "PRES", "MACH_PRES"] {
            let kind: SensorKind = name.parse().unwrap();
            assert_eq!(kind.to_string(), name);
        }
        assert_eq!("mach".parse::<SensorKind>().unwrap(), SensorKind::Mach);
    }
}
