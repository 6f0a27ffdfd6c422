//! Feature placement section.
//!
//! ```text
//! i32 type_count
//! i32 feature_count
//! type_count × NUL-terminated type names
//! feature_count × { i32 type, f32 x, f32 y, f32 z, f32 rotation, f32 scale }
//! ```

use super::error::SmfError;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use crate::binary::{ReadFieldExt, WriteFieldExt};
use std::fs;
use std::io::{Read, Write};
use std::path::Path;

const FEATURE_HEADER_BYTES: u64 = 8;
const FEATURE_RECORD_BYTES: u64 = 24;
const MAX_TYPE_NAME: usize = 256;

/// One placed feature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Feature {
    /// Index into [`FeatureList::types`]
    pub type_index: u32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub rotation: f32,
    pub scale: f32,
}

/// Feature type table plus placements.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureList {
    types: Vec<String>,
    features: Vec<Feature>,
}

impl FeatureList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn types(&self) -> &[String] {
        &self.types
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Index of `name` in the type table, appending it if new.
    pub fn type_index(&mut self, name: &str) -> u32 {
        if let Some(i) = self.types.iter().position(|t| t == name) {
            return i as u32;
        }
        self.types.push(name.to_string());
        (self.types.len() - 1) as u32
    }

    pub fn add(&mut self, name: &str, x: f32, y: f32, z: f32, rotation: f32, scale: f32) {
        let type_index = self.type_index(name);
        self.features.push(Feature {
            type_index,
            x,
            y,
            z,
            rotation,
            scale,
        });
    }

    pub fn type_name(&self, feature: &Feature) -> Option<&str> {
        self.types.get(feature.type_index as usize).map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.types.clear();
        self.features.clear();
    }

    pub fn byte_len(&self) -> u64 {
        let names: u64 = self.types.iter().map(|t| t.len() as u64 + 1).sum();
        FEATURE_HEADER_BYTES + names + self.features.len() as u64 * FEATURE_RECORD_BYTES
    }

    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self, SmfError> {
        let type_count = reader.read_i32::<LittleEndian>()?.max(0) as usize;
        let feature_count = reader.read_i32::<LittleEndian>()?.max(0) as usize;

        let mut types = Vec::with_capacity(type_count.min(4096));
        for _ in 0..type_count {
            types.push(reader.read_cstring(MAX_TYPE_NAME)?);
        }

        let mut features = Vec::with_capacity(feature_count.min(65536));
        for index in 0..feature_count {
            let type_index = reader.read_i32::<LittleEndian>()?;
            if type_index < 0 || type_index as usize >= types.len() {
                return Err(SmfError::FeatureTypeOutOfRange {
                    index,
                    type_index,
                    count: types.len(),
                });
            }
            features.push(Feature {
                type_index: type_index as u32,
                x: reader.read_f32::<LittleEndian>()?,
                y: reader.read_f32::<LittleEndian>()?,
                z: reader.read_f32::<LittleEndian>()?,
                rotation: reader.read_f32::<LittleEndian>()?,
                scale: reader.read_f32::<LittleEndian>()?,
            });
        }

        Ok(Self { types, features })
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), SmfError> {
        writer.write_i32::<LittleEndian>(self.types.len() as i32)?;
        writer.write_i32::<LittleEndian>(self.features.len() as i32)?;
        for name in &self.types {
            writer.write_cstring(name)?;
        }
        for f in &self.features {
            writer.write_i32::<LittleEndian>(f.type_index as i32)?;
            for v in [f.x, f.y, f.z, f.rotation, f.scale] {
                writer.write_f32::<LittleEndian>(v)?;
            }
        }
        Ok(())
    }

    /// Append features from CSV text: `name,x,y,z[,rotation[,scale]]`.
    ///
    /// Blank lines and lines starting with `#` are skipped. Rotation defaults
    /// to 0 and scale to 1. Returns the number of features added.
    pub fn extend_from_csv(&mut self, text: &str) -> Result<usize, SmfError> {
        let mut parsed = Vec::new();
        for (n, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let cols: Vec<&str> = line.split(',').map(str::trim).collect();
            if cols.len() < 4 || cols.len() > 6 {
                return Err(SmfError::FeatureCsv {
                    line: n + 1,
                    reason: format!("expected 4 to 6 columns, found {}", cols.len()),
                });
            }
            if cols[0].is_empty() {
                return Err(SmfError::FeatureCsv {
                    line: n + 1,
                    reason: "empty feature name".to_string(),
                });
            }
            let num = |i: usize, default: f32| -> Result<f32, SmfError> {
                match cols.get(i) {
                    None => Ok(default),
                    Some(v) => v.parse::<f32>().map_err(|_| SmfError::FeatureCsv {
                        line: n + 1,
                        reason: format!("invalid number '{}'", v),
                    }),
                }
            };
            parsed.push((
                cols[0].to_string(),
                num(1, 0.0)?,
                num(2, 0.0)?,
                num(3, 0.0)?,
                num(4, 0.0)?,
                num(5, 1.0)?,
            ));
        }

        let added = parsed.len();
        for (name, x, y, z, rotation, scale) in parsed {
            self.add(&name, x, y, z, rotation, scale);
        }
        Ok(added)
    }

    pub fn load_csv(&mut self, path: impl AsRef<Path>) -> Result<usize, SmfError> {
        self.extend_from_csv(&fs::read_to_string(path)?)
    }

    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        for f in &self.features {
            let name = self.type_name(f).unwrap_or_default();
            out.push_str(&format!(
                "{},{},{},{},{},{}\n",
                name, f.x, f.y, f.z, f.rotation, f.scale
            ));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_types_are_shared() {
        let mut list = FeatureList::new();
        list.add("tree", 1.0, 0.0, 1.0, 0.0, 1.0);
        list.add("rock", 2.0, 0.0, 2.0, 0.0, 1.0);
        list.add("tree", 3.0, 0.0, 3.0, 0.0, 1.0);
        assert_eq!(list.types(), ["tree", "rock"]);
        assert_eq!(list.features()[2].type_index, 0);
        assert_eq!(list.byte_len(), 8 + 5 + 5 + 3 * 24);
    }

    #[test]
    fn test_binary_roundtrip_length() {
        let mut list = FeatureList::new();
        list.add("geovent", 100.0, 5.0, 200.0, 1.5, 1.0);
        let mut buf = Vec::new();
        list.write_to(&mut buf).unwrap();
        assert_eq!(buf.len() as u64, list.byte_len());
        assert_eq!(FeatureList::read_from(&mut Cursor::new(buf)).unwrap(), list);
    }

    #[test]
    fn test_type_out_of_range() {
        let mut buf = Vec::new();
        buf.write_i32::<LittleEndian>(1).unwrap();
        buf.write_i32::<LittleEndian>(1).unwrap();
        buf.write_cstring("tree").unwrap();
        buf.write_i32::<LittleEndian>(3).unwrap();
        buf.extend_from_slice(&[0u8; 20]);
        assert!(matches!(
            FeatureList::read_from(&mut Cursor::new(buf)),
            Err(SmfError::FeatureTypeOutOfRange {
                index: 0,
                type_index: 3,
                count: 1
            })
        ));
    }

    #[test]
    fn test_csv_defaults_and_comments() {
        let mut list = FeatureList::new();
        let added = list
            .extend_from_csv("# name,x,y,z,rot,scale\ntree,1,2,3\n\nrock,4,5,6,0.5,2\n")
            .unwrap();
        assert_eq!(added, 2);
        assert_eq!(list.features()[0].rotation, 0.0);
        assert_eq!(list.features()[0].scale, 1.0);
        assert_eq!(list.features()[1].scale, 2.0);
        assert_eq!(list.to_csv(), "tree,1,2,3,0,1\nrock,4,5,6,0.5,2\n");
    }

    #[test]
    fn test_csv_error_leaves_list_unchanged() {
        let mut list = FeatureList::new();
        let err = list.extend_from_csv("tree,1,2,3\nrock,x,5,6\n").unwrap_err();
        assert!(matches!(err, SmfError::FeatureCsv { line: 2, .. }));
        assert!(list.is_empty());
    }
}
