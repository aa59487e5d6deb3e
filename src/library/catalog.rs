//! In-memory profile catalog with built-in shapes and an XML loader.
//!
//! ```xml
//! <profiles>
//!   <profile name="flat" closed="true">
//!     <point x="-0.5" y="-0.2"/>
//!     <point x="0.5" y="-0.2"/>
//!     <point x="0.5" y="0.2"/>
//!     <point x="-0.5" y="0.2"/>
//!   </profile>
//! </profiles>
//! ```

use std::collections::BTreeMap;
use std::f64::consts::{PI, TAU};

use quick_xml::de::from_str;
use serde::Deserialize;
use thiserror::Error;

use crate::geom::{Curve, Plane, Point3};

use super::ProfileLibrary;

/// Vertices used for the curved built-in profiles.
const BUILTIN_SEGMENTS: usize = 32;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("profile XML could not be read: {0}")]
    Xml(#[from] quick_xml::DeError),
    #[error("profile without a name")]
    MissingName,
    #[error("profile `{name}` has too few distinct points")]
    DegenerateProfile { name: String },
    #[error("profile `{name}` must be closed")]
    OpenProfile { name: String },
}

#[derive(Debug, Deserialize)]
struct CatalogDocument {
    #[serde(rename = "profile", default)]
    profiles: Vec<ProfileElement>,
}

#[derive(Debug, Deserialize)]
struct ProfileElement {
    #[serde(rename = "@name", default)]
    name: String,
    #[serde(rename = "@closed", default = "default_closed")]
    closed: bool,
    #[serde(rename = "point", default)]
    points: Vec<PointElement>,
}

#[derive(Debug, Deserialize)]
struct PointElement {
    #[serde(rename = "@x")]
    x: f64,
    #[serde(rename = "@y")]
    y: f64,
    #[serde(rename = "@z", default)]
    z: f64,
}

fn default_closed() -> bool {
    true
}

/// Case-insensitive catalog. Names keep the spelling they were inserted with.
#[derive(Debug, Clone, Default)]
pub struct ProfileCatalog {
    entries: BTreeMap<String, (String, Curve)>,
}

impl ProfileCatalog {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Catalog preloaded with `round`, `square`, `d-shape`, `comfort`,
    /// `knife-edge` and `oval`, each about one unit across and wound
    /// counter-clockwise.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut catalog = Self::empty();
        for (name, curve) in builtin_profiles() {
            catalog.insert(name, curve);
        }
        catalog
    }

    /// Parses a catalog document into a new catalog without built-ins.
    pub fn from_xml_str(xml: &str) -> Result<Self, CatalogError> {
        let mut catalog = Self::empty();
        catalog.load_xml_str(xml)?;
        Ok(catalog)
    }

    /// Adds every profile of a catalog document, replacing profiles with the
    /// same name. Returns the number of profiles read. Nothing is added when
    /// any profile is rejected.
    pub fn load_xml_str(&mut self, xml: &str) -> Result<usize, CatalogError> {
        let document: CatalogDocument = from_str(xml)?;
        let mut loaded = Vec::with_capacity(document.profiles.len());
        for element in document.profiles {
            let name = element.name.trim().to_owned();
            if name.is_empty() {
                return Err(CatalogError::MissingName);
            }
            if !element.closed {
                return Err(CatalogError::OpenProfile { name });
            }
            let points = element.points.iter().map(|p| Point3::new(p.x, p.y, p.z)).collect();
            let Some(curve) = Curve::polyline(points, true) else {
                return Err(CatalogError::DegenerateProfile { name });
            };
            loaded.push((name, curve));
        }
        let count = loaded.len();
        for (name, curve) in loaded {
            self.insert(name, curve);
        }
        log::debug!("loaded {count} profiles, catalog now holds {}", self.entries.len());
        Ok(count)
    }

    pub fn insert(&mut self, name: impl Into<String>, curve: Curve) {
        let name = name.into();
        self.entries.insert(name.to_lowercase(), (name, curve));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ProfileLibrary for ProfileCatalog {
    fn profile(&self, name: &str) -> Option<Curve> {
        self.entries.get(&name.trim().to_lowercase()).map(|(_, c)| c.clone())
    }

    fn names(&self) -> Vec<String> {
        self.entries.values().map(|(n, _)| n.clone()).collect()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Built-in profiles
// ────────────────────────────────────────────────────────────────────────────

fn builtin_profiles() -> Vec<(&'static str, Curve)> {
    let arc = |rx: f64, ry_top: f64, ry_bottom: f64| {
        (0..BUILTIN_SEGMENTS)
            .map(|i| {
                let a = TAU * i as f64 / BUILTIN_SEGMENTS as f64;
                let ry = if a <= PI { ry_top } else { ry_bottom };
                Point3::new(rx * a.cos(), ry * a.sin(), 0.0)
            })
            .collect::<Vec<_>>()
    };

    let mut d_shape = vec![Point3::new(-0.5, -0.5, 0.0)];
    let half = BUILTIN_SEGMENTS / 2;
    d_shape.extend((0..=half).map(|i| {
        let a = PI * i as f64 / half as f64;
        Point3::new(0.5 * a.cos(), -0.5 + a.sin(), 0.0)
    }));
    // The arc ends on the first point.
    d_shape.pop();

    let knife_edge = vec![
        Point3::new(-0.5, -0.5, 0.0),
        Point3::new(0.5, -0.5, 0.0),
        Point3::new(0.5, 0.0, 0.0),
        Point3::new(0.0, 0.5, 0.0),
        Point3::new(-0.5, 0.0, 0.0),
    ];

    let mut out = Vec::new();
    if let Some(round) = Curve::circle(&Plane::WORLD_XY, 0.5, BUILTIN_SEGMENTS) {
        out.push(("round", round));
    }
    if let Some(square) = Curve::rectangle(&Plane::WORLD_XY, 1.0, 1.0) {
        out.push(("square", square));
    }
    let polygons = [
        ("d-shape", d_shape),
        ("comfort", arc(0.5, 0.5, 0.25)),
        ("knife-edge", knife_edge),
        ("oval", arc(0.5, 0.35, 0.35)),
    ];
    for (name, points) in polygons {
        if let Some(curve) = Curve::polyline(points, true) {
            out.push((name, curve));
        }
    }
    out
}
